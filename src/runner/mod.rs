//! Run orchestration
//!
//! A [`Simulation`] spawns one task per simulated user on the multi-threaded
//! runtime, waits for all of them and drops the run's shared state.

use crate::barrier::PhaseBarrier;
use crate::client::ApiClient;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fake::FakeData;
use crate::registry::PostRegistry;
use crate::session::{SessionContext, SessionOutcome, UserSession};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// How a run went, per session
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub outcomes: Vec<Result<SessionOutcome>>,
    pub posts_recorded: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn sessions(&self) -> usize {
        self.outcomes.len()
    }

    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.sessions() - self.completed()
    }

    pub fn likes_issued(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.as_ref().ok())
            .map(|o| o.likes_issued)
            .sum()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }
}

/// One scripted run against an API collaborator
pub struct Simulation<C: ApiClient> {
    config: Config,
    client: Arc<C>,
}

impl<C: ApiClient> Simulation<C> {
    pub fn new(config: Config, client: Arc<C>) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute the run. Session failures are reported in the summary; only
    /// an invalid configuration fails the run itself.
    pub async fn run(&self) -> Result<RunSummary> {
        self.config.validate()?;

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", id = %run_id);
        self.execute(run_id).instrument(span).await
    }

    async fn execute(&self, run_id: Uuid) -> Result<RunSummary> {
        let run = self.config.run.clone();
        let started = Instant::now();
        info!(
            users = run.number_of_users,
            posts_per_user = run.max_posts_per_user,
            likes_per_user = run.max_likes_per_user,
            expected_posts = run.expected_posts(),
            "Starting run"
        );

        let registry = Arc::new(PostRegistry::new());
        let barrier = Arc::new(PhaseBarrier::new(
            run.number_of_users,
            Arc::clone(&registry),
            self.config.barrier.timeout,
        ));
        let ctx = SessionContext {
            registry: Arc::clone(&registry),
            barrier: Arc::clone(&barrier),
            run: run.clone(),
        };

        let handles: Vec<_> = (0..run.number_of_users)
            .map(|index| {
                let session = UserSession::new(
                    index,
                    Arc::clone(&self.client),
                    FakeData::for_session(run.seed, index),
                );
                tokio::spawn(session.run(ctx.clone()).in_current_span())
            })
            .collect();
        drop(ctx);

        let outcomes: Vec<Result<SessionOutcome>> = join_all(handles)
            .await
            .into_iter()
            .enumerate()
            .map(|(index, joined)| {
                let outcome = joined
                    .map_err(|e| Error::Internal(format!("session task failed: {}", e)))
                    .and_then(|outcome| outcome);
                match &outcome {
                    Err(e) if e.is_rejection() => error!(
                        session = index,
                        status = ?e.status(),
                        error = %e,
                        "Session rejected by API"
                    ),
                    Err(e) => error!(session = index, error = %e, "Session aborted"),
                    Ok(_) => {}
                }
                outcome
            })
            .collect();

        let posts_recorded = registry.len();
        if posts_recorded < run.expected_posts() {
            warn!(
                recorded = posts_recorded,
                expected = run.expected_posts(),
                "Post pool is smaller than planned"
            );
        }
        drop(barrier);
        drop(registry);
        debug!("Run state released");

        let summary = RunSummary {
            run_id,
            outcomes,
            posts_recorded,
            elapsed: started.elapsed(),
        };
        info!(
            completed = summary.completed(),
            failed = summary.failed(),
            posts = summary.posts_recorded,
            likes = summary.likes_issued(),
            elapsed = ?summary.elapsed,
            "Run finished"
        );
        Ok(summary)
    }
}
