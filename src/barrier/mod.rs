//! Phase barrier between the post-creation and like phases
//!
//! Every session calls [`PhaseBarrier::arrive_and_wait`] once, after its last
//! post id is in the registry. Arrivals are numbered under a lock; the arrival
//! whose number equals the party count is the leader. The leader seals the
//! registry and publishes the snapshot, and only then are the other sessions
//! released. All of them receive the same snapshot in their [`PhaseTicket`].
//!
//! The barrier is one-shot: there is a single `Creating -> Liking` transition
//! per run. Without a timeout, a session that never arrives keeps its peers
//! waiting indefinitely.

use crate::client::PostId;
use crate::error::{Error, Result};
use crate::registry::PostRegistry;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Phase of a run as seen by the barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Creating,
    Liking,
}

#[derive(Debug)]
struct BarrierState {
    arrived: usize,
    phase: Phase,
}

/// Proof that the creating phase is over, handed to each session
#[derive(Debug, Clone)]
pub struct PhaseTicket {
    arrival: usize,
    leader: bool,
    snapshot: Arc<[PostId]>,
}

impl PhaseTicket {
    /// 1-based arrival order at the barrier
    pub fn arrival(&self) -> usize {
        self.arrival
    }

    /// True for the single session that sealed the registry
    pub fn is_leader(&self) -> bool {
        self.leader
    }

    /// Every post id recorded during the creating phase
    pub fn snapshot(&self) -> &[PostId] {
        &self.snapshot
    }

    /// Draw `count` ids uniformly, with replacement.
    ///
    /// An empty snapshot yields no ids whatever `count` is.
    pub fn sample<R>(&self, rng: &mut R, count: usize) -> Vec<PostId>
    where
        R: Rng + ?Sized,
    {
        if self.snapshot.is_empty() {
            return Vec::new();
        }
        (0..count)
            .filter_map(|_| self.snapshot.choose(rng).copied())
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn for_tests(snapshot: Vec<PostId>) -> Self {
        Self {
            arrival: 1,
            leader: true,
            snapshot: snapshot.into(),
        }
    }
}

/// One-shot rendezvous for all sessions of a run
#[derive(Debug)]
pub struct PhaseBarrier {
    parties: usize,
    registry: Arc<PostRegistry>,
    timeout: Option<Duration>,
    state: Mutex<BarrierState>,
    released: watch::Sender<Option<Arc<[PostId]>>>,
}

impl PhaseBarrier {
    /// Barrier for `parties` sessions (at least one) guarding `registry`
    pub fn new(parties: usize, registry: Arc<PostRegistry>, timeout: Option<Duration>) -> Self {
        let (released, _) = watch::channel(None);
        Self {
            parties: parties.max(1),
            registry,
            timeout,
            state: Mutex::new(BarrierState {
                arrived: 0,
                phase: Phase::Creating,
            }),
            released,
        }
    }

    pub fn parties(&self) -> usize {
        self.parties
    }

    pub fn arrived(&self) -> usize {
        self.state.lock().arrived
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    /// Wait until every session has arrived and the registry is sealed
    pub async fn arrive_and_wait(&self) -> Result<PhaseTicket> {
        let mut released = self.released.subscribe();

        let arrival = {
            let mut state = self.state.lock();
            if state.arrived >= self.parties {
                return Err(Error::InvalidState(format!(
                    "phase barrier for {} sessions already crossed",
                    self.parties
                )));
            }
            state.arrived += 1;
            if state.arrived == self.parties {
                state.phase = Phase::Liking;
            }
            state.arrived
        };

        if arrival == self.parties {
            let snapshot = self.registry.seal();
            info!(
                parties = self.parties,
                posts = snapshot.len(),
                "All sessions arrived, registry sealed"
            );
            self.released.send_replace(Some(Arc::clone(&snapshot)));
            return Ok(PhaseTicket {
                arrival,
                leader: true,
                snapshot,
            });
        }

        debug!(arrival, parties = self.parties, "Waiting at phase barrier");
        let started = Instant::now();

        let published = match self.timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, released.wait_for(Option::is_some)).await {
                    Ok(result) => result.map(|snapshot| snapshot.clone()),
                    Err(_) => {
                        let arrived = self.arrived();
                        warn!(
                            arrived,
                            parties = self.parties,
                            "Gave up waiting at phase barrier"
                        );
                        return Err(Error::BarrierTimeout {
                            arrived,
                            parties: self.parties,
                            waited: started.elapsed(),
                        });
                    }
                }
            }
            None => released
                .wait_for(Option::is_some)
                .await
                .map(|snapshot| snapshot.clone()),
        };

        let snapshot = published
            .map_err(|_| Error::Internal("phase barrier dropped while waiting".to_string()))?
            .ok_or_else(|| Error::Internal("phase barrier released without snapshot".to_string()))?;

        Ok(PhaseTicket {
            arrival,
            leader: false,
            snapshot,
        })
    }
}
