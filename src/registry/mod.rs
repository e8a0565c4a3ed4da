//! Shared post registry
//!
//! Sessions append the ids of the posts they create. The contents can only be
//! read through the snapshot produced when the phase barrier's leader seals
//! the registry, after every session has finished recording. There is no
//! accessor that exposes a partially filled registry.

use crate::client::PostId;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct RegistryState {
    ids: Vec<PostId>,
    sealed: Option<Arc<[PostId]>>,
}

/// Append-only pool of post ids shared by all sessions of one run
#[derive(Debug, Default)]
pub struct PostRegistry {
    state: Mutex<RegistryState>,
}

impl PostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `post_id`. Fails once the registry has been sealed.
    pub fn record(&self, post_id: PostId) -> Result<()> {
        let mut state = self.state.lock();
        if state.sealed.is_some() {
            return Err(Error::InvalidState(format!(
                "post {} recorded after the registry was sealed",
                post_id
            )));
        }
        state.ids.push(post_id);
        Ok(())
    }

    /// Number of ids recorded so far
    pub fn len(&self) -> usize {
        let state = self.state.lock();
        match &state.sealed {
            Some(snapshot) => snapshot.len(),
            None => state.ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_sealed(&self) -> bool {
        self.state.lock().sealed.is_some()
    }

    /// Freeze the registry and return its full contents in recording order.
    ///
    /// Only the barrier leader calls this. Sealing twice returns the same
    /// snapshot.
    pub(crate) fn seal(&self) -> Arc<[PostId]> {
        let mut state = self.state.lock();
        if let Some(snapshot) = &state.sealed {
            return Arc::clone(snapshot);
        }
        let snapshot: Arc<[PostId]> = std::mem::take(&mut state.ids).into();
        state.sealed = Some(Arc::clone(&snapshot));
        snapshot
    }
}
