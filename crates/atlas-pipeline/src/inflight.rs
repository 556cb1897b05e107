//! Per-id exclusion for single-asset acquisitions.
//!
//! The first caller for an id becomes the leader and runs the job. Callers
//! arriving while it runs get a receiver and wait for the leader's outcome.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;

use atlas_types::{ModelId, ModelSummary};

use crate::error::{AcquireError, AcquireResult};

type Outcome = Option<AcquireResult<ModelSummary>>;

#[derive(Debug, Default)]
pub(crate) struct InFlight {
    jobs: Mutex<HashMap<ModelId, watch::Receiver<Outcome>>>,
}

pub(crate) enum Claim<'a> {
    Leader(LeaderGuard<'a>),
    Follower(watch::Receiver<Outcome>),
}

impl InFlight {
    pub(crate) fn claim(&self, id: &ModelId) -> Claim<'_> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(rx) = jobs.get(id) {
            return Claim::Follower(rx.clone());
        }
        let (tx, rx) = watch::channel(None);
        jobs.insert(id.clone(), rx);
        Claim::Leader(LeaderGuard {
            owner: self,
            id: id.clone(),
            tx,
            settled: false,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn release(&self, id: &ModelId) {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    /// Wait for the leader. A leader dropped before settling counts as an
    /// internal failure.
    pub(crate) async fn wait(mut rx: watch::Receiver<Outcome>) -> AcquireResult<ModelSummary> {
        match rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome
                .clone()
                .unwrap_or_else(|| Err(AcquireError::Internal("empty in-flight outcome".into()))),
            Err(_) => Err(AcquireError::Internal(
                "in-flight acquisition was abandoned".into(),
            )),
        }
    }
}

/// Held by the caller running the job. Dropping it without [`finish`]
/// frees the id and wakes followers with an error.
///
/// [`finish`]: LeaderGuard::finish
pub(crate) struct LeaderGuard<'a> {
    owner: &'a InFlight,
    id: ModelId,
    tx: watch::Sender<Outcome>,
    settled: bool,
}

impl LeaderGuard<'_> {
    pub(crate) fn finish(mut self, outcome: AcquireResult<ModelSummary>) {
        self.owner.release(&self.id);
        self.settled = true;
        self.tx.send_replace(Some(outcome));
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.owner.release(&self.id);
        }
    }
}
