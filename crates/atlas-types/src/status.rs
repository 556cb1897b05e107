//! Load queue status types.
//!
//! A queue item starts in [`LoadStatus::Downloading`] and moves forward only:
//!
//! ```text
//! downloading -> loading -> completed
//!      |            \
//!      |             -> error
//!      +-> completed | error
//! ```
//!
//! `completed` and `error` are terminal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::model::ModelId;

/// Status of one acquisition job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Downloading,
    Loading,
    Completed,
    Error,
}

impl LoadStatus {
    /// Returns `true` for `completed` and `error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Whether `next` is reachable from `self` in one step.
    pub fn can_transition_to(&self, next: LoadStatus) -> bool {
        match self {
            Self::Downloading => matches!(next, Self::Loading | Self::Completed | Self::Error),
            Self::Loading => matches!(next, Self::Completed | Self::Error),
            Self::Completed | Self::Error => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Downloading => "downloading",
            Self::Loading => "loading",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the load queue history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadQueueItem {
    pub id: ModelId,
    pub url: String,
    pub status: LoadStatus,
}

impl LoadQueueItem {
    /// A freshly accepted job.
    pub fn downloading(url: impl Into<String>, id: ModelId) -> Self {
        Self {
            id,
            url: url.into(),
            status: LoadStatus::Downloading,
        }
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    pub fn advance(&mut self, next: LoadStatus) -> Result<(), TypeError> {
        if !self.status.can_transition_to(next) {
            return Err(TypeError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}
