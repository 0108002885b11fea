use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical lifecycle state of a job or of an individual media track.
///
/// Zencoder's own vocabularies (one for jobs, one for media files) are mapped
/// onto this enum by `services::state_map`. Zencoder never reports a
/// pre-submission state, so `Created` only appears in snapshots built by
/// callers themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Created,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl State {
    pub fn is_created(self) -> bool {
        self == State::Created
    }

    pub fn is_running(self) -> bool {
        self == State::Running
    }

    pub fn is_completed(self) -> bool {
        self == State::Completed
    }

    pub fn is_cancelled(self) -> bool {
        self == State::Cancelled
    }

    pub fn is_failed(self) -> bool {
        self == State::Failed
    }

    /// True once the provider will no longer change the job.
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Completed | State::Cancelled | State::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            State::Created => "created",
            State::Running => "running",
            State::Completed => "completed",
            State::Cancelled => "cancelled",
            State::Failed => "failed",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
