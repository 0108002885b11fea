use serde::{Deserialize, Serialize};

use crate::models::state::State;

/// A merged response could not form a structurally valid snapshot
/// (e.g. the details payload carried no input media file).
#[derive(Debug, thiserror::Error)]
#[error("invalid job snapshot: {0}")]
pub struct InvalidSnapshotError(pub String);

/// The source media record of a job.
///
/// Every technical attribute is independently present-or-absent: `None` means
/// the provider has not (yet, or ever) reported the field, which is distinct
/// from a reported zero. Timestamps are carried verbatim in the provider's
/// ISO-8601 rendering, never reparsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub id: String,
    pub url: Option<String>,
    /// State of the input track specifically. During in-between polls this can
    /// legitimately differ from the job's aggregate state, since details and
    /// progress come from separate, non-atomic calls.
    pub state: State,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    /// Provider-reported diagnostics for this track, verbatim. Non-empty only
    /// on failure.
    pub errors: Vec<String>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub frame_rate: Option<f64>,
    /// Duration in milliseconds.
    pub duration: Option<u64>,
    /// File size in bytes.
    pub file_size: Option<u64>,
    pub checksum: Option<String>,
    pub audio_codec: Option<String>,
    pub video_codec: Option<String>,
    /// Audio bitrate in kbps.
    pub audio_bitrate: Option<u64>,
    /// Video bitrate in kbps.
    pub video_bitrate: Option<u64>,
}

/// One rendered output rendition. Same shape as [`Input`] plus an optional
/// provider-supplied label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub id: String,
    pub url: Option<String>,
    pub label: Option<String>,
    pub state: State,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub errors: Vec<String>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub frame_rate: Option<f64>,
    pub duration: Option<u64>,
    pub file_size: Option<u64>,
    pub checksum: Option<String>,
    pub audio_codec: Option<String>,
    pub video_codec: Option<String>,
    pub audio_bitrate: Option<u64>,
    pub video_bitrate: Option<u64>,
}

/// One immutable, fully-merged view of a transcoding job at a point in time.
///
/// Snapshots are never mutated in place; a reload produces a new `Encode` and
/// the handle swaps to it only when the whole merge succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encode {
    /// Provider-assigned identifier, stable for the job's lifetime.
    pub id: String,
    pub state: State,
    /// In-progress step names. Empty when nothing is running, never absent.
    pub current_operations: Vec<String>,
    /// 0-100. Zero for not-yet-started and failed jobs, 100 once completed.
    pub percent_complete: f64,
    /// Job-level provider diagnostics. Business failures land here (and in the
    /// input's `errors`), not in the error channel of the fetch itself.
    pub errors: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub input: Input,
    pub output: Vec<Output>,
}

impl Encode {
    pub fn is_created(&self) -> bool {
        self.state.is_created()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn is_completed(&self) -> bool {
        self.state.is_completed()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    pub fn is_failed(&self) -> bool {
        self.state.is_failed()
    }
}
