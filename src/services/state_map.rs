//! Mapping from Zencoder state strings to the canonical vocabulary.
//!
//! Zencoder uses one set of states for jobs ("pending", "processing",
//! "finished", ...) and a slightly different set for media files ("queued",
//! "no input", ...). Both funnel through the same table. The table must be
//! kept in sync with the provider vocabulary: an unknown string is an error,
//! never a default.

use crate::models::state::State;

/// The provider reported a state string outside the known vocabulary.
#[derive(Debug, thiserror::Error)]
#[error("unrecognized Zencoder state {0:?}")]
pub struct UnmappedStateError(pub String);

/// Map a Zencoder job or media-file state string to a canonical [`State`].
pub fn map_state(provider_state: &str) -> Result<State, UnmappedStateError> {
    match provider_state {
        "assigning" | "pending" | "waiting" | "queued" | "processing" | "running" => {
            Ok(State::Running)
        }
        "finished" => Ok(State::Completed),
        "cancelled" => Ok(State::Cancelled),
        "failed" | "problem" | "no input" => Ok(State::Failed),
        other => Err(UnmappedStateError(other.to_string())),
    }
}
