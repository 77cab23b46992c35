//! Submission lifecycle: `idle → loading → (success | error)`.

use serde::{Deserialize, Serialize};

/// Status of the most recent submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    /// Nothing submitted since the last load or reset.
    #[default]
    Idle,
    /// Sends are in flight.
    Loading,
    /// Every round was accepted.
    Success,
    /// At least one round failed.
    Error,
}

impl DispatchStatus {
    /// Check if this state allows transitioning to another state.
    pub fn can_transition_to(&self, target: DispatchStatus) -> bool {
        use DispatchStatus::*;

        matches!(
            (self, target),
            (Idle, Loading) | (Success, Loading) | (Error, Loading) |
            (Loading, Success) | (Loading, Error) |
            // load or reset
            (Idle, Idle) | (Success, Idle) | (Error, Idle)
        )
    }

}

impl std::fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}
