//! Dispatch orchestration and submission lifecycle.

pub mod orchestrator;
pub mod state;

pub use orchestrator::{DispatchReport, RoundOutcome, dispatch, prepare, preview};
pub use state::DispatchStatus;
