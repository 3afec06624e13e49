//! Status-driven processing of images.
//!
//! - **state**: `ImageRecord`, `ImageStatus`, `Transition`
//! - **evaluator**: `Orchestrator::evaluate` and friends, one idempotent
//!   step at a time with confirm-after-write commits
//! - **events**: bounded-channel event loop and batch driving

mod evaluator;
mod events;
mod state;

pub use evaluator::{DriveOutcome, Orchestrator, OrchestratorSettings};
pub use events::event_channel;
pub use state::{now_ms, EnhancementSummary, ImageRecord, ImageStatus, Transition};
