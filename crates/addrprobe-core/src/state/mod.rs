//! Per-stage mutable state owned by writers and checkers.

/// Sticky first-mismatch latch.
pub mod latch;
/// Address/value cursor walked through a transfer session.
pub mod run_state;

pub use latch::{DataFault, ErrorLatch};
pub use run_state::RunningState;
