//! Bus-facing traffic stages chained by the [`crate::Orchestrator`].

/// Read-back and compare stage.
pub mod checker;
/// Pattern-writing stage.
pub mod writer;

use std::fmt;

pub use checker::{CheckerState, TrafficChecker};
pub use writer::{TrafficWriter, WriterState};

use crate::{BusTarget, StageId, TraceSink};

/// One stage of the fixed pipeline.
///
/// `step` evaluates the stage's transition function for one clock. `start` is
/// the registered start signal; the return value is the stage's `end` pulse.
pub trait PipelineStage: fmt::Debug {
    /// Pipeline position of this stage.
    fn id(&self) -> StageId;

    /// Returns `true` while the stage waits for `start`.
    fn is_idle(&self) -> bool;

    /// Advances one step and returns `true` on the step the session ends.
    fn step(&mut self, start: bool, target: &mut dyn BusTarget, sink: &mut dyn TraceSink) -> bool;

    /// External reset: back to idle with a fresh cursor and no outstanding transfer.
    fn reset(&mut self);
}
