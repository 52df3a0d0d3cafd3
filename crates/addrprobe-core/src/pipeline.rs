//! Fixed four-stage pipeline: writer-high, writer-low, checker-high, checker-low.
//!
//! Stage ends are registered: every stage evaluates against the end signals of
//! the previous step, so a stage starts exactly one step after its predecessor
//! ends and at most one stage is active at a time.

use std::fmt;

use crate::traffic::{PipelineStage, TrafficChecker, TrafficWriter};
use crate::{BusTarget, DataFault, PortId, TraceSink};

/// Pipeline position of a traffic stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum StageId {
    /// Writes the high region.
    WriterHigh,
    /// Writes the low region.
    WriterLow,
    /// Reads back the high region.
    CheckerHigh,
    /// Reads back the low region.
    CheckerLow,
}

impl StageId {
    /// Stages in pipeline order.
    pub const ORDER: [Self; 4] = [
        Self::WriterHigh,
        Self::WriterLow,
        Self::CheckerHigh,
        Self::CheckerLow,
    ];

    /// Checker stages in pipeline order.
    pub const CHECKERS: [Self; 2] = [Self::CheckerHigh, Self::CheckerLow];

    /// Position in [`StageId::ORDER`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::WriterHigh => 0,
            Self::WriterLow => 1,
            Self::CheckerHigh => 2,
            Self::CheckerLow => 3,
        }
    }

    /// Interconnect master port. High and low pairs sit on adjacent ports.
    #[must_use]
    pub const fn port(self) -> PortId {
        match self {
            Self::WriterHigh => PortId(0),
            Self::CheckerHigh => PortId(1),
            Self::WriterLow => PortId(2),
            Self::CheckerLow => PortId(3),
        }
    }

    /// Bracketed banner prefixed to diagnostics.
    #[must_use]
    pub const fn banner(self) -> &'static str {
        match self {
            Self::WriterHigh => "[Writer High]",
            Self::WriterLow => "[Writer Low]",
            Self::CheckerHigh => "[Checker High]",
            Self::CheckerLow => "[Checker Low]",
        }
    }

    /// Kebab-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::WriterHigh => "writer-high",
            Self::WriterLow => "writer-low",
            Self::CheckerHigh => "checker-high",
            Self::CheckerLow => "checker-low",
        }
    }

    /// Returns `true` for read-back stages.
    #[must_use]
    pub const fn is_checker(self) -> bool {
        matches!(self, Self::CheckerHigh | Self::CheckerLow)
    }

    /// Stage started by this stage's end, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::WriterHigh => Some(Self::WriterLow),
            Self::WriterLow => Some(Self::CheckerHigh),
            Self::CheckerHigh => Some(Self::CheckerLow),
            Self::CheckerLow => None,
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Orchestrator control state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrchestratorState {
    /// Pulses writer-high's start on the next step.
    #[default]
    Reset,
    /// Run mode: chains ends into starts until checker-low ends.
    WaitCompletion,
}

/// Owns and wires the four pipeline stages.
///
/// One pipeline pass per orchestrator; it never returns to
/// [`OrchestratorState::Reset`] by itself.
#[derive(Debug)]
pub struct Orchestrator {
    state: OrchestratorState,
    writers: [TrafficWriter; 2],
    checkers: [TrafficChecker; 2],
    ends: [bool; 4],
    start_pulses: [u32; 4],
    done: bool,
}

impl Orchestrator {
    /// Wires `[high, low]` writers and `[high, low]` checkers into a pipeline.
    #[must_use]
    pub fn new(writers: [TrafficWriter; 2], checkers: [TrafficChecker; 2]) -> Self {
        debug_assert_eq!(writers[0].id(), StageId::WriterHigh);
        debug_assert_eq!(writers[1].id(), StageId::WriterLow);
        debug_assert_eq!(checkers[0].id(), StageId::CheckerHigh);
        debug_assert_eq!(checkers[1].id(), StageId::CheckerLow);
        Self {
            state: OrchestratorState::Reset,
            writers,
            checkers,
            ends: [false; 4],
            start_pulses: [0; 4],
            done: false,
        }
    }

    /// Evaluates one synchronous step of every stage.
    ///
    /// Returns `true` on the step checker-low ends (overall done).
    pub fn step(&mut self, target: &mut dyn BusTarget, sink: &mut dyn TraceSink) -> bool {
        let run_mode = self.state == OrchestratorState::WaitCompletion;
        let starts = [
            self.state == OrchestratorState::Reset,
            run_mode && self.ends[0],
            run_mode && self.ends[1],
            run_mode && self.ends[2],
        ];
        self.state = OrchestratorState::WaitCompletion;

        let mut ends = [false; 4];
        for stage in StageId::ORDER {
            let index = stage.index();
            if starts[index] {
                self.start_pulses[index] = self.start_pulses[index].saturating_add(1);
            }
            ends[index] = self.stage_mut(stage).step(starts[index], target, sink);
        }
        self.ends = ends;

        let done = ends[StageId::CheckerLow.index()];
        self.done |= done;
        done
    }

    /// Control state.
    #[must_use]
    pub const fn state(&self) -> OrchestratorState {
        self.state
    }

    /// Returns `true` once checker-low has ended.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Returns `true` when `stage` ended on the last step.
    #[must_use]
    pub const fn ended(&self, stage: StageId) -> bool {
        self.ends[stage.index()]
    }

    /// Start pulses delivered to `stage` so far.
    #[must_use]
    pub const fn start_pulses(&self, stage: StageId) -> u32 {
        self.start_pulses[stage.index()]
    }

    /// The stage currently running, if any.
    #[must_use]
    pub fn active_stage(&self) -> Option<StageId> {
        StageId::ORDER
            .into_iter()
            .find(|stage| !self.stage(*stage).is_idle())
    }

    /// Number of stages not idle. Zero or one in a correctly wired pipeline.
    #[must_use]
    pub fn active_count(&self) -> usize {
        StageId::ORDER
            .into_iter()
            .filter(|stage| !self.stage(*stage).is_idle())
            .count()
    }

    /// Latched fault of each checker, in pipeline order.
    #[must_use]
    pub fn checker_latches(&self) -> [(StageId, Option<DataFault>); 2] {
        StageId::CHECKERS.map(|stage| (stage, self.checker(stage).latch().fault()))
    }

    /// Writer at `stage`; checker positions map to the writer of the same region.
    #[must_use]
    pub const fn writer(&self, stage: StageId) -> &TrafficWriter {
        match stage {
            StageId::WriterHigh | StageId::CheckerHigh => &self.writers[0],
            StageId::WriterLow | StageId::CheckerLow => &self.writers[1],
        }
    }

    /// Checker at `stage`; writer positions map to the checker of the same region.
    #[must_use]
    pub const fn checker(&self, stage: StageId) -> &TrafficChecker {
        match stage {
            StageId::WriterHigh | StageId::CheckerHigh => &self.checkers[0],
            StageId::WriterLow | StageId::CheckerLow => &self.checkers[1],
        }
    }

    /// Stage at `id` as a trait object.
    #[must_use]
    pub fn stage(&self, id: StageId) -> &dyn PipelineStage {
        if id.is_checker() {
            self.checker(id)
        } else {
            self.writer(id)
        }
    }

    fn stage_mut(&mut self, id: StageId) -> &mut dyn PipelineStage {
        match id {
            StageId::WriterHigh => &mut self.writers[0],
            StageId::WriterLow => &mut self.writers[1],
            StageId::CheckerHigh => &mut self.checkers[0],
            StageId::CheckerLow => &mut self.checkers[1],
        }
    }

    /// External reset of the whole pipeline, including checker latches.
    pub fn reset(&mut self) {
        for stage in StageId::ORDER {
            self.stage_mut(stage).reset();
        }
        self.state = OrchestratorState::Reset;
        self.ends = [false; 4];
        self.start_pulses = [0; 4];
        self.done = false;
    }
}
