use super::PipelineStage;
use crate::{
    BusAdapter, BusCompletion, BusResponse, BusTarget, DataFault, ErrorLatch, RunningState,
    StageId, TraceEvent, TraceSink, TransferProgress, TransferSession,
};

/// Checker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CheckerState {
    /// Waiting for `start`.
    #[default]
    Idle,
    /// Read address asserted, not yet accepted.
    RequestRead,
    /// Read accepted, waiting for data.
    WaitData,
    /// Data compared; cursor moves and the end predicate is evaluated.
    Advance,
}

/// Reads a session back and compares every word with the expected pattern.
///
/// Mismatches never stop the session. The first one is held in the
/// [`ErrorLatch`], which survives the checker returning to `Idle` and is only
/// released by [`PipelineStage::reset`].
#[derive(Debug)]
pub struct TrafficChecker {
    stage: StageId,
    session: TransferSession,
    adapter: Box<dyn BusAdapter>,
    state: CheckerState,
    running: RunningState,
    latch: ErrorLatch,
    verbose: bool,
    reads: u64,
    mismatches: u64,
}

impl TrafficChecker {
    /// Creates an idle checker for `session` driving `adapter`.
    #[must_use]
    pub fn new(stage: StageId, session: TransferSession, adapter: Box<dyn BusAdapter>) -> Self {
        Self {
            stage,
            session,
            adapter,
            state: CheckerState::Idle,
            running: RunningState::from_session(&session),
            latch: ErrorLatch::default(),
            verbose: false,
            reads: 0,
            mismatches: 0,
        }
    }

    /// Enables per-read trace samples.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> CheckerState {
        self.state
    }

    /// Session this checker replays.
    #[must_use]
    pub const fn session(&self) -> &TransferSession {
        &self.session
    }

    /// Cursor of the read in flight.
    #[must_use]
    pub const fn running(&self) -> RunningState {
        self.running
    }

    /// Sticky first-mismatch latch.
    #[must_use]
    pub const fn latch(&self) -> &ErrorLatch {
        &self.latch
    }

    /// Reads completed since construction.
    #[must_use]
    pub const fn reads(&self) -> u64 {
        self.reads
    }

    /// Mismatching reads since construction, including those not latched.
    #[must_use]
    pub const fn mismatches(&self) -> u64 {
        self.mismatches
    }

    fn compare(&mut self, observed: u32, response: BusResponse, sink: &mut dyn TraceSink) {
        let address = self.running.current_address;
        let expected = self.running.current_value;
        self.reads = self.reads.saturating_add(1);

        if self.verbose {
            sink.on_event(TraceEvent::ReadSample {
                stage: self.stage,
                address,
                expected,
                observed,
            });
        }
        if observed == expected {
            return;
        }

        let fault = DataFault {
            address,
            expected,
            observed,
        };
        self.mismatches = self.mismatches.saturating_add(1);
        sink.on_event(TraceEvent::Mismatch {
            stage: self.stage,
            fault,
        });
        if self.latch.record(fault) {
            log::warn!(
                "{}: first mismatch at {address:#x} ({response:?})",
                self.stage
            );
        }
    }
}

impl PipelineStage for TrafficChecker {
    fn id(&self) -> StageId {
        self.stage
    }

    fn is_idle(&self) -> bool {
        self.state == CheckerState::Idle
    }

    fn step(&mut self, start: bool, target: &mut dyn BusTarget, sink: &mut dyn TraceSink) -> bool {
        match self.state {
            CheckerState::Idle => {
                if start {
                    self.running = RunningState::from_session(&self.session);
                    self.state = CheckerState::RequestRead;
                    sink.on_event(TraceEvent::StageStarted { stage: self.stage });
                }
                return false;
            }
            CheckerState::Advance => {
                if self.running.advance(&self.session) {
                    self.state = CheckerState::Idle;
                    self.running = RunningState::from_session(&self.session);
                    sink.on_event(TraceEvent::StageFinished {
                        stage: self.stage,
                        transfers: self.session.transfer_count(),
                    });
                    return true;
                }
                self.state = CheckerState::RequestRead;
                return false;
            }
            CheckerState::RequestRead if self.adapter.is_ready() => {
                if let Err(error) = self.adapter.begin_read(self.running.current_address) {
                    log::error!("{}: {error}", self.stage);
                }
            }
            CheckerState::RequestRead | CheckerState::WaitData => {}
        }

        if let Some(BusCompletion::Read { data, response }) = self.adapter.clock(target) {
            self.compare(data, response, sink);
            self.state = CheckerState::Advance;
            return false;
        }

        self.state = match self.adapter.progress() {
            TransferProgress::Idle | TransferProgress::Requesting => CheckerState::RequestRead,
            TransferProgress::PartiallyAccepted
            | TransferProgress::AwaitingResponse
            | TransferProgress::Quiescent => CheckerState::WaitData,
        };
        false
    }

    fn reset(&mut self) {
        self.adapter.reset();
        self.state = CheckerState::Idle;
        self.running = RunningState::from_session(&self.session);
        self.latch.clear();
    }
}
