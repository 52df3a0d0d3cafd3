use super::PipelineStage;
use crate::{
    BusAdapter, BusCompletion, BusResponse, BusTarget, RunningState, StageId, TraceEvent,
    TraceSink, TransferProgress, TransferSession,
};

/// Writer states. The wait states mirror the bound adapter's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WriterState {
    /// Waiting for `start`.
    #[default]
    Idle,
    /// Write request asserted, nothing accepted yet.
    RequestTransfer,
    /// Split channel only: one of address/data accepted, the other still held.
    WaitDataAccepted,
    /// Address and data accepted, waiting for the write response.
    WaitResponse,
    /// Unified channel only: post-acknowledge idle period.
    WaitQuiescence,
}

/// Writes `seed, seed + 1, ...` to ascending addresses of one session.
///
/// A writer cannot fail; decode errors reported by the target are logged and
/// the session carries on.
#[derive(Debug)]
pub struct TrafficWriter {
    stage: StageId,
    session: TransferSession,
    adapter: Box<dyn BusAdapter>,
    state: WriterState,
    running: RunningState,
    finishing: bool,
    verbose: bool,
    writes: u64,
}

impl TrafficWriter {
    /// Creates an idle writer for `session` driving `adapter`.
    #[must_use]
    pub fn new(stage: StageId, session: TransferSession, adapter: Box<dyn BusAdapter>) -> Self {
        Self {
            stage,
            session,
            adapter,
            state: WriterState::Idle,
            running: RunningState::from_session(&session),
            finishing: false,
            verbose: false,
            writes: 0,
        }
    }

    /// Enables per-write trace events.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> WriterState {
        self.state
    }

    /// Session this writer replays.
    #[must_use]
    pub const fn session(&self) -> &TransferSession {
        &self.session
    }

    /// Cursor of the write in flight.
    #[must_use]
    pub const fn running(&self) -> RunningState {
        self.running
    }

    /// Writes completed since construction.
    #[must_use]
    pub const fn writes(&self) -> u64 {
        self.writes
    }

    fn finish(&mut self, sink: &mut dyn TraceSink) -> bool {
        self.state = WriterState::Idle;
        self.running = RunningState::from_session(&self.session);
        self.finishing = false;
        sink.on_event(TraceEvent::StageFinished {
            stage: self.stage,
            transfers: self.session.transfer_count(),
        });
        true
    }
}

impl PipelineStage for TrafficWriter {
    fn id(&self) -> StageId {
        self.stage
    }

    fn is_idle(&self) -> bool {
        self.state == WriterState::Idle
    }

    fn step(&mut self, start: bool, target: &mut dyn BusTarget, sink: &mut dyn TraceSink) -> bool {
        if self.state == WriterState::Idle {
            if start {
                self.running = RunningState::from_session(&self.session);
                self.finishing = false;
                self.state = WriterState::RequestTransfer;
                sink.on_event(TraceEvent::StageStarted { stage: self.stage });
            }
            return false;
        }

        if self.state == WriterState::RequestTransfer && self.adapter.is_ready() {
            let RunningState {
                current_address,
                current_value,
                ..
            } = self.running;
            if let Err(error) = self.adapter.begin_write(current_address, current_value) {
                log::error!("{}: {error}", self.stage);
            }
        }

        if let Some(BusCompletion::Write { response }) = self.adapter.clock(target) {
            let address = self.running.current_address;
            let value = self.running.current_value;
            self.writes = self.writes.saturating_add(1);
            if response != BusResponse::Okay {
                log::warn!("{}: write to {address:#x} answered {response:?}", self.stage);
            }
            if self.verbose {
                sink.on_event(TraceEvent::WriteCompleted {
                    stage: self.stage,
                    address,
                    value,
                    response,
                });
            }
            self.finishing = self.running.advance(&self.session);
        }

        self.state = match self.adapter.progress() {
            TransferProgress::Idle if self.finishing => return self.finish(sink),
            TransferProgress::Idle | TransferProgress::Requesting => WriterState::RequestTransfer,
            TransferProgress::PartiallyAccepted => WriterState::WaitDataAccepted,
            TransferProgress::AwaitingResponse => WriterState::WaitResponse,
            TransferProgress::Quiescent => WriterState::WaitQuiescence,
        };
        false
    }

    fn reset(&mut self) {
        self.adapter.reset();
        self.state = WriterState::Idle;
        self.running = RunningState::from_session(&self.session);
        self.finishing = false;
    }
}
