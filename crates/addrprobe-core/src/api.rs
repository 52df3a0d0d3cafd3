//! Host-facing configuration, trace hooks and run reports.

use crate::memory::{
    validate_address_width, RegionDescriptor, HIGH_REGION_ORIGIN, LOW_REGION_ORIGIN,
};
use crate::{
    AddressingMode, BusDiscipline, BusResponse, ConfigError, DataFault, DiagnosticRecord,
    HandshakeTiming, RunCounters, StageId, Termination, TransferSession, ADDRESS_WIDTH_BITS,
    DEFAULT_QUIESCENT_CYCLES, DEFAULT_REGION_SIZE, DEFAULT_WATCHDOG_WINDOW, WORD_ACCESS_BYTES,
};

/// Seed of the high-region session.
pub const HIGH_REGION_SEED: u32 = 0x1234_5678;
/// Seed of the low-region session.
pub const LOW_REGION_SEED: u32 = 0xCAFE_BEBE;

/// Base address and seed of one region's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SessionParams {
    /// First byte address.
    pub base_address: u64,
    /// Value written to the first word.
    pub seed: u32,
}

/// Construction-time run parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Addressing convention shared by all four stages.
    pub addressing: Option<AddressingMode>,
    /// Bus discipline of every master port.
    pub discipline: BusDiscipline,
    /// High-region session.
    pub high: SessionParams,
    /// Low-region session.
    pub low: SessionParams,
    /// Bytes covered by each session.
    pub max_length: u64,
    /// Address-bus width in bits.
    pub address_width: u32,
    /// Emit per-transfer trace events.
    pub verbose: bool,
    /// Idle steps after each unified-channel write.
    pub quiescent_cycles: u32,
    /// Steps between the first latched mismatch and termination.
    pub watchdog_window: u64,
    /// Interconnect wait states.
    pub timing: HandshakeTiming,
    /// Address bits the interconnect decodes.
    pub interconnect_address_bits: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            addressing: Some(AddressingMode::Byte),
            discipline: BusDiscipline::SplitChannel,
            high: SessionParams {
                base_address: HIGH_REGION_ORIGIN,
                seed: HIGH_REGION_SEED,
            },
            low: SessionParams {
                base_address: LOW_REGION_ORIGIN,
                seed: LOW_REGION_SEED,
            },
            max_length: DEFAULT_REGION_SIZE,
            address_width: ADDRESS_WIDTH_BITS,
            verbose: false,
            quiescent_cycles: DEFAULT_QUIESCENT_CYCLES,
            watchdog_window: DEFAULT_WATCHDOG_WINDOW,
            timing: HandshakeTiming::REGISTERED,
            interconnect_address_bits: ADDRESS_WIDTH_BITS,
        }
    }
}

/// Validated sessions for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionPlan {
    /// Shared addressing convention.
    pub mode: AddressingMode,
    /// High-region session.
    pub high: TransferSession,
    /// Low-region session.
    pub low: TransferSession,
}

impl SessionPlan {
    /// Session walked by `stage`.
    #[must_use]
    pub const fn session(&self, stage: StageId) -> &TransferSession {
        match stage {
            StageId::WriterHigh | StageId::CheckerHigh => &self.high,
            StageId::WriterLow | StageId::CheckerLow => &self.low,
        }
    }

    /// Word-aligned RAM regions backing the two sessions.
    #[must_use]
    pub const fn regions(&self) -> [RegionDescriptor; 2] {
        [
            RegionDescriptor::new("high", word_origin(&self.high), self.high.byte_length()),
            RegionDescriptor::new("low", word_origin(&self.low), self.low.byte_length()),
        ]
    }
}

const fn word_origin(session: &TransferSession) -> u64 {
    session.base_byte_address() & !(WORD_ACCESS_BYTES - 1)
}

impl EngineConfig {
    /// Default configuration for `discipline` with its conventional addressing.
    #[must_use]
    pub fn for_discipline(discipline: BusDiscipline) -> Self {
        Self {
            addressing: Some(discipline.default_addressing()),
            discipline,
            ..Self::default()
        }
    }

    /// Checks the configuration and derives both sessions.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found: unset addressing, zero
    /// watchdog window, invalid widths, unaligned or empty length, base
    /// addresses outside the address width, or overlapping sessions.
    pub fn validate(&self) -> Result<SessionPlan, ConfigError> {
        let mode = self.addressing.ok_or(ConfigError::AddressingModeUnset)?;
        if self.watchdog_window == 0 {
            return Err(ConfigError::ZeroWatchdogWindow);
        }
        validate_address_width(self.interconnect_address_bits)?;

        let derive = |params: SessionParams| {
            TransferSession::derive(
                mode,
                params.base_address,
                self.max_length,
                params.seed,
                self.address_width,
            )
        };
        let plan = SessionPlan {
            mode,
            high: derive(self.high)?,
            low: derive(self.low)?,
        };

        let [high, low] = plan.regions();
        if high.overlaps(low) {
            return Err(ConfigError::OverlappingSessions {
                first: self.high.base_address,
                second: self.low.base_address,
            });
        }
        Ok(plan)
    }
}

/// Deterministic trace events, emitted in step order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// A stage left `Idle` on its start pulse.
    StageStarted {
        /// Stage.
        stage: StageId,
    },
    /// A stage asserted its end pulse.
    StageFinished {
        /// Stage.
        stage: StageId,
        /// Transfers in the session.
        transfers: u64,
    },
    /// A write completed (verbose only).
    WriteCompleted {
        /// Writer stage.
        stage: StageId,
        /// Bus address.
        address: u64,
        /// Data written.
        value: u32,
        /// Target status.
        response: BusResponse,
    },
    /// A read returned data (verbose only).
    ReadSample {
        /// Checker stage.
        stage: StageId,
        /// Bus address.
        address: u64,
        /// Expected value.
        expected: u32,
        /// Returned value.
        observed: u32,
    },
    /// A read returned the wrong value.
    Mismatch {
        /// Checker stage.
        stage: StageId,
        /// Mismatch details.
        fault: DataFault,
    },
    /// The watchdog armed on a latched fault.
    DataError(DiagnosticRecord),
    /// The global termination signal was asserted.
    Terminated {
        /// Step on which it was asserted.
        cycle: u64,
        /// Reason.
        termination: Termination,
    },
}

/// Sink trait for deterministic trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

/// Sink discarding every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn on_event(&mut self, _event: TraceEvent) {}
}

/// Sink keeping every event in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Vec<TraceEvent>,
}

impl RecordingSink {
    /// Recorded events in emission order.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Consumes the sink and returns its events.
    #[must_use]
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }
}

impl TraceSink for RecordingSink {
    fn on_event(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}

/// Sink forwarding events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn on_event(&mut self, event: TraceEvent) {
        match event {
            TraceEvent::StageStarted { stage } => log::info!("{stage} started"),
            TraceEvent::StageFinished { stage, transfers } => {
                log::info!("{stage} finished after {transfers} transfers");
            }
            TraceEvent::WriteCompleted {
                stage,
                address,
                value,
                response,
            } => log::debug!("{stage} wrote {value:08x} to {address:x} ({response:?})"),
            TraceEvent::ReadSample {
                address,
                expected,
                observed,
                ..
            } => log::debug!("addr {address:08x} dat_r {expected:08x} -> {observed:08x}"),
            TraceEvent::Mismatch { stage, fault } => log::warn!(
                "{stage} mismatch at {:x}: expected {:08x}, observed {:08x}",
                fault.address,
                fault.expected,
                fault.observed
            ),
            TraceEvent::DataError(record) => log::error!("{record}"),
            TraceEvent::Terminated { cycle, termination } => {
                log::info!("terminated on step {cycle}: {termination:?}");
            }
        }
    }
}

/// First fault latched by one checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct LatchedFault {
    /// Checker stage.
    pub stage: StageId,
    /// Its latched fault.
    pub fault: DataFault,
}

/// Outcome of a terminated run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunReport {
    /// Why the run stopped.
    pub termination: Termination,
    /// Step on which termination was asserted.
    pub cycles: u64,
    /// Latched fault of every checker that latched one, in pipeline order.
    pub faults: Vec<LatchedFault>,
    /// Activity counters.
    pub counters: RunCounters,
}

impl RunReport {
    /// Returns `true` when the pipeline completed without a latched fault.
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.termination.is_failure() && self.faults.is_empty()
    }
}
