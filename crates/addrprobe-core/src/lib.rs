//! Address-propagation checker for wide (64-bit) memory-mapped interconnects.
//!
//! Two writers fill a high region (only reachable with more than 32 address
//! bits) and a low region with an incrementing pattern, then two checkers read
//! both regions back. Any word that does not come back as written latches a
//! fault; the watchdog turns that into a bounded failing termination.

/// Simulated RAM, region map and session geometry checks.
pub mod memory;
pub use memory::{
    address_mask, decode_region, validate_address_width, validate_session_length,
    validate_session_span, RegionDescriptor, WordMemory, DEFAULT_REGION_SIZE, FULL_BYTE_ENABLE,
    HIGH_REGION_ORIGIN, LOW_REGION_ORIGIN, MAX_ADDRESS_WIDTH, WORD_ACCESS_BYTES,
};

/// Configuration errors, harness errors and termination reasons.
pub mod fault;
pub use fault::{ConfigError, RunError, Termination};

/// Addressing conventions and transfer-session arithmetic.
pub mod addressing;
pub use addressing::{AddressingMode, TransferSession, ADDRESS_WIDTH_BITS, DATA_WIDTH_BITS};

/// Per-stage cursor and sticky error latch.
pub mod state;
pub use state::{DataFault, ErrorLatch, RunningState};

/// Interconnect handshake timing and run constants.
pub mod timing;
pub use timing::{
    timing_profile, HandshakeTiming, DEFAULT_QUIESCENT_CYCLES, DEFAULT_STEP_LIMIT,
    DEFAULT_WATCHDOG_WINDOW, TIMING_PROFILES,
};

/// Bus adapters for both disciplines and the simulated interconnect.
pub mod bus;
pub use bus::{
    new_adapter, BusAdapter, BusCompletion, BusDiscipline, BusError, BusResponse, BusTarget,
    Interconnect, PortId, ReadBeat, SplitChannelAdapter, SplitChannelRequest,
    SplitChannelResponse, TransferProgress, UnifiedChannelAdapter, UnifiedChannelRequest,
    UnifiedChannelResponse, WriteBeat,
};

/// Traffic writer and checker state machines.
pub mod traffic;
pub use traffic::{CheckerState, PipelineStage, TrafficChecker, TrafficWriter, WriterState};

/// Stage identifiers and the four-stage orchestrator.
pub mod pipeline;
pub use pipeline::{Orchestrator, OrchestratorState, StageId};

/// Diagnostic record formatting and run counters.
pub mod diag;
pub use diag::{DiagnosticRecord, RunCounters};

/// Latch observer forcing bounded termination.
pub mod watchdog;
pub use watchdog::Watchdog;

/// Public host-facing configuration, trace hooks and reports.
pub mod api;
pub use api::{
    EngineConfig, LatchedFault, LogSink, NullSink, RecordingSink, RunReport, SessionParams,
    SessionPlan, TraceEvent, TraceSink, HIGH_REGION_SEED, LOW_REGION_SEED,
};

/// Complete simulation driver.
pub mod testbench;
pub use testbench::Testbench;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
