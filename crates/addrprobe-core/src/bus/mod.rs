//! Bus-master adapters and the target contract they drive.
//!
//! Writers and checkers talk to a `dyn BusAdapter`; they never see which
//! handshake discipline sits underneath. Each adapter is bound to one master
//! port and allows a single outstanding transaction.

/// Simulated interconnect routing both disciplines to [`crate::WordMemory`].
pub mod interconnect;
/// Split-channel (address/data/response decoupled) master.
pub mod split;
/// Unified-channel (single request/acknowledge) master.
pub mod unified;

use std::fmt;

use thiserror::Error;

pub use interconnect::Interconnect;
pub use split::{
    ReadBeat, SplitChannelAdapter, SplitChannelRequest, SplitChannelResponse, WriteBeat,
};
pub use unified::{UnifiedChannelAdapter, UnifiedChannelRequest, UnifiedChannelResponse};

use crate::AddressingMode;

/// Identifier of one bus-master port on the interconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortId(pub u8);

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port{}", self.0)
    }
}

/// Handshake discipline spoken by every master and the interconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum BusDiscipline {
    /// Independent write-address, write-data, write-response, read-address and read-data channels.
    #[default]
    SplitChannel,
    /// One combined request held until a single acknowledge.
    UnifiedChannel,
}

impl BusDiscipline {
    /// Short name used on the command line and in reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SplitChannel => "split",
            Self::UnifiedChannel => "unified",
        }
    }

    /// Parses a name produced by [`BusDiscipline::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "split" => Some(Self::SplitChannel),
            "unified" => Some(Self::UnifiedChannel),
            _ => None,
        }
    }

    /// Addressing convention conventionally paired with this discipline.
    #[must_use]
    pub const fn default_addressing(self) -> AddressingMode {
        match self {
            Self::SplitChannel => AddressingMode::Byte,
            Self::UnifiedChannel => AddressingMode::Word,
        }
    }
}

/// Status returned by the target for a completed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BusResponse {
    /// The access reached a mapped region.
    #[default]
    Okay,
    /// No region decodes the address; writes are dropped and reads return zero.
    DecodeError,
}

/// Transfer finished on the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusCompletion {
    /// A write was acknowledged.
    Write {
        /// Target status.
        response: BusResponse,
    },
    /// A read returned data, sampled on this step.
    Read {
        /// Returned word.
        data: u32,
        /// Target status.
        response: BusResponse,
    },
}

/// Coarse adapter phase, used by stages to name their own wait states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferProgress {
    /// No transaction outstanding; a new one may begin.
    Idle,
    /// Request asserted, nothing accepted yet.
    Requesting,
    /// One of the write address/data channels accepted, the other still held.
    PartiallyAccepted,
    /// Request fully accepted, waiting for response or read data.
    AwaitingResponse,
    /// Post-transfer idle cycles before the adapter accepts new work.
    Quiescent,
}

/// Misuse of a bus adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum BusError {
    /// A transaction was started while another is still in flight.
    #[error("{port} already has an outstanding transaction")]
    Outstanding {
        /// Port of the busy adapter.
        port: PortId,
    },
}

/// Slave side of the interconnect, clocked once per step by each active master.
pub trait BusTarget {
    /// Evaluates one split-channel step for `port`.
    fn split_cycle(&mut self, port: PortId, request: &SplitChannelRequest) -> SplitChannelResponse;

    /// Evaluates one unified-channel step for `port`; `None` means no request is asserted.
    fn unified_cycle(
        &mut self,
        port: PortId,
        request: Option<&UnifiedChannelRequest>,
    ) -> UnifiedChannelResponse;
}

/// Master-side capability shared by both disciplines.
pub trait BusAdapter: fmt::Debug {
    /// Port this adapter drives.
    fn port(&self) -> PortId;

    /// Handshake discipline of this adapter.
    fn discipline(&self) -> BusDiscipline;

    /// Addressing convention of the addresses this adapter drives.
    fn addressing(&self) -> AddressingMode;

    /// Current phase.
    fn progress(&self) -> TransferProgress;

    /// Returns `true` when a new transaction may begin.
    fn is_ready(&self) -> bool {
        self.progress() == TransferProgress::Idle
    }

    /// Starts a full-word write.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Outstanding`] when a transaction is in flight.
    fn begin_write(&mut self, address: u64, data: u32) -> Result<(), BusError>;

    /// Starts a full-word read.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Outstanding`] when a transaction is in flight.
    fn begin_read(&mut self, address: u64) -> Result<(), BusError>;

    /// Drives one step against `target` and reports a transfer that finished on it.
    fn clock(&mut self, target: &mut dyn BusTarget) -> Option<BusCompletion>;

    /// Drops any in-flight transaction and returns to idle.
    fn reset(&mut self);
}

/// Builds the adapter for `discipline` bound to `port`.
///
/// `quiescent_cycles` only applies to unified-channel writes.
#[must_use]
pub fn new_adapter(
    discipline: BusDiscipline,
    port: PortId,
    addressing: AddressingMode,
    quiescent_cycles: u32,
) -> Box<dyn BusAdapter> {
    match discipline {
        BusDiscipline::SplitChannel => Box::new(SplitChannelAdapter::new(port, addressing)),
        BusDiscipline::UnifiedChannel => Box::new(UnifiedChannelAdapter::new(
            port,
            addressing,
            quiescent_cycles,
        )),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{new_adapter, BusDiscipline, BusError, PortId};
    use crate::AddressingMode;

    #[test]
    fn discipline_names_round_trip() {
        for discipline in [BusDiscipline::SplitChannel, BusDiscipline::UnifiedChannel] {
            assert_eq!(BusDiscipline::from_name(discipline.name()), Some(discipline));
        }
        assert_eq!(BusDiscipline::from_name("axi"), None);
    }

    #[rstest]
    #[case(BusDiscipline::SplitChannel)]
    #[case(BusDiscipline::UnifiedChannel)]
    fn adapters_allow_one_outstanding_transaction(#[case] discipline: BusDiscipline) {
        let mut adapter = new_adapter(discipline, PortId(2), AddressingMode::Byte, 0);
        assert_eq!(adapter.discipline(), discipline);
        assert!(adapter.is_ready());

        adapter.begin_write(0x2_0000, 1).expect("idle adapter accepts work");
        assert!(!adapter.is_ready());
        assert_eq!(
            adapter.begin_read(0x2_0000),
            Err(BusError::Outstanding { port: PortId(2) })
        );

        adapter.reset();
        assert!(adapter.is_ready());
    }

    #[test]
    fn outstanding_error_names_the_port() {
        let error = BusError::Outstanding { port: PortId(3) };
        assert_eq!(error.to_string(), "port3 already has an outstanding transaction");
    }
}
