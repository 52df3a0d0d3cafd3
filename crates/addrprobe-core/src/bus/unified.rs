use super::{
    BusAdapter, BusCompletion, BusDiscipline, BusError, BusResponse, BusTarget, PortId,
    TransferProgress,
};
use crate::memory::FULL_BYTE_ENABLE;
use crate::AddressingMode;

/// Combined request held asserted until acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnifiedChannelRequest {
    /// Convention of `address`.
    pub addressing: AddressingMode,
    /// Target address.
    pub address: u64,
    /// Write data; ignored for reads.
    pub data: u32,
    /// Direction: `true` for writes.
    pub write: bool,
    /// Byte-lane select.
    pub select: u8,
}

/// Target reply to a unified-channel step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UnifiedChannelResponse {
    /// Acknowledge; the transfer completes on this step.
    pub ack: bool,
    /// Read data, valid only together with `ack`.
    pub data: u32,
    /// Target status, valid only together with `ack`.
    pub response: BusResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Request(UnifiedChannelRequest),
    Quiescent { remaining: u32 },
}

/// Unified-channel master: one request, one acknowledge.
///
/// After an acknowledged write the adapter idles for `quiescent_cycles` steps
/// before it accepts new work.
#[derive(Debug, Clone)]
pub struct UnifiedChannelAdapter {
    port: PortId,
    addressing: AddressingMode,
    quiescent_cycles: u32,
    phase: Phase,
}

impl UnifiedChannelAdapter {
    /// Creates an idle adapter for `port`.
    #[must_use]
    pub const fn new(port: PortId, addressing: AddressingMode, quiescent_cycles: u32) -> Self {
        Self {
            port,
            addressing,
            quiescent_cycles,
            phase: Phase::Idle,
        }
    }

    fn begin(&mut self, address: u64, data: u32, write: bool) -> Result<(), BusError> {
        if self.phase != Phase::Idle {
            return Err(BusError::Outstanding { port: self.port });
        }
        self.phase = Phase::Request(UnifiedChannelRequest {
            addressing: self.addressing,
            address,
            data,
            write,
            select: FULL_BYTE_ENABLE,
        });
        Ok(())
    }
}

impl BusAdapter for UnifiedChannelAdapter {
    fn port(&self) -> PortId {
        self.port
    }

    fn discipline(&self) -> BusDiscipline {
        BusDiscipline::UnifiedChannel
    }

    fn addressing(&self) -> AddressingMode {
        self.addressing
    }

    fn progress(&self) -> TransferProgress {
        match self.phase {
            Phase::Idle => TransferProgress::Idle,
            Phase::Request(_) => TransferProgress::Requesting,
            Phase::Quiescent { .. } => TransferProgress::Quiescent,
        }
    }

    fn begin_write(&mut self, address: u64, data: u32) -> Result<(), BusError> {
        self.begin(address, data, true)
    }

    fn begin_read(&mut self, address: u64) -> Result<(), BusError> {
        self.begin(address, 0, false)
    }

    fn clock(&mut self, target: &mut dyn BusTarget) -> Option<BusCompletion> {
        match self.phase {
            Phase::Idle => None,
            Phase::Quiescent { remaining } => {
                target.unified_cycle(self.port, None);
                self.phase = match remaining.saturating_sub(1) {
                    0 => Phase::Idle,
                    remaining => Phase::Quiescent { remaining },
                };
                None
            }
            Phase::Request(request) => {
                let reply = target.unified_cycle(self.port, Some(&request));
                if !reply.ack {
                    return None;
                }

                self.phase = if request.write && self.quiescent_cycles > 0 {
                    Phase::Quiescent {
                        remaining: self.quiescent_cycles,
                    }
                } else {
                    Phase::Idle
                };

                Some(if request.write {
                    BusCompletion::Write {
                        response: reply.response,
                    }
                } else {
                    BusCompletion::Read {
                        data: reply.data,
                        response: reply.response,
                    }
                })
            }
        }
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
    }
}
