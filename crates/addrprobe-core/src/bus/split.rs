use super::{
    BusAdapter, BusCompletion, BusDiscipline, BusError, BusResponse, BusTarget, PortId,
    TransferProgress,
};
use crate::memory::FULL_BYTE_ENABLE;
use crate::AddressingMode;

/// Write-data channel payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WriteBeat {
    /// Data word.
    pub data: u32,
    /// Byte-lane enables.
    pub strobe: u8,
}

/// Read-data channel payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadBeat {
    /// Data word.
    pub data: u32,
    /// Target status.
    pub response: BusResponse,
}

/// Master-driven signals for one split-channel step. `Some` means valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SplitChannelRequest {
    /// Convention of the addresses below.
    pub addressing: AddressingMode,
    /// Write-address channel.
    pub write_address: Option<u64>,
    /// Write-data channel.
    pub write_data: Option<WriteBeat>,
    /// Write-response ready.
    pub write_response_ready: bool,
    /// Read-address channel.
    pub read_address: Option<u64>,
    /// Read-data ready.
    pub read_data_ready: bool,
}

impl SplitChannelRequest {
    /// Request with every channel deasserted.
    #[must_use]
    pub const fn idle(addressing: AddressingMode) -> Self {
        Self {
            addressing,
            write_address: None,
            write_data: None,
            write_response_ready: false,
            read_address: None,
            read_data_ready: false,
        }
    }
}

/// Target-driven signals for one split-channel step. `Some` means valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SplitChannelResponse {
    /// Write-address ready.
    pub write_address_ready: bool,
    /// Write-data ready.
    pub write_data_ready: bool,
    /// Write-response channel.
    pub write_response: Option<BusResponse>,
    /// Read-address ready.
    pub read_address_ready: bool,
    /// Read-data channel.
    pub read_data: Option<ReadBeat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Write {
        address: u64,
        beat: WriteBeat,
        address_accepted: bool,
        data_accepted: bool,
    },
    WriteResponse,
    ReadAddress {
        address: u64,
    },
    ReadData,
}

/// Split-channel master with independent address and data acceptance.
///
/// A write drives address and data together; whichever channel is accepted
/// first is dropped while the other stays valid. The write completes on the
/// response handshake. A read completes when read data is handed over.
#[derive(Debug, Clone)]
pub struct SplitChannelAdapter {
    port: PortId,
    addressing: AddressingMode,
    phase: Phase,
}

impl SplitChannelAdapter {
    /// Creates an idle adapter for `port`.
    #[must_use]
    pub const fn new(port: PortId, addressing: AddressingMode) -> Self {
        Self {
            port,
            addressing,
            phase: Phase::Idle,
        }
    }

    fn request(&self) -> SplitChannelRequest {
        let mut request = SplitChannelRequest::idle(self.addressing);
        match self.phase {
            Phase::Idle => {}
            Phase::Write {
                address,
                beat,
                address_accepted,
                data_accepted,
            } => {
                request.write_address = (!address_accepted).then_some(address);
                request.write_data = (!data_accepted).then_some(beat);
            }
            Phase::WriteResponse => request.write_response_ready = true,
            Phase::ReadAddress { address } => request.read_address = Some(address),
            Phase::ReadData => request.read_data_ready = true,
        }
        request
    }

    const fn ensure_idle(&self) -> Result<(), BusError> {
        match self.phase {
            Phase::Idle => Ok(()),
            _ => Err(BusError::Outstanding { port: self.port }),
        }
    }
}

impl BusAdapter for SplitChannelAdapter {
    fn port(&self) -> PortId {
        self.port
    }

    fn discipline(&self) -> BusDiscipline {
        BusDiscipline::SplitChannel
    }

    fn addressing(&self) -> AddressingMode {
        self.addressing
    }

    fn progress(&self) -> TransferProgress {
        match self.phase {
            Phase::Idle => TransferProgress::Idle,
            Phase::Write {
                address_accepted,
                data_accepted,
                ..
            } => {
                if address_accepted || data_accepted {
                    TransferProgress::PartiallyAccepted
                } else {
                    TransferProgress::Requesting
                }
            }
            Phase::ReadAddress { .. } => TransferProgress::Requesting,
            Phase::WriteResponse | Phase::ReadData => TransferProgress::AwaitingResponse,
        }
    }

    fn begin_write(&mut self, address: u64, data: u32) -> Result<(), BusError> {
        self.ensure_idle()?;
        self.phase = Phase::Write {
            address,
            beat: WriteBeat {
                data,
                strobe: FULL_BYTE_ENABLE,
            },
            address_accepted: false,
            data_accepted: false,
        };
        Ok(())
    }

    fn begin_read(&mut self, address: u64) -> Result<(), BusError> {
        self.ensure_idle()?;
        self.phase = Phase::ReadAddress { address };
        Ok(())
    }

    fn clock(&mut self, target: &mut dyn BusTarget) -> Option<BusCompletion> {
        if self.phase == Phase::Idle {
            return None;
        }

        let response = target.split_cycle(self.port, &self.request());
        match self.phase {
            Phase::Idle => None,
            Phase::Write {
                address,
                beat,
                address_accepted,
                data_accepted,
            } => {
                let address_accepted = address_accepted || response.write_address_ready;
                let data_accepted = data_accepted || response.write_data_ready;
                self.phase = if address_accepted && data_accepted {
                    Phase::WriteResponse
                } else {
                    Phase::Write {
                        address,
                        beat,
                        address_accepted,
                        data_accepted,
                    }
                };
                None
            }
            Phase::WriteResponse => {
                let response = response.write_response?;
                self.phase = Phase::Idle;
                Some(BusCompletion::Write { response })
            }
            Phase::ReadAddress { .. } => {
                if response.read_address_ready {
                    self.phase = Phase::ReadData;
                }
                None
            }
            Phase::ReadData => {
                let beat = response.read_data?;
                self.phase = Phase::Idle;
                Some(BusCompletion::Read {
                    data: beat.data,
                    response: beat.response,
                })
            }
        }
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
    }
}
