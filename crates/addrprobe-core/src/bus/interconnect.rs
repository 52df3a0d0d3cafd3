use std::collections::HashMap;

use super::{
    BusResponse, BusTarget, PortId, ReadBeat, SplitChannelRequest, SplitChannelResponse,
    UnifiedChannelRequest, UnifiedChannelResponse, WriteBeat,
};
use crate::memory::{address_mask, validate_address_width, WordMemory, MAX_ADDRESS_WIDTH};
use crate::{AddressingMode, ConfigError, HandshakeTiming};

#[derive(Debug, Clone, Copy)]
struct Pending<T> {
    value: Option<T>,
    delay: u32,
}

impl<T> Default for Pending<T> {
    fn default() -> Self {
        Self {
            value: None,
            delay: 0,
        }
    }
}

impl<T: Copy> Pending<T> {
    const fn schedule(value: T, delay: u32) -> Self {
        Self {
            value: Some(value),
            delay,
        }
    }

    /// Presents the value once its delay has elapsed; `taken` consumes it.
    fn present(&mut self, taken: bool) -> Option<T> {
        let value = self.value?;
        if self.delay > 0 {
            self.delay -= 1;
            return None;
        }
        if taken {
            self.value = None;
        }
        Some(value)
    }

    const fn is_busy(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SplitPort {
    address_held: u32,
    data_held: u32,
    read_address_held: u32,
    latched_address: Option<u64>,
    latched_data: Option<WriteBeat>,
    write_response: Pending<BusResponse>,
    read_data: Pending<ReadBeat>,
}

#[derive(Debug, Clone, Copy, Default)]
struct PortState {
    split: SplitPort,
    unified_held: u32,
}

/// Multi-port interconnect in front of a [`WordMemory`].
///
/// Every port carries its own handshake state, so masters never share
/// in-flight transactions. Addresses are converted to byte addresses using the
/// requesting port's convention, then truncated to the decoded address width
/// before region lookup. Unmapped accesses answer [`BusResponse::DecodeError`]
/// and read zero.
#[derive(Debug, Clone)]
pub struct Interconnect {
    memory: WordMemory,
    timing: HandshakeTiming,
    address_bits: u32,
    ports: HashMap<PortId, PortState>,
}

impl Interconnect {
    /// Creates an interconnect decoding all 64 address bits.
    #[must_use]
    pub fn new(memory: WordMemory, timing: HandshakeTiming) -> Self {
        Self {
            memory,
            timing,
            address_bits: MAX_ADDRESS_WIDTH,
            ports: HashMap::new(),
        }
    }

    /// Restricts decoding to the low `bits` address bits.
    ///
    /// A 32-bit interconnect in front of a high region is the wiring defect the
    /// traffic checkers are meant to catch.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAddressWidth`] outside `1..=64`.
    pub fn with_address_bits(mut self, bits: u32) -> Result<Self, ConfigError> {
        validate_address_width(bits)?;
        self.address_bits = bits;
        Ok(self)
    }

    /// Number of decoded address bits.
    #[must_use]
    pub const fn address_bits(&self) -> u32 {
        self.address_bits
    }

    /// Handshake timing in use.
    #[must_use]
    pub const fn timing(&self) -> HandshakeTiming {
        self.timing
    }

    /// Backing memory.
    #[must_use]
    pub const fn memory(&self) -> &WordMemory {
        &self.memory
    }

    /// Backing memory, mutable for inspection and fault injection.
    pub fn memory_mut(&mut self) -> &mut WordMemory {
        &mut self.memory
    }

    /// Drops all in-flight handshake state on every port.
    pub fn reset_ports(&mut self) {
        self.ports.clear();
    }

    const fn decode(&self, addressing: AddressingMode, bus_address: u64) -> u64 {
        addressing.to_byte_address(bus_address) & address_mask(self.address_bits)
    }

    fn write(&mut self, addressing: AddressingMode, address: u64, beat: WriteBeat) -> BusResponse {
        let byte_address = self.decode(addressing, address);
        if self.memory.write_word(byte_address, beat.data, beat.strobe) {
            BusResponse::Okay
        } else {
            log::warn!("write to unmapped address {byte_address:#x} dropped");
            BusResponse::DecodeError
        }
    }

    fn read(&self, addressing: AddressingMode, address: u64) -> ReadBeat {
        let byte_address = self.decode(addressing, address);
        self.memory.read_word(byte_address).map_or_else(
            || {
                log::warn!("read from unmapped address {byte_address:#x}");
                ReadBeat {
                    data: 0,
                    response: BusResponse::DecodeError,
                }
            },
            |data| ReadBeat {
                data,
                response: BusResponse::Okay,
            },
        )
    }
}

/// Advances a hold counter; returns `true` on the step the target accepts.
fn accept(held: &mut u32, wait: u32) -> bool {
    if *held >= wait {
        *held = 0;
        true
    } else {
        *held += 1;
        false
    }
}

impl BusTarget for Interconnect {
    fn split_cycle(&mut self, port: PortId, request: &SplitChannelRequest) -> SplitChannelResponse {
        let timing = self.timing;
        let mut state = self.ports.get(&port).copied().unwrap_or_default().split;
        let mut response = SplitChannelResponse {
            write_response: state.write_response.present(request.write_response_ready),
            read_data: state.read_data.present(request.read_data_ready),
            ..SplitChannelResponse::default()
        };

        if !state.write_response.is_busy() {
            if let Some(address) = request.write_address {
                if state.latched_address.is_none()
                    && accept(&mut state.address_held, timing.address_wait)
                {
                    state.latched_address = Some(address);
                    response.write_address_ready = true;
                }
            }
            if let Some(beat) = request.write_data {
                if state.latched_data.is_none() && accept(&mut state.data_held, timing.data_wait) {
                    state.latched_data = Some(beat);
                    response.write_data_ready = true;
                }
            }
            if let (Some(address), Some(beat)) = (state.latched_address, state.latched_data) {
                let status = self.write(request.addressing, address, beat);
                state.write_response = Pending::schedule(status, timing.response_wait);
                state.latched_address = None;
                state.latched_data = None;
            }
        }

        if !state.read_data.is_busy() {
            if let Some(address) = request.read_address {
                if accept(&mut state.read_address_held, timing.address_wait) {
                    response.read_address_ready = true;
                    let beat = self.read(request.addressing, address);
                    state.read_data = Pending::schedule(beat, timing.response_wait);
                }
            }
        }

        self.ports.entry(port).or_default().split = state;
        response
    }

    fn unified_cycle(
        &mut self,
        port: PortId,
        request: Option<&UnifiedChannelRequest>,
    ) -> UnifiedChannelResponse {
        let ack_wait = self.timing.ack_wait;
        let held = &mut self.ports.entry(port).or_default().unified_held;
        let Some(request) = request else {
            *held = 0;
            return UnifiedChannelResponse::default();
        };
        if !accept(held, ack_wait) {
            return UnifiedChannelResponse::default();
        }

        if request.write {
            let beat = WriteBeat {
                data: request.data,
                strobe: request.select,
            };
            UnifiedChannelResponse {
                ack: true,
                data: 0,
                response: self.write(request.addressing, request.address, beat),
            }
        } else {
            let beat = self.read(request.addressing, request.address);
            UnifiedChannelResponse {
                ack: true,
                data: beat.data,
                response: beat.response,
            }
        }
    }
}
