//! Address arithmetic shared by traffic writers and checkers.
//!
//! A [`TransferSession`] is derived once from an addressing convention, a base
//! byte address, a byte length and a seed. Writers and checkers walk the same
//! session and stop when the address of the transfer that just completed equals
//! [`TransferSession::final_address`]. There is no separate countdown: the
//! address comparison is the termination test.

use crate::memory::{validate_address_width, validate_session_length, validate_session_span};
use crate::{ConfigError, WORD_ACCESS_BYTES};

/// Width in bits of every data word moved by the engine.
pub const DATA_WIDTH_BITS: u32 = 32;

/// Default address-bus width in bits.
pub const ADDRESS_WIDTH_BITS: u32 = 64;

/// Convention mapping a word's position to the address driven on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AddressingMode {
    /// Bus addresses are byte offsets; consecutive words are 4 apart.
    Byte,
    /// Bus addresses are word indices; consecutive words are 1 apart.
    Word,
}

impl AddressingMode {
    /// Bus-address step between consecutive words.
    #[must_use]
    pub const fn increment(self) -> u64 {
        match self {
            Self::Byte => WORD_ACCESS_BYTES,
            Self::Word => 1,
        }
    }

    /// Converts a byte address into the address driven on the bus.
    #[must_use]
    pub const fn to_bus_address(self, byte_address: u64) -> u64 {
        match self {
            Self::Byte => byte_address,
            Self::Word => byte_address >> 2,
        }
    }

    /// Converts a bus address back into the byte address it selects.
    #[must_use]
    pub const fn to_byte_address(self, bus_address: u64) -> u64 {
        match self {
            Self::Byte => bus_address,
            Self::Word => bus_address << 2,
        }
    }

    /// Lower-case name used on the command line and in reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Word => "word",
        }
    }

    /// Parses a name produced by [`AddressingMode::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "byte" => Some(Self::Byte),
            "word" => Some(Self::Word),
            _ => None,
        }
    }
}

/// Immutable geometry and seed of one writer or checker session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferSession {
    mode: AddressingMode,
    initial_address: u64,
    increment: u64,
    transfer_count: u64,
    seed: u32,
}

impl TransferSession {
    /// Derives a session covering `max_length` bytes from `base_address`.
    ///
    /// In word mode the base address is shifted into a word index; the transfer
    /// count is `max_length / 4` in both modes.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when `max_length` is zero or not a multiple of
    /// 4, when `address_width` is outside `1..=64`, or when the session does
    /// not fit in `address_width` bits.
    pub const fn derive(
        mode: AddressingMode,
        base_address: u64,
        max_length: u64,
        seed: u32,
        address_width: u32,
    ) -> Result<Self, ConfigError> {
        if let Err(error) = validate_session_length(max_length) {
            return Err(error);
        }
        if let Err(error) = validate_address_width(address_width) {
            return Err(error);
        }
        if let Err(error) = validate_session_span(base_address, max_length, address_width) {
            return Err(error);
        }

        Ok(Self {
            mode,
            initial_address: mode.to_bus_address(base_address),
            increment: mode.increment(),
            transfer_count: max_length / WORD_ACCESS_BYTES,
            seed,
        })
    }

    /// Addressing convention of this session.
    #[must_use]
    pub const fn mode(&self) -> AddressingMode {
        self.mode
    }

    /// Bus address of the first transfer.
    #[must_use]
    pub const fn initial_address(&self) -> u64 {
        self.initial_address
    }

    /// Bus-address step between transfers.
    #[must_use]
    pub const fn increment(&self) -> u64 {
        self.increment
    }

    /// Number of transfers in the session.
    #[must_use]
    pub const fn transfer_count(&self) -> u64 {
        self.transfer_count
    }

    /// Data value of the first transfer.
    #[must_use]
    pub const fn seed(&self) -> u32 {
        self.seed
    }

    /// Byte address of the first transfer.
    #[must_use]
    pub const fn base_byte_address(&self) -> u64 {
        self.mode.to_byte_address(self.initial_address)
    }

    /// Length of the session in bytes.
    #[must_use]
    pub const fn byte_length(&self) -> u64 {
        self.transfer_count * WORD_ACCESS_BYTES
    }

    /// Bus address of the last transfer: `initial + (count - 1) * increment`.
    #[must_use]
    pub const fn final_address(&self) -> u64 {
        self.initial_address + (self.transfer_count - 1) * self.increment
    }

    /// Termination predicate evaluated on the address of a completed transfer.
    #[must_use]
    pub const fn is_final(&self, address: u64) -> bool {
        address == self.final_address()
    }

    /// The full `(bus address, data)` sequence this session produces.
    pub fn expected_words(&self) -> impl Iterator<Item = (u64, u32)> + '_ {
        (0..self.transfer_count).map(move |index| {
            #[allow(clippy::cast_possible_truncation)]
            let value = self.seed.wrapping_add(index as u32);
            (self.initial_address + index * self.increment, value)
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{AddressingMode, TransferSession, ADDRESS_WIDTH_BITS};
    use crate::ConfigError;

    #[test]
    fn byte_mode_high_region_scenario() {
        let session = TransferSession::derive(
            AddressingMode::Byte,
            0x4_0000_0000,
            0x100,
            0x1234_5678,
            ADDRESS_WIDTH_BITS,
        )
        .expect("valid session");

        assert_eq!(session.initial_address(), 0x4_0000_0000);
        assert_eq!(session.increment(), 4);
        assert_eq!(session.transfer_count(), 64);
        assert_eq!(session.final_address(), 0x4_0000_00FC);

        let words: Vec<_> = session.expected_words().collect();
        assert_eq!(words.first(), Some(&(0x4_0000_0000, 0x1234_5678)));
        assert_eq!(words.last(), Some(&(0x4_0000_00FC, 0x1234_56B7)));
    }

    #[test]
    fn word_mode_low_region_scenario() {
        let session = TransferSession::derive(
            AddressingMode::Word,
            0x2_0000,
            0x100,
            0xCAFE_BEBE,
            ADDRESS_WIDTH_BITS,
        )
        .expect("valid session");

        assert_eq!(session.initial_address(), 0x8000);
        assert_eq!(session.increment(), 1);
        assert_eq!(session.transfer_count(), 64);
        assert_eq!(session.final_address(), 0x803F);
        assert_eq!(session.base_byte_address(), 0x2_0000);

        let words: Vec<_> = session.expected_words().collect();
        assert_eq!(words.last(), Some(&(0x803F, 0xCAFE_BEFD)));
    }

    #[rstest]
    #[case(AddressingMode::Byte, 0x2_0000, 0x2_0000)]
    #[case(AddressingMode::Word, 0x2_0000, 0x8000)]
    #[case(AddressingMode::Word, 0x4_0000_0000, 0x1_0000_0000)]
    fn bus_address_conversion(
        #[case] mode: AddressingMode,
        #[case] byte_address: u64,
        #[case] bus_address: u64,
    ) {
        assert_eq!(mode.to_bus_address(byte_address), bus_address);
        assert_eq!(mode.to_byte_address(bus_address), byte_address);
    }

    #[test]
    fn unaligned_length_is_a_construction_error() {
        assert_eq!(
            TransferSession::derive(AddressingMode::Byte, 0, 0x102, 0, 64),
            Err(ConfigError::UnalignedLength { length: 0x102 })
        );
    }

    #[test]
    fn high_base_rejected_for_thirty_two_bit_bus() {
        assert_eq!(
            TransferSession::derive(AddressingMode::Byte, 0x4_0000_0000, 0x100, 0, 32),
            Err(ConfigError::BaseAddressOutOfRange {
                base: 0x4_0000_0000,
                width: 32
            })
        );
    }

    #[test]
    fn wrapping_seed_is_not_an_error() {
        let session = TransferSession::derive(AddressingMode::Byte, 0, 8, u32::MAX, 64)
            .expect("valid session");
        let values: Vec<_> = session.expected_words().map(|(_, value)| value).collect();
        assert_eq!(values, vec![u32::MAX, 0]);
    }

    #[test]
    fn mode_names_round_trip() {
        for mode in [AddressingMode::Byte, AddressingMode::Word] {
            assert_eq!(AddressingMode::from_name(mode.name()), Some(mode));
        }
        assert_eq!(AddressingMode::from_name("dword"), None);
    }

    fn any_mode() -> impl Strategy<Value = AddressingMode> {
        prop_oneof![Just(AddressingMode::Byte), Just(AddressingMode::Word)]
    }

    proptest! {
        #[test]
        fn transfer_count_is_length_over_four(
            mode in any_mode(),
            base in 0_u64..0x1_0000_0000_0000,
            words in 1_u64..0x400,
            seed in any::<u32>(),
        ) {
            let base = base & !3;
            let session = TransferSession::derive(mode, base, words * 4, seed, 64)
                .expect("aligned non-empty session");
            prop_assert_eq!(session.transfer_count(), words);
        }

        #[test]
        fn last_stepped_address_is_the_predicate_address(
            mode in any_mode(),
            base in 0_u64..0x1_0000_0000_0000,
            words in 1_u64..0x400,
        ) {
            let base = base & !3;
            let session = TransferSession::derive(mode, base, words * 4, 0, 64)
                .expect("aligned non-empty session");

            let mut address = session.initial_address();
            let mut finals = 0;
            for step in 0..session.transfer_count() {
                if session.is_final(address) {
                    finals += 1;
                    prop_assert_eq!(step, session.transfer_count() - 1);
                }
                address += session.increment();
            }
            prop_assert_eq!(finals, 1);
        }
    }
}
