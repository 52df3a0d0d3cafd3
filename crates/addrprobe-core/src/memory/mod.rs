//! Simulated word-addressable RAM behind the interconnect.

/// Session geometry checks.
pub mod access;
/// Region descriptors and address decoding.
pub mod map;

use std::collections::HashMap;

pub use access::{
    address_mask, validate_address_width, validate_session_length, validate_session_span,
    MAX_ADDRESS_WIDTH, WORD_ACCESS_BYTES,
};
pub use map::{
    decode_region, RegionDescriptor, DEFAULT_REGION_SIZE, HIGH_REGION_ORIGIN, LOW_REGION_ORIGIN,
};

use crate::ConfigError;

/// Byte-enable mask selecting all four lanes of a data word.
pub const FULL_BYTE_ENABLE: u8 = 0b1111;

/// Region-mapped store of 32-bit words.
///
/// Addresses are byte addresses; the two low bits are ignored so every access
/// lands on the containing word. Words never written read back as zero.
#[derive(Debug, Clone, Default)]
pub struct WordMemory {
    regions: Vec<RegionDescriptor>,
    words: HashMap<u64, u32>,
}

impl WordMemory {
    /// Creates a memory with no mapped regions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a new RAM region.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the region size is not a non-zero
    /// multiple of 4, when it overruns the 64-bit address space, or when it
    /// overlaps an already mapped region.
    pub fn map(&mut self, region: RegionDescriptor) -> Result<(), ConfigError> {
        validate_session_length(region.size)?;
        validate_session_span(region.origin, region.size, MAX_ADDRESS_WIDTH)?;
        if let Some(existing) = self.regions.iter().find(|r| r.overlaps(region)) {
            return Err(ConfigError::OverlappingSessions {
                first: existing.origin,
                second: region.origin,
            });
        }
        self.regions.push(region);
        Ok(())
    }

    /// Returns the mapped regions in mapping order.
    #[must_use]
    pub fn regions(&self) -> &[RegionDescriptor] {
        &self.regions
    }

    /// Reads the word containing `addr`, or `None` when `addr` is unmapped.
    #[must_use]
    pub fn read_word(&self, addr: u64) -> Option<u32> {
        let word_addr = word_align(addr);
        decode_region(&self.regions, word_addr)?;
        Some(self.words.get(&word_addr).copied().unwrap_or(0))
    }

    /// Writes the byte lanes of `data` selected by `strobe` into the word
    /// containing `addr`.
    ///
    /// Returns `false` and leaves memory untouched when `addr` is unmapped.
    pub fn write_word(&mut self, addr: u64, data: u32, strobe: u8) -> bool {
        let word_addr = word_align(addr);
        if decode_region(&self.regions, word_addr).is_none() {
            return false;
        }
        let lanes = lane_mask(strobe);
        let word = self.words.entry(word_addr).or_insert(0);
        *word = (*word & !lanes) | (data & lanes);
        true
    }

    /// Overwrites a full word, bypassing the bus. Used to inject corruption.
    pub fn poke(&mut self, addr: u64, value: u32) -> bool {
        self.write_word(addr, value, FULL_BYTE_ENABLE)
    }

    /// Reads a word, bypassing the bus.
    #[must_use]
    pub fn peek(&self, addr: u64) -> Option<u32> {
        self.read_word(addr)
    }
}

const fn word_align(addr: u64) -> u64 {
    addr & !(WORD_ACCESS_BYTES - 1)
}

const fn lane_mask(strobe: u8) -> u32 {
    let mut mask = 0_u32;
    let mut lane = 0_u32;
    while lane < 4 {
        if strobe & (1 << lane) != 0 {
            mask |= 0xFF << (lane * 8);
        }
        lane += 1;
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::{
        lane_mask, RegionDescriptor, WordMemory, DEFAULT_REGION_SIZE, FULL_BYTE_ENABLE,
        HIGH_REGION_ORIGIN, LOW_REGION_ORIGIN,
    };
    use crate::ConfigError;

    fn reference_memory() -> WordMemory {
        let mut memory = WordMemory::new();
        memory
            .map(RegionDescriptor::new(
                "high",
                HIGH_REGION_ORIGIN,
                DEFAULT_REGION_SIZE,
            ))
            .expect("high region maps");
        memory
            .map(RegionDescriptor::new(
                "low",
                LOW_REGION_ORIGIN,
                DEFAULT_REGION_SIZE,
            ))
            .expect("low region maps");
        memory
    }

    #[test]
    fn unwritten_mapped_words_read_zero() {
        let memory = reference_memory();
        assert_eq!(memory.read_word(HIGH_REGION_ORIGIN), Some(0));
        assert_eq!(memory.read_word(LOW_REGION_ORIGIN + 0xFC), Some(0));
    }

    #[test]
    fn unmapped_accesses_are_rejected() {
        let mut memory = reference_memory();
        assert_eq!(memory.read_word(0), None);
        assert!(!memory.write_word(0, 0xDEAD_BEEF, FULL_BYTE_ENABLE));
        assert_eq!(memory.read_word(HIGH_REGION_ORIGIN + DEFAULT_REGION_SIZE), None);
    }

    #[test]
    fn returns_last_written_word() {
        let mut memory = reference_memory();
        assert!(memory.write_word(HIGH_REGION_ORIGIN + 8, 0x1234_5678, FULL_BYTE_ENABLE));
        assert!(memory.write_word(HIGH_REGION_ORIGIN + 8, 0x9ABC_DEF0, FULL_BYTE_ENABLE));
        assert_eq!(memory.read_word(HIGH_REGION_ORIGIN + 8), Some(0x9ABC_DEF0));
        assert_eq!(memory.read_word(HIGH_REGION_ORIGIN + 11), Some(0x9ABC_DEF0));
    }

    #[test]
    fn strobe_selects_byte_lanes() {
        let mut memory = reference_memory();
        assert!(memory.poke(LOW_REGION_ORIGIN, 0x1122_3344));
        assert!(memory.write_word(LOW_REGION_ORIGIN, 0xAABB_CCDD, 0b0101));
        assert_eq!(memory.peek(LOW_REGION_ORIGIN), Some(0x11BB_33DD));
        assert_eq!(lane_mask(0), 0);
        assert_eq!(lane_mask(FULL_BYTE_ENABLE), u32::MAX);
    }

    #[test]
    fn overlapping_regions_are_rejected() {
        let mut memory = reference_memory();
        let error = memory
            .map(RegionDescriptor::new("alias", LOW_REGION_ORIGIN + 0x80, 0x100))
            .expect_err("overlap must be rejected");
        assert_eq!(
            error,
            ConfigError::OverlappingSessions {
                first: LOW_REGION_ORIGIN,
                second: LOW_REGION_ORIGIN + 0x80
            }
        );
    }

    #[test]
    fn region_size_must_be_whole_words() {
        let mut memory = WordMemory::new();
        assert_eq!(
            memory.map(RegionDescriptor::new("odd", 0x1000, 6)),
            Err(ConfigError::UnalignedLength { length: 6 })
        );
        assert_eq!(
            memory.map(RegionDescriptor::new("empty", 0x1000, 0)),
            Err(ConfigError::EmptySession)
        );
    }
}
