//! Deterministic configuration checks for session geometry.

use crate::ConfigError;

/// Canonical byte width of one data word on every bus port.
pub const WORD_ACCESS_BYTES: u64 = 4;

/// Widest supported address bus in bits.
pub const MAX_ADDRESS_WIDTH: u32 = 64;

/// Returns the mask selecting the low `width` address bits.
///
/// Widths of 64 bits or more select the full address.
#[must_use]
pub const fn address_mask(width: u32) -> u64 {
    if width >= MAX_ADDRESS_WIDTH {
        u64::MAX
    } else {
        (1_u64 << width) - 1
    }
}

/// Validates that a session length is a non-zero whole number of words.
///
/// # Errors
///
/// Returns [`ConfigError::UnalignedLength`] when `length` is not a multiple of
/// 4 bytes, or [`ConfigError::EmptySession`] when it is zero.
pub const fn validate_session_length(length: u64) -> Result<(), ConfigError> {
    if length % WORD_ACCESS_BYTES != 0 {
        Err(ConfigError::UnalignedLength { length })
    } else if length == 0 {
        Err(ConfigError::EmptySession)
    } else {
        Ok(())
    }
}

/// Validates an address width in bits.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidAddressWidth`] outside `1..=64`.
pub const fn validate_address_width(width: u32) -> Result<(), ConfigError> {
    if width == 0 || width > MAX_ADDRESS_WIDTH {
        Err(ConfigError::InvalidAddressWidth { width })
    } else {
        Ok(())
    }
}

/// Validates that every byte of `base..base + length` is addressable with
/// `width` address bits.
///
/// # Errors
///
/// Returns [`ConfigError::BaseAddressOutOfRange`] when `base` itself does not
/// fit, or [`ConfigError::SessionOverrunsAddressSpace`] when the last byte does
/// not.
pub const fn validate_session_span(base: u64, length: u64, width: u32) -> Result<(), ConfigError> {
    let mask = address_mask(width);
    if base & !mask != 0 {
        return Err(ConfigError::BaseAddressOutOfRange { base, width });
    }

    match base.checked_add(length.saturating_sub(1)) {
        Some(last) if last & !mask == 0 => Ok(()),
        _ => Err(ConfigError::SessionOverrunsAddressSpace {
            base,
            length,
            width,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        address_mask, validate_address_width, validate_session_length, validate_session_span,
    };
    use crate::ConfigError;

    #[test]
    fn session_length_must_be_whole_non_zero_words() {
        assert_eq!(validate_session_length(0x100), Ok(()));
        assert_eq!(validate_session_length(4), Ok(()));
        assert_eq!(validate_session_length(0), Err(ConfigError::EmptySession));
        for length in [1, 2, 3, 0x101, 0x102, 0x103] {
            assert_eq!(
                validate_session_length(length),
                Err(ConfigError::UnalignedLength { length })
            );
        }
    }

    #[test]
    fn address_width_accepts_one_through_sixty_four() {
        assert_eq!(validate_address_width(1), Ok(()));
        assert_eq!(validate_address_width(32), Ok(()));
        assert_eq!(validate_address_width(64), Ok(()));
        assert_eq!(
            validate_address_width(0),
            Err(ConfigError::InvalidAddressWidth { width: 0 })
        );
        assert_eq!(
            validate_address_width(65),
            Err(ConfigError::InvalidAddressWidth { width: 65 })
        );
    }

    #[test]
    fn address_mask_covers_requested_bits() {
        assert_eq!(address_mask(32), 0xFFFF_FFFF);
        assert_eq!(address_mask(35), 0x7_FFFF_FFFF);
        assert_eq!(address_mask(64), u64::MAX);
    }

    #[test]
    fn high_region_needs_more_than_thirty_two_bits() {
        assert_eq!(validate_session_span(0x4_0000_0000, 0x100, 64), Ok(()));
        assert_eq!(validate_session_span(0x4_0000_0000, 0x100, 35), Ok(()));
        assert_eq!(
            validate_session_span(0x4_0000_0000, 0x100, 32),
            Err(ConfigError::BaseAddressOutOfRange {
                base: 0x4_0000_0000,
                width: 32
            })
        );
    }

    #[test]
    fn span_crossing_the_width_boundary_is_rejected() {
        assert_eq!(
            validate_session_span(0xFFFF_FF00, 0x200, 32),
            Err(ConfigError::SessionOverrunsAddressSpace {
                base: 0xFFFF_FF00,
                length: 0x200,
                width: 32
            })
        );
        assert_eq!(
            validate_session_span(u64::MAX - 3, 8, 64),
            Err(ConfigError::SessionOverrunsAddressSpace {
                base: u64::MAX - 3,
                length: 8,
                width: 64
            })
        );
        assert_eq!(validate_session_span(u64::MAX - 3, 4, 64), Ok(()));
    }
}
