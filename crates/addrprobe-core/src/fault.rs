use thiserror::Error;

use crate::{DataFault, StageId};

/// Configuration errors detected before a run is allowed to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ConfigError {
    /// Session length is not a whole number of 32-bit words.
    #[error("session length {length:#x} is not a multiple of 4 bytes")]
    UnalignedLength {
        /// Rejected length in bytes.
        length: u64,
    },
    /// Session length is zero, so no final transfer address exists.
    #[error("session length must be non-zero")]
    EmptySession,
    /// No addressing convention was selected.
    #[error("addressing mode is not set")]
    AddressingModeUnset,
    /// Address width is outside the supported `1..=64` bit range.
    #[error("address width {width} is outside 1..=64 bits")]
    InvalidAddressWidth {
        /// Rejected width in bits.
        width: u32,
    },
    /// Base address does not fit in the configured address width.
    #[error("base address {base:#x} exceeds the {width}-bit address width")]
    BaseAddressOutOfRange {
        /// Rejected base address.
        base: u64,
        /// Configured address width in bits.
        width: u32,
    },
    /// Last byte of the session does not fit in the configured address width.
    #[error("session at {base:#x} of {length:#x} bytes overruns the {width}-bit address width")]
    SessionOverrunsAddressSpace {
        /// Session base address.
        base: u64,
        /// Session length in bytes.
        length: u64,
        /// Configured address width in bits.
        width: u32,
    },
    /// The high and low sessions cover overlapping bytes.
    #[error("sessions at {first:#x} and {second:#x} overlap")]
    OverlappingSessions {
        /// Base address of the first session.
        first: u64,
        /// Base address of the second session.
        second: u64,
    },
    /// The watchdog window must last at least one step.
    #[error("watchdog window must be at least one cycle")]
    ZeroWatchdogWindow,
}

impl ConfigError {
    /// Returns the stable numeric code reported for this error class.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::UnalignedLength { .. } => 0x01,
            Self::EmptySession => 0x02,
            Self::AddressingModeUnset => 0x03,
            Self::InvalidAddressWidth { .. } => 0x04,
            Self::BaseAddressOutOfRange { .. } => 0x05,
            Self::SessionOverrunsAddressSpace { .. } => 0x06,
            Self::OverlappingSessions { .. } => 0x07,
            Self::ZeroWatchdogWindow => 0x08,
        }
    }
}

/// Harness-level failure returned when a run is bounded by a step limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum RunError {
    /// Neither pipeline completion nor the watchdog terminated the run in time.
    #[error("run did not terminate within {limit} steps")]
    StepLimit {
        /// Step limit that was exhausted.
        limit: u64,
    },
}

/// Reason the global termination signal was asserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "kebab-case"))]
pub enum Termination {
    /// Every stage ran to its end and no checker latched a mismatch.
    Completed,
    /// A checker latched a mismatch and the watchdog window elapsed.
    WatchdogTimeout {
        /// Checker stage whose latch armed the watchdog.
        stage: StageId,
        /// First mismatch latched by that checker.
        fault: DataFault,
    },
}

impl Termination {
    /// Returns `true` when the run terminated with failure status.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::WatchdogTimeout { .. })
    }

    /// Stable status byte for this termination (`0` pass, `1` data error).
    #[must_use]
    pub const fn status_code(self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::WatchdogTimeout { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, Termination};
    use crate::{DataFault, StageId};

    #[test]
    fn config_error_codes_are_unique() {
        let errors = [
            ConfigError::UnalignedLength { length: 3 },
            ConfigError::EmptySession,
            ConfigError::AddressingModeUnset,
            ConfigError::InvalidAddressWidth { width: 0 },
            ConfigError::BaseAddressOutOfRange { base: 0, width: 8 },
            ConfigError::SessionOverrunsAddressSpace {
                base: 0,
                length: 4,
                width: 8,
            },
            ConfigError::OverlappingSessions {
                first: 0,
                second: 0,
            },
            ConfigError::ZeroWatchdogWindow,
        ];
        let mut codes: Vec<u8> = errors.iter().map(|error| error.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn config_error_messages_name_offending_values() {
        let error = ConfigError::UnalignedLength { length: 0x102 };
        assert_eq!(
            error.to_string(),
            "session length 0x102 is not a multiple of 4 bytes"
        );

        let error = ConfigError::BaseAddressOutOfRange {
            base: 0x4_0000_0000,
            width: 32,
        };
        assert_eq!(
            error.to_string(),
            "base address 0x400000000 exceeds the 32-bit address width"
        );
    }

    #[test]
    fn only_watchdog_timeout_is_a_failure() {
        assert!(!Termination::Completed.is_failure());
        assert_eq!(Termination::Completed.status_code(), 0);

        let timeout = Termination::WatchdogTimeout {
            stage: StageId::CheckerHigh,
            fault: DataFault {
                address: 0x4_0000_0000,
                expected: 0x1234_5678,
                observed: 0x1234_5679,
            },
        };
        assert!(timeout.is_failure());
        assert_eq!(timeout.status_code(), 1);
    }
}
