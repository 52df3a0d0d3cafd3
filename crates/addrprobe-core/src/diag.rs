//! Data-error diagnostic record and run counters.

use std::fmt;

use crate::{DataFault, StageId, DATA_WIDTH_BITS};

/// Diagnostic emitted once when a checker's latch first sets.
///
/// Rendered as
/// `"<banner> Data Error @ 0x<address>: 0x<expected> vs 0x<observed>"`, with the
/// address zero-padded to `address_width / 4` hex digits and both data words to
/// `data_width / 4` digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DiagnosticRecord {
    /// Checker that latched the fault.
    pub stage: StageId,
    /// Latched fault.
    pub fault: DataFault,
    /// Address-bus width in bits.
    pub address_width: u32,
    /// Data-bus width in bits.
    pub data_width: u32,
}

impl DiagnosticRecord {
    /// Creates a record for the 32-bit data bus.
    #[must_use]
    pub const fn new(stage: StageId, fault: DataFault, address_width: u32) -> Self {
        Self {
            stage,
            fault,
            address_width,
            data_width: DATA_WIDTH_BITS,
        }
    }
}

impl fmt::Display for DiagnosticRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let address_digits = self.address_width.div_ceil(4) as usize;
        let data_digits = self.data_width.div_ceil(4) as usize;
        write!(
            f,
            "{} Data Error @ 0x{:0address_digits$x}: 0x{:0data_digits$x} vs 0x{:0data_digits$x}",
            self.stage.banner(),
            self.fault.address,
            self.fault.expected,
            self.fault.observed,
        )
    }
}

/// Saturating activity counters for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunCounters {
    /// Completed writes across both writers.
    pub writes: u64,
    /// Completed reads across both checkers.
    pub reads: u64,
    /// Mismatching reads, latched or not.
    pub mismatches: u64,
    /// Steps simulated.
    pub cycles: u64,
}

impl RunCounters {
    /// Adds another set of counters with saturating behavior.
    #[must_use]
    pub const fn merged(self, other: Self) -> Self {
        Self {
            writes: self.writes.saturating_add(other.writes),
            reads: self.reads.saturating_add(other.reads),
            mismatches: self.mismatches.saturating_add(other.mismatches),
            cycles: self.cycles.saturating_add(other.cycles),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{DiagnosticRecord, RunCounters};
    use crate::{DataFault, StageId};

    const FAULT: DataFault = DataFault {
        address: 0x4_0000_0000,
        expected: 0x1234_5678,
        observed: 0x1234_5679,
    };

    #[test]
    fn record_renders_reference_format() {
        let record = DiagnosticRecord::new(StageId::CheckerHigh, FAULT, 64);
        assert_eq!(
            record.to_string(),
            "[Checker High] Data Error @ 0x0000000400000000: 0x12345678 vs 0x12345679"
        );
    }

    #[rstest]
    #[case(32, "[Checker Low] Data Error @ 0x00008000: 0xcafebebe vs 0x00000000")]
    #[case(35, "[Checker Low] Data Error @ 0x000008000: 0xcafebebe vs 0x00000000")]
    fn address_padding_follows_address_width(#[case] width: u32, #[case] expected: &str) {
        let fault = DataFault {
            address: 0x8000,
            expected: 0xCAFE_BEBE,
            observed: 0,
        };
        let record = DiagnosticRecord::new(StageId::CheckerLow, fault, width);
        assert_eq!(record.to_string(), expected);
    }

    #[test]
    fn counters_merge_saturating() {
        let near_full = RunCounters {
            writes: u64::MAX - 1,
            reads: 1,
            mismatches: 0,
            cycles: 10,
        };
        let merged = near_full.merged(RunCounters {
            writes: 5,
            reads: 2,
            mismatches: 1,
            cycles: 0,
        });
        assert_eq!(merged.writes, u64::MAX);
        assert_eq!(merged.reads, 3);
        assert_eq!(merged.mismatches, 1);
        assert_eq!(merged.cycles, 10);
        assert_eq!(RunCounters::default().merged(merged), merged);
    }
}
