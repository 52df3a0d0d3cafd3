/// First mismatch observed by a checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DataFault {
    /// Bus address of the failing read.
    pub address: u64,
    /// Value the checker expected.
    pub expected: u32,
    /// Value the bus returned.
    pub observed: u32,
}

/// Sticky error flag with the first fault that set it.
///
/// Later mismatches never overwrite the recorded fault. Only [`ErrorLatch::clear`]
/// (an external reset) releases it; a checker re-entering `Idle` does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ErrorLatch {
    fault: Option<DataFault>,
}

impl ErrorLatch {
    /// Returns `true` once any mismatch has been recorded.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.fault.is_some()
    }

    /// Returns the latched fault, if any.
    #[must_use]
    pub const fn fault(&self) -> Option<DataFault> {
        self.fault
    }

    /// Records `fault` unless the latch is already set.
    ///
    /// Returns `true` when this call set the latch.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record(&mut self, fault: DataFault) -> bool {
        if self.fault.is_some() {
            return false;
        }
        self.fault = Some(fault);
        true
    }

    /// Releases the latch.
    #[allow(clippy::missing_const_for_fn)]
    pub fn clear(&mut self) {
        self.fault = None;
    }
}
