use crate::TransferSession;

/// Cursor through one transfer session.
///
/// Owned by exactly one writer or checker. Rebuilt from the session every time
/// the owning stage leaves `Idle`, so a restarted stage replays the identical
/// address/value sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunningState {
    /// Bus address of the transfer in flight.
    pub current_address: u64,
    /// Data value expected at `current_address`.
    pub current_value: u32,
    /// Transfers not yet completed, including the one in flight.
    pub transfers_remaining: u64,
}

impl RunningState {
    /// Returns the initial cursor of `session`.
    #[must_use]
    pub const fn from_session(session: &TransferSession) -> Self {
        Self {
            current_address: session.initial_address(),
            current_value: session.seed(),
            transfers_remaining: session.transfer_count(),
        }
    }

    /// Steps past the transfer that just completed.
    ///
    /// The termination predicate is evaluated on the completed address before
    /// the cursor moves. Returns `true` when that transfer was the last one.
    /// The data value wraps at 32 bits.
    #[allow(clippy::missing_const_for_fn)]
    pub fn advance(&mut self, session: &TransferSession) -> bool {
        let finished = session.is_final(self.current_address);
        self.current_address = self.current_address.wrapping_add(session.increment());
        self.current_value = self.current_value.wrapping_add(1);
        self.transfers_remaining = self.transfers_remaining.saturating_sub(1);
        finished
    }
}
