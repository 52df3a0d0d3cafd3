//! Bounded failure termination after a checker latches a mismatch.

use crate::{ConfigError, DataFault, DiagnosticRecord, StageId, Termination, TraceEvent, TraceSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Armed {
    cycle: u64,
    stage: StageId,
    fault: DataFault,
}

/// Observer over every checker latch.
///
/// On the first step any latch is seen set, the watchdog emits a
/// [`TraceEvent::DataError`] diagnostic and arms. Exactly `window` steps later
/// it reports [`Termination::WatchdogTimeout`], whatever the pipeline is doing.
#[derive(Debug, Clone)]
pub struct Watchdog {
    window: u64,
    address_width: u32,
    armed: Option<Armed>,
    fired: bool,
}

impl Watchdog {
    /// Creates a disarmed watchdog.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroWatchdogWindow`] when `window` is zero.
    pub const fn new(window: u64, address_width: u32) -> Result<Self, ConfigError> {
        if window == 0 {
            return Err(ConfigError::ZeroWatchdogWindow);
        }
        Ok(Self {
            window,
            address_width,
            armed: None,
            fired: false,
        })
    }

    /// Delay window in steps.
    #[must_use]
    pub const fn window(&self) -> u64 {
        self.window
    }

    /// Returns `true` once a latch has been observed.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Step on which the watchdog armed.
    #[must_use]
    pub fn armed_at(&self) -> Option<u64> {
        self.armed.map(|armed| armed.cycle)
    }

    /// Step on which termination will be forced.
    #[must_use]
    pub fn deadline(&self) -> Option<u64> {
        self.armed
            .map(|armed| armed.cycle.saturating_add(self.window))
    }

    /// Observes the checker latches at the end of step `cycle`.
    ///
    /// Returns the termination on the single step it is due.
    pub fn observe(
        &mut self,
        cycle: u64,
        latches: &[(StageId, Option<DataFault>)],
        sink: &mut dyn TraceSink,
    ) -> Option<Termination> {
        if self.armed.is_none() {
            let (stage, fault) = latches
                .iter()
                .find_map(|(stage, fault)| fault.map(|fault| (*stage, fault)))?;
            sink.on_event(TraceEvent::DataError(DiagnosticRecord::new(
                stage,
                fault,
                self.address_width,
            )));
            self.armed = Some(Armed {
                cycle,
                stage,
                fault,
            });
        }

        let armed = self.armed?;
        if self.fired || cycle < armed.cycle.saturating_add(self.window) {
            return None;
        }
        self.fired = true;
        Some(Termination::WatchdogTimeout {
            stage: armed.stage,
            fault: armed.fault,
        })
    }

    /// Disarms the watchdog.
    pub fn reset(&mut self) {
        self.armed = None;
        self.fired = false;
    }
}
