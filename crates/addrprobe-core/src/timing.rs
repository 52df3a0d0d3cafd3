/// Default number of steps between the first latched mismatch and termination.
pub const DEFAULT_WATCHDOG_WINDOW: u64 = 128;

/// Default idle steps a unified-channel writer inserts after each acknowledge.
pub const DEFAULT_QUIESCENT_CYCLES: u32 = 10;

/// Default bound on steps for [`crate::Testbench::run`] callers that need one.
pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;

/// Wait states the simulated interconnect inserts on each handshake.
///
/// Each field counts steps a master must hold its request before the target
/// responds. `response_wait` is counted from acceptance; the response is never
/// presented on the acceptance step itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HandshakeTiming {
    /// Steps before write/read address ready (split channel).
    pub address_wait: u32,
    /// Steps before write data ready (split channel).
    pub data_wait: u32,
    /// Extra steps before a write response or read data is presented (split channel).
    pub response_wait: u32,
    /// Steps before acknowledge (unified channel).
    pub ack_wait: u32,
}

impl HandshakeTiming {
    /// Zero wait states everywhere.
    pub const IMMEDIATE: Self = Self {
        address_wait: 0,
        data_wait: 0,
        response_wait: 0,
        ack_wait: 0,
    };

    /// Registered target: split channels accept at once, unified acknowledges a step late.
    pub const REGISTERED: Self = Self {
        address_wait: 0,
        data_wait: 0,
        response_wait: 0,
        ack_wait: 1,
    };
}

impl Default for HandshakeTiming {
    fn default() -> Self {
        Self::REGISTERED
    }
}

/// Named timing presets accepted on the command line.
pub const TIMING_PROFILES: &[(&str, HandshakeTiming)] = &[
    ("immediate", HandshakeTiming::IMMEDIATE),
    ("registered", HandshakeTiming::REGISTERED),
    (
        "address-first",
        HandshakeTiming {
            address_wait: 0,
            data_wait: 3,
            response_wait: 0,
            ack_wait: 1,
        },
    ),
    (
        "data-first",
        HandshakeTiming {
            address_wait: 3,
            data_wait: 0,
            response_wait: 0,
            ack_wait: 1,
        },
    ),
    (
        "slow-response",
        HandshakeTiming {
            address_wait: 1,
            data_wait: 1,
            response_wait: 4,
            ack_wait: 3,
        },
    ),
];

/// Looks up a timing preset by name.
#[must_use]
pub fn timing_profile(name: &str) -> Option<HandshakeTiming> {
    TIMING_PROFILES
        .iter()
        .find_map(|(entry_name, timing)| (*entry_name == name).then_some(*timing))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{timing_profile, HandshakeTiming, TIMING_PROFILES};

    #[test]
    fn table_contains_unique_names() {
        let names: HashSet<_> = TIMING_PROFILES.iter().map(|(name, _)| *name).collect();
        assert_eq!(names.len(), TIMING_PROFILES.len());
    }

    #[test]
    fn default_timing_is_the_registered_profile() {
        assert_eq!(timing_profile("registered"), Some(HandshakeTiming::default()));
        assert_eq!(timing_profile("immediate"), Some(HandshakeTiming::IMMEDIATE));
        assert_eq!(timing_profile("turbo"), None);
    }

    #[test]
    fn skewed_profiles_delay_one_split_channel() {
        let address_first = timing_profile("address-first").expect("known profile");
        assert!(address_first.data_wait > address_first.address_wait);

        let data_first = timing_profile("data-first").expect("known profile");
        assert!(data_first.address_wait > data_first.data_wait);
    }

    #[test]
    fn every_table_entry_resolves_via_lookup() {
        for (name, timing) in TIMING_PROFILES {
            assert_eq!(timing_profile(name), Some(*timing));
        }
    }
}
