//! Region map for the simulated address space and its decoding helpers.

/// Origin of the default high region (only reachable with more than 32 address bits).
pub const HIGH_REGION_ORIGIN: u64 = 0x4_0000_0000;
/// Origin of the default low region (reachable with 32-bit addressing).
pub const LOW_REGION_ORIGIN: u64 = 0x0_0002_0000;
/// Default size in bytes of each region.
pub const DEFAULT_REGION_SIZE: u64 = 0x100;

/// Byte range mapped to RAM in the simulated address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionDescriptor {
    /// Short display name.
    pub name: &'static str,
    /// First byte address of the region.
    pub origin: u64,
    /// Size in bytes.
    pub size: u64,
}

impl RegionDescriptor {
    /// Creates a region descriptor.
    #[must_use]
    pub const fn new(name: &'static str, origin: u64, size: u64) -> Self {
        Self { name, origin, size }
    }

    /// Returns the inclusive last byte address, or `None` for an empty region.
    #[must_use]
    pub const fn last(self) -> Option<u64> {
        if self.size == 0 {
            None
        } else {
            self.origin.checked_add(self.size - 1)
        }
    }

    /// Returns `true` when `addr` belongs to this region.
    #[must_use]
    pub const fn contains(self, addr: u64) -> bool {
        match self.last() {
            Some(last) => addr >= self.origin && addr <= last,
            None => false,
        }
    }

    /// Returns `true` when the two regions share at least one byte.
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        match (self.last(), other.last()) {
            (Some(last), Some(other_last)) => self.origin <= other_last && other.origin <= last,
            _ => false,
        }
    }
}

/// Finds the region containing `addr` in `regions`.
#[must_use]
pub fn decode_region(regions: &[RegionDescriptor], addr: u64) -> Option<&RegionDescriptor> {
    regions.iter().find(|region| region.contains(addr))
}
