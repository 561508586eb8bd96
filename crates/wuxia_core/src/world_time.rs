//! Opaque world clock timestamp.
//!
//! The calendar lives with the engine. Combat only needs an ordered
//! timestamp it can copy and advance to compute effect expiry.

use serde::{Deserialize, Serialize};

/// A point in world time, counted in engine ticks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct WorldTimestamp(pub u64);

impl WorldTimestamp {
    /// Create a timestamp.
    #[must_use]
    pub const fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    /// A copy of this timestamp moved `ticks` into the future.
    #[must_use]
    pub const fn advanced_by(self, ticks: u64) -> Self {
        Self(self.0.saturating_add(ticks))
    }

    /// Raw tick count.
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for WorldTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_is_ordered() {
        let now = WorldTimestamp::new(10);
        let later = now.advanced_by(5);
        assert!(later > now);
        assert_eq!(later.ticks(), 15);
        assert_eq!(now.ticks(), 10, "advancing returns a copy");
    }

    #[test]
    fn test_advance_saturates() {
        assert_eq!(WorldTimestamp::new(u64::MAX).advanced_by(1).ticks(), u64::MAX);
    }
}
