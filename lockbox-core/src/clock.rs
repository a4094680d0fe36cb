//! Monotonic time abstraction shared by firmware and host targets.
//!
//! The controller never reads a clock itself; every operation takes the
//! current instant as an argument. Firmware wraps `embassy_time::Instant`, the
//! emulator and tests use [`Millis`].

use core::ops::Add;
use core::time::Duration;

/// Monotonic timestamp type accepted by the controller.
pub trait MonotonicInstant: Copy + Ord + Add<Duration, Output = Self> {
    /// Returns the saturating duration from `earlier` to `self`.
    fn saturating_duration_since(&self, earlier: Self) -> Duration;
}

/// Millisecond counter since boot.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Millis(u64);

impl Millis {
    /// Boot instant.
    pub const ZERO: Self = Self(0);

    /// Creates an instant `value` milliseconds after boot.
    #[must_use]
    pub const fn from_millis(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw millisecond count.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }
}

impl Add<Duration> for Millis {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        let millis = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }
}

impl MonotonicInstant for Millis {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}
