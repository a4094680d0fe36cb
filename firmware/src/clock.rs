#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Embassy time source for the lock controller.

use core::ops::Add;
use core::time::Duration as CoreDuration;

use embassy_time::{Duration, Instant};
use lockbox_core::MonotonicInstant;

/// `embassy_time::Instant` wrapped so it satisfies the core clock trait.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct FirmwareInstant(Instant);

impl FirmwareInstant {
    #[cfg(target_os = "none")]
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub const fn into_embassy(self) -> Instant {
        self.0
    }
}

impl From<Instant> for FirmwareInstant {
    fn from(instant: Instant) -> Self {
        Self(instant)
    }
}

impl Add<CoreDuration> for FirmwareInstant {
    type Output = Self;

    fn add(self, rhs: CoreDuration) -> Self {
        let micros = u64::try_from(rhs.as_micros()).unwrap_or(u64::MAX);
        let ticks = self
            .0
            .checked_add(Duration::from_micros(micros))
            .unwrap_or(Instant::MAX);
        Self(ticks)
    }
}

impl MonotonicInstant for FirmwareInstant {
    fn saturating_duration_since(&self, earlier: Self) -> CoreDuration {
        let elapsed = self.0.saturating_duration_since(earlier.0);
        CoreDuration::from_micros(elapsed.as_micros())
    }
}
