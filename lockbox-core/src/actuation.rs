//! Capability traits for the hardware the controller drives.
//!
//! The controller only ever asks for one of two lock positions, flips a
//! single indicator, and publishes the lock state. Calibration, travel timing
//! and transport of the published status belong to the implementations.

use crate::config::ServoPositions;
use crate::controller::LockState;

/// Target position for the lock mechanism.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LockPosition {
    Lock,
    Unlock,
}

impl LockPosition {
    /// Servo angle for this position under the given calibration.
    #[must_use]
    pub const fn angle(self, positions: &ServoPositions) -> u16 {
        match self {
            LockPosition::Lock => positions.lock,
            LockPosition::Unlock => positions.unlock,
        }
    }
}

/// Indicator output level.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IndicatorLevel {
    On,
    Off,
}

impl IndicatorLevel {
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, IndicatorLevel::On)
    }
}

/// Abstraction over the lock mechanism driver.
pub trait LockActuator {
    /// Commands the mechanism towards `position`.
    fn move_to(&mut self, position: LockPosition);
}

/// Abstraction over the status light.
pub trait StatusIndicator {
    fn set(&mut self, level: IndicatorLevel);
}

/// Sink for the externally observable lock status.
pub trait StatusPublisher {
    /// Publishes the current state; the wire value is [`LockState::as_str`].
    fn publish(&mut self, state: LockState);
}

/// Actuator that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopActuator;

impl LockActuator for NoopActuator {
    fn move_to(&mut self, _: LockPosition) {}
}

/// Indicator that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopIndicator;

impl StatusIndicator for NoopIndicator {
    fn set(&mut self, _: IndicatorLevel) {}
}

/// Publisher that discards every update.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopPublisher;

impl StatusPublisher for NoopPublisher {
    fn publish(&mut self, _: LockState) {}
}

impl<T: LockActuator + ?Sized> LockActuator for &mut T {
    fn move_to(&mut self, position: LockPosition) {
        (**self).move_to(position);
    }
}

impl<T: StatusIndicator + ?Sized> StatusIndicator for &mut T {
    fn set(&mut self, level: IndicatorLevel) {
        (**self).set(level);
    }
}

impl<T: StatusPublisher + ?Sized> StatusPublisher for &mut T {
    fn publish(&mut self, state: LockState) {
        (**self).publish(state);
    }
}
