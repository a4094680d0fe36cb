//! Compile-time tuning for the lockbox.
//!
//! The reference values come from the deployed box. [`LockboxConfig`] bundles
//! them so front-ends can override individual knobs (the emulator exposes them
//! as flags) and check the result with [`LockboxConfig::validate`].

use core::time::Duration;

use thiserror::Error;

use crate::input::ButtonPolarity;

/// Longest press still classified as [`Symbol::Short`](crate::Symbol::Short).
pub const SHORT_PRESS_MAX: Duration = Duration::from_millis(400);
/// Idle gap after which a partial entry is discarded.
pub const IDLE_RESET: Duration = Duration::from_millis(5_000);
/// Window after an unlock during which the servo settles.
pub const UNLOCK_SETTLE: Duration = Duration::from_millis(300);
/// Length of each on and each off phase of the failure blink.
pub const BLINK_PHASE: Duration = Duration::from_millis(100);
/// Number of on/off pulses signalled on a rejected code.
pub const FAILURE_PULSES: u8 = 3;
/// Hold interval used when automatic relocking is enabled.
pub const UNLOCK_HOLD: Duration = Duration::from_millis(5_000);

/// Servo angle for the locked position.
pub const LOCK_ANGLE: u16 = 30;
/// Servo angle for the unlocked position.
pub const UNLOCK_ANGLE: u16 = 210;
/// Full rotational range of the servo, in the same units as the angles.
pub const SERVO_FULL_SCALE: u16 = 240;

/// Errors reported by [`LockboxConfig::validate`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum ConfigError {
    #[error("short press threshold must be non-zero")]
    ZeroShortThreshold,
    #[error("idle reset ({idle_ms} ms) must exceed the short press threshold ({short_ms} ms)")]
    IdleResetTooShort { idle_ms: u64, short_ms: u64 },
    #[error("glitch filter ({min_ms} ms) must stay below the short press threshold ({short_ms} ms)")]
    MinPressNotBelowShortMax { min_ms: u64, short_ms: u64 },
    #[error("failure pattern needs at least one pulse")]
    NoFailurePulses,
    #[error("blink phase must be non-zero")]
    ZeroBlinkPhase,
    #[error("relock hold must be non-zero")]
    ZeroRelockHold,
    #[error("servo angle {angle} outside 0..={full_scale}")]
    AngleOutOfRange { angle: u16, full_scale: u16 },
    #[error("lock and unlock angles are identical ({0})")]
    IndistinctPositions(u16),
}

/// Whether the button is sampled while an actuation window is open.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum InputPolicy {
    /// Ignore the button during the unlock settle and failure blink windows.
    #[default]
    SuspendDuringActuation,
    /// Keep sampling; actuation windows only affect outputs.
    SampleContinuously,
}

/// What happens after a successful unlock.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum RelockPolicy {
    /// Stay unlocked until a rejected code relocks the box.
    #[default]
    Remain,
    /// Relock automatically once the hold interval has elapsed.
    After(Duration),
}

/// Button timing thresholds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct InputConfig {
    pub polarity: ButtonPolarity,
    pub short_max: Duration,
    pub idle_reset: Duration,
    /// Presses shorter than this are dropped; zero disables the filter.
    pub min_press: Duration,
}

impl InputConfig {
    pub const REFERENCE: Self = Self {
        polarity: ButtonPolarity::ActiveLow,
        short_max: SHORT_PRESS_MAX,
        idle_reset: IDLE_RESET,
        min_press: Duration::ZERO,
    };
}

/// Indicator and actuator timings.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ActuationConfig {
    pub unlock_settle: Duration,
    pub blink_phase: Duration,
    pub failure_pulses: u8,
}

impl ActuationConfig {
    pub const REFERENCE: Self = Self {
        unlock_settle: UNLOCK_SETTLE,
        blink_phase: BLINK_PHASE,
        failure_pulses: FAILURE_PULSES,
    };
}

/// Calibrated servo angles for the two lock positions.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ServoPositions {
    pub lock: u16,
    pub unlock: u16,
    pub full_scale: u16,
}

impl ServoPositions {
    pub const REFERENCE: Self = Self {
        lock: LOCK_ANGLE,
        unlock: UNLOCK_ANGLE,
        full_scale: SERVO_FULL_SCALE,
    };
}

/// Complete controller configuration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LockboxConfig {
    pub input: InputConfig,
    pub actuation: ActuationConfig,
    pub servo: ServoPositions,
    pub input_policy: InputPolicy,
    pub relock: RelockPolicy,
}

impl LockboxConfig {
    /// Values used by the deployed box.
    pub const REFERENCE: Self = Self {
        input: InputConfig::REFERENCE,
        actuation: ActuationConfig::REFERENCE,
        servo: ServoPositions::REFERENCE,
        input_policy: InputPolicy::SuspendDuringActuation,
        relock: RelockPolicy::Remain,
    };

    #[must_use]
    pub const fn with_short_max(mut self, short_max: Duration) -> Self {
        self.input.short_max = short_max;
        self
    }

    #[must_use]
    pub const fn with_idle_reset(mut self, idle_reset: Duration) -> Self {
        self.input.idle_reset = idle_reset;
        self
    }

    #[must_use]
    pub const fn with_min_press(mut self, min_press: Duration) -> Self {
        self.input.min_press = min_press;
        self
    }

    #[must_use]
    pub const fn with_polarity(mut self, polarity: ButtonPolarity) -> Self {
        self.input.polarity = polarity;
        self
    }

    #[must_use]
    pub const fn with_input_policy(mut self, policy: InputPolicy) -> Self {
        self.input_policy = policy;
        self
    }

    #[must_use]
    pub const fn with_relock(mut self, relock: RelockPolicy) -> Self {
        self.relock = relock;
        self
    }

    #[must_use]
    pub const fn with_servo(mut self, servo: ServoPositions) -> Self {
        self.servo = servo;
        self
    }

    /// Checks the configuration for values the controller cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let input = &self.input;
        if input.short_max.is_zero() {
            return Err(ConfigError::ZeroShortThreshold);
        }
        if input.idle_reset <= input.short_max {
            return Err(ConfigError::IdleResetTooShort {
                idle_ms: duration_millis(input.idle_reset),
                short_ms: duration_millis(input.short_max),
            });
        }
        if !input.min_press.is_zero() && input.min_press >= input.short_max {
            return Err(ConfigError::MinPressNotBelowShortMax {
                min_ms: duration_millis(input.min_press),
                short_ms: duration_millis(input.short_max),
            });
        }

        let actuation = &self.actuation;
        if actuation.failure_pulses == 0 {
            return Err(ConfigError::NoFailurePulses);
        }
        if actuation.blink_phase.is_zero() {
            return Err(ConfigError::ZeroBlinkPhase);
        }

        if let RelockPolicy::After(hold) = self.relock
            && hold.is_zero()
        {
            return Err(ConfigError::ZeroRelockHold);
        }

        let servo = &self.servo;
        for angle in [servo.lock, servo.unlock] {
            if angle > servo.full_scale {
                return Err(ConfigError::AngleOutOfRange {
                    angle,
                    full_scale: servo.full_scale,
                });
            }
        }
        if servo.lock == servo.unlock {
            return Err(ConfigError::IndistinctPositions(servo.lock));
        }

        Ok(())
    }
}

impl Default for LockboxConfig {
    fn default() -> Self {
        Self::REFERENCE
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
