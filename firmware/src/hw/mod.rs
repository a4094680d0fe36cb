#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Board drivers behind the lock controller's capability traits.
//!
//! Pin map (STM32G0B1, Nucleo-style header):
//! - PA0: code button, active low, internal pull-up
//! - PA5: status LED, active high
//! - PA6: servo signal, TIM3 CH1 at 50 Hz

use lockbox_core::config::ServoPositions;
#[cfg(target_os = "none")]
use lockbox_core::{IndicatorLevel, LockActuator, LockPosition, StatusIndicator};

#[cfg(target_os = "none")]
use embassy_stm32::gpio::Output;
#[cfg(target_os = "none")]
use embassy_stm32::peripherals::TIM3;
#[cfg(target_os = "none")]
use embassy_stm32::timer::simple_pwm::SimplePwmChannel;

/// Servo frame length at 50 Hz.
pub const SERVO_PERIOD_US: u16 = 20_000;
/// Pulse width commanding angle zero.
pub const SERVO_MIN_PULSE_US: u16 = 500;
/// Pulse width commanding the full-scale angle.
pub const SERVO_MAX_PULSE_US: u16 = 2_500;

/// Pulse width for `angle` on a servo spanning `0..=full_scale`.
///
/// Angles past the end of the scale are clamped.
pub fn servo_pulse_us(angle: u16, full_scale: u16) -> u16 {
    if full_scale == 0 {
        return SERVO_MIN_PULSE_US;
    }
    let angle = u32::from(angle.min(full_scale));
    let span = u32::from(SERVO_MAX_PULSE_US - SERVO_MIN_PULSE_US);
    let offset = angle * span / u32::from(full_scale);
    SERVO_MIN_PULSE_US + u16::try_from(offset).unwrap_or(SERVO_MAX_PULSE_US - SERVO_MIN_PULSE_US)
}

/// Pulse width for the calibrated lock positions.
pub fn position_pulse_us(positions: &ServoPositions, angle: u16) -> u16 {
    servo_pulse_us(angle, positions.full_scale)
}

/// Hobby servo on a PWM channel.
#[cfg(target_os = "none")]
pub struct ServoActuator<'d> {
    channel: SimplePwmChannel<'d, TIM3>,
    positions: ServoPositions,
}

#[cfg(target_os = "none")]
impl<'d> ServoActuator<'d> {
    pub fn new(mut channel: SimplePwmChannel<'d, TIM3>, positions: ServoPositions) -> Self {
        channel.enable();
        Self { channel, positions }
    }
}

#[cfg(target_os = "none")]
impl LockActuator for ServoActuator<'_> {
    fn move_to(&mut self, position: LockPosition) {
        let pulse = position_pulse_us(&self.positions, position.angle(&self.positions));
        self.channel.set_duty_cycle_fraction(pulse, SERVO_PERIOD_US);
    }
}

/// Push-pull LED output.
#[cfg(target_os = "none")]
pub struct LedIndicator<'d> {
    pin: Output<'d>,
}

#[cfg(target_os = "none")]
impl<'d> LedIndicator<'d> {
    pub fn new(pin: Output<'d>) -> Self {
        Self { pin }
    }
}

#[cfg(target_os = "none")]
impl StatusIndicator for LedIndicator<'_> {
    fn set(&mut self, level: IndicatorLevel) {
        match level {
            IndicatorLevel::On => self.pin.set_high(),
            IndicatorLevel::Off => self.pin.set_low(),
        }
    }
}
