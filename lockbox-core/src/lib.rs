#![no_std]

#[cfg(test)]
extern crate std;

// Shared logic for the lockbox controller.
//
// This crate stays portable across MCU firmware and host tooling by avoiding the
// Rust standard library. Hardware lives behind the traits in `actuation`, time
// behind `clock::MonotonicInstant`.

pub mod actuation;
pub mod clock;
pub mod code;
pub mod config;
pub mod controller;
pub mod input;
pub mod telemetry;

pub use actuation::{IndicatorLevel, LockActuator, LockPosition, StatusIndicator, StatusPublisher};
pub use clock::{Millis, MonotonicInstant};
pub use code::{AppendOutcome, CodeBuffer, CodeError, SecretCode, matches};
pub use config::{ConfigError, LockboxConfig};
pub use controller::{EntryEvent, LockState, Lockbox, Verdict};
pub use input::{ButtonLevel, ButtonPolarity, ButtonSampler, PressClassifier, Symbol, classify};
