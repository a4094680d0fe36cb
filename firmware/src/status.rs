#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared lock status for the firmware target.
//!
//! The lock task is the only writer. Anything else (a debugger probe, a
//! future link to the outside) reads the cell without coordination and may
//! observe a value one tick stale.

use lockbox_core::{LockState, StatusPublisher};
use portable_atomic::{AtomicBool, Ordering};

/// `true` while the box is locked; the controller publishes `LOCKED` on boot.
static LOCKED: AtomicBool = AtomicBool::new(true);

/// Stores the latest published state.
pub fn record_state(state: LockState) {
    LOCKED.store(state.is_locked(), Ordering::Relaxed);
}

/// Returns the most recently published state.
pub fn current_state() -> LockState {
    if LOCKED.load(Ordering::Relaxed) {
        LockState::Locked
    } else {
        LockState::Unlocked
    }
}

/// Published status literal, `LOCKED` or `UNLOCKED`.
pub fn status_str() -> &'static str {
    current_state().as_str()
}

/// Publisher that writes into the shared status cell.
#[derive(Copy, Clone, Debug, Default)]
pub struct AtomicStatusPublisher;

impl StatusPublisher for AtomicStatusPublisher {
    fn publish(&mut self, state: LockState) {
        record_state(state);
        log_status(state);
    }
}

#[cfg(target_os = "none")]
fn log_status(state: LockState) {
    defmt::info!("status {}", state.as_str());
}

#[cfg(not(target_os = "none"))]
fn log_status(state: LockState) {
    println!("status {}", state.as_str());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publisher_updates_the_cell() {
        let mut publisher = AtomicStatusPublisher;

        publisher.publish(LockState::Unlocked);
        assert_eq!(current_state(), LockState::Unlocked);
        assert_eq!(status_str(), "UNLOCKED");

        publisher.publish(LockState::Locked);
        assert_eq!(status_str(), "LOCKED");
    }
}
