//! Button sampling and press classification.
//!
//! The sampler is fed one logical reading per tick and reports edges. Press
//! durations are measured between a press edge and the following release
//! edge; nothing else about the line is tracked.

use core::time::Duration;

use crate::clock::MonotonicInstant;

pub mod classifier;

pub use classifier::{PressClassifier, Symbol, classify};

/// Electrical level read from the button line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ButtonLevel {
    High,
    Low,
}

/// Button wiring convention.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum ButtonPolarity {
    /// Pressed pulls the line low against a pull-up.
    #[default]
    ActiveLow,
    ActiveHigh,
}

impl ButtonPolarity {
    /// Converts an electrical level into the logical pressed flag.
    #[must_use]
    pub const fn is_pressed(self, level: ButtonLevel) -> bool {
        matches!(
            (self, level),
            (ButtonPolarity::ActiveLow, ButtonLevel::Low)
                | (ButtonPolarity::ActiveHigh, ButtonLevel::High)
        )
    }
}

/// Edge reported by [`ButtonSampler::sample`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ButtonEdge<I> {
    Pressed { at: I },
    Released { at: I, held_for: Duration },
}

/// Previous logical reading plus the start of the press in progress.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ButtonEdgeState<I> {
    pub pressed: bool,
    pub press_started_at: Option<I>,
}

impl<I> ButtonEdgeState<I> {
    /// Released, no press in progress.
    pub const fn released() -> Self {
        Self {
            pressed: false,
            press_started_at: None,
        }
    }
}

impl<I> Default for ButtonEdgeState<I> {
    fn default() -> Self {
        Self::released()
    }
}

/// Edge detector for the single code-entry button.
#[derive(Clone, Debug)]
pub struct ButtonSampler<I> {
    state: ButtonEdgeState<I>,
}

impl<I: MonotonicInstant> ButtonSampler<I> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ButtonEdgeState::released(),
        }
    }

    /// Returns the persisted edge state.
    pub const fn state(&self) -> &ButtonEdgeState<I> {
        &self.state
    }

    /// Returns `true` while a press is in progress.
    pub const fn is_pressed(&self) -> bool {
        self.state.pressed
    }

    /// Feeds one reading and reports the edge it produced, if any.
    pub fn sample(&mut self, pressed: bool, now: I) -> Option<ButtonEdge<I>> {
        let previous = self.state.pressed;
        self.state.pressed = pressed;

        match (previous, pressed) {
            (false, true) => {
                self.state.press_started_at = Some(now);
                Some(ButtonEdge::Pressed { at: now })
            }
            (true, false) => {
                let started = self.state.press_started_at.take()?;
                Some(ButtonEdge::Released {
                    at: now,
                    held_for: now.saturating_duration_since(started),
                })
            }
            _ => None,
        }
    }
}

impl<I: MonotonicInstant> Default for ButtonSampler<I> {
    fn default() -> Self {
        Self::new()
    }
}
