//! Deadline-driven actuation windows.
//!
//! The unlock settle, the failure blink and the relock hold are deadlines
//! polled from the tick rather than pauses, so the loop keeps running. Whether
//! the button is sampled meanwhile is decided by
//! [`InputPolicy`](crate::config::InputPolicy).

use core::time::Duration;

use crate::actuation::IndicatorLevel;
use crate::clock::MonotonicInstant;
use crate::config::ActuationConfig;

/// Output-side window currently in progress.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActuationWindow<I> {
    Idle,
    /// Post-unlock pause while the mechanism travels.
    Settling { until: I },
    /// Failure pattern; `phase` counts completed on/off phases.
    Blinking { phase: u8, next_at: I },
}

/// Action the controller must apply when a deadline passes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScheduledAction {
    Indicator(IndicatorLevel),
    Relock,
}

/// Pending actuation deadlines.
#[derive(Clone, Debug)]
pub struct ActuationSchedule<I> {
    timing: ActuationConfig,
    window: ActuationWindow<I>,
    relock_at: Option<I>,
}

impl<I: MonotonicInstant> ActuationSchedule<I> {
    #[must_use]
    pub const fn new(timing: ActuationConfig) -> Self {
        Self {
            timing,
            window: ActuationWindow::Idle,
            relock_at: None,
        }
    }

    pub const fn window(&self) -> ActuationWindow<I> {
        self.window
    }

    /// Returns `true` while a settle or blink window is open.
    pub const fn is_busy(&self) -> bool {
        !matches!(self.window, ActuationWindow::Idle)
    }

    pub const fn relock_at(&self) -> Option<I> {
        self.relock_at
    }

    /// Opens the settle window and, when `hold` is given, arms the relock deadline.
    pub fn begin_unlock(&mut self, now: I, hold: Option<Duration>) {
        self.window = ActuationWindow::Settling {
            until: now + self.timing.unlock_settle,
        };
        self.relock_at = hold.map(|hold| now + hold);
    }

    /// Starts the failure pattern; the caller has already switched the indicator on.
    pub fn begin_failure_blink(&mut self, now: I) {
        self.window = ActuationWindow::Blinking {
            phase: 0,
            next_at: now + self.timing.blink_phase,
        };
        self.relock_at = None;
    }

    /// Returns the next action due at `now`, if any.
    ///
    /// Call repeatedly until it yields `None`; a late tick may have several
    /// deadlines to catch up on.
    pub fn poll(&mut self, now: I) -> Option<ScheduledAction> {
        match self.window {
            ActuationWindow::Idle => {}
            ActuationWindow::Settling { until } => {
                if now >= until {
                    self.window = ActuationWindow::Idle;
                }
            }
            ActuationWindow::Blinking { phase, next_at } => {
                if now >= next_at {
                    let phase = phase + 1;
                    if phase >= self.total_phases() {
                        self.window = ActuationWindow::Idle;
                    } else {
                        self.window = ActuationWindow::Blinking {
                            phase,
                            next_at: next_at + self.timing.blink_phase,
                        };
                        let level = if phase % 2 == 0 {
                            IndicatorLevel::On
                        } else {
                            IndicatorLevel::Off
                        };
                        return Some(ScheduledAction::Indicator(level));
                    }
                }
            }
        }

        match self.relock_at {
            Some(deadline) if now >= deadline => {
                self.relock_at = None;
                Some(ScheduledAction::Relock)
            }
            _ => None,
        }
    }

    fn total_phases(&self) -> u8 {
        self.timing.failure_pulses.saturating_mul(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Millis;

    fn at(millis: u64) -> Millis {
        Millis::from_millis(millis)
    }

    fn drain(
        schedule: &mut ActuationSchedule<Millis>,
        now: Millis,
    ) -> heapless::Vec<ScheduledAction, 8> {
        let mut actions = heapless::Vec::new();
        while let Some(action) = schedule.poll(now) {
            actions.push(action).expect("too many actions");
        }
        actions
    }

    #[test]
    fn settle_window_closes_after_deadline() {
        let mut schedule = ActuationSchedule::new(ActuationConfig::REFERENCE);
        schedule.begin_unlock(at(1_000), None);

        assert!(schedule.is_busy());
        assert!(drain(&mut schedule, at(1_299)).is_empty());
        assert!(schedule.is_busy());
        assert!(drain(&mut schedule, at(1_300)).is_empty());
        assert!(!schedule.is_busy());
        assert_eq!(schedule.relock_at(), None);
    }

    #[test]
    fn failure_blink_toggles_on_phase_boundaries() {
        let mut schedule = ActuationSchedule::new(ActuationConfig::REFERENCE);
        schedule.begin_failure_blink(at(0));

        let expected = [
            (100, IndicatorLevel::Off),
            (200, IndicatorLevel::On),
            (300, IndicatorLevel::Off),
            (400, IndicatorLevel::On),
            (500, IndicatorLevel::Off),
        ];
        for (millis, level) in expected {
            assert!(drain(&mut schedule, at(millis - 1)).is_empty());
            assert_eq!(
                drain(&mut schedule, at(millis)).as_slice(),
                &[ScheduledAction::Indicator(level)]
            );
        }

        assert!(schedule.is_busy());
        assert!(drain(&mut schedule, at(600)).is_empty());
        assert!(!schedule.is_busy());
    }

    #[test]
    fn late_poll_catches_up_in_order() {
        let mut schedule = ActuationSchedule::new(ActuationConfig::REFERENCE);
        schedule.begin_failure_blink(at(0));

        let actions = drain(&mut schedule, at(1_000));
        assert_eq!(actions.len(), 5);
        assert_eq!(
            actions.last(),
            Some(&ScheduledAction::Indicator(IndicatorLevel::Off))
        );
        assert!(!schedule.is_busy());
    }

    #[test]
    fn relock_fires_once_after_hold() {
        let mut schedule = ActuationSchedule::new(ActuationConfig::REFERENCE);
        schedule.begin_unlock(at(0), Some(Duration::from_millis(5_000)));

        assert!(drain(&mut schedule, at(4_999)).is_empty());
        assert_eq!(
            drain(&mut schedule, at(5_000)).as_slice(),
            &[ScheduledAction::Relock]
        );
        assert!(drain(&mut schedule, at(10_000)).is_empty());
    }

    #[test]
    fn failure_blink_disarms_relock() {
        let mut schedule = ActuationSchedule::new(ActuationConfig::REFERENCE);
        schedule.begin_unlock(at(0), Some(Duration::from_millis(5_000)));
        schedule.begin_failure_blink(at(1_000));

        assert_eq!(schedule.relock_at(), None);
        let actions = drain(&mut schedule, at(6_000));
        assert!(!actions.contains(&ScheduledAction::Relock));
    }
}
