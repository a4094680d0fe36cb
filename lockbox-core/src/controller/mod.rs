//! Lock controller and the per-tick code-entry loop.
//!
//! [`Lockbox`] owns every piece of mutable state: the button edge detector, the
//! entry buffer, the lock state, pending actuation deadlines and the telemetry
//! ring. Hardware is reached only through the capability traits in
//! [`crate::actuation`], so the same controller runs on the MCU, in the
//! emulator, and under test with recording fakes.

use core::time::Duration;

use crate::actuation::{
    IndicatorLevel, LockActuator, LockPosition, NoopActuator, NoopIndicator, NoopPublisher,
    StatusIndicator, StatusPublisher,
};
use crate::clock::MonotonicInstant;
use crate::code::{CODE_LEN, CodeBuffer, SecretCode, matches};
use crate::config::{ConfigError, InputPolicy, LockboxConfig, RelockPolicy};
use crate::input::{ButtonEdge, ButtonLevel, ButtonSampler, PressClassifier, Symbol};
use crate::telemetry::{TelemetryEventKind, TelemetryPayload, TelemetryRecorder};

pub mod schedule;

pub use schedule::{ActuationSchedule, ActuationWindow, ScheduledAction};

/// Externally visible lock status.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum LockState {
    #[default]
    Locked,
    Unlocked,
}

impl LockState {
    /// Literal published to status observers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LockState::Locked => "LOCKED",
            LockState::Unlocked => "UNLOCKED",
        }
    }

    #[must_use]
    pub const fn is_locked(self) -> bool {
        matches!(self, LockState::Locked)
    }
}

/// Outcome of evaluating a full buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    Accepted,
    Rejected,
}

/// Input-side result of a single [`Lockbox::tick`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EntryEvent {
    /// A release produced a symbol; `entered` symbols are now buffered.
    SymbolAccepted { symbol: Symbol, entered: usize },
    /// The buffer filled and was evaluated, then cleared.
    Evaluated(Verdict),
    /// A partial entry sat idle too long and was discarded. Takes precedence
    /// over [`EntryEvent::PressFiltered`] on the same tick.
    Abandoned { discarded: usize },
    /// A release shorter than the configured minimum was dropped.
    PressFiltered { held_for: Duration },
}

/// Single-button code lock.
pub struct Lockbox<
    I,
    A = NoopActuator,
    L = NoopIndicator,
    P = NoopPublisher,
    const N: usize = CODE_LEN,
> where
    I: MonotonicInstant,
{
    config: LockboxConfig,
    secret: SecretCode<N>,
    classifier: PressClassifier,
    sampler: ButtonSampler<I>,
    buffer: CodeBuffer<I, N>,
    attempt_started_at: Option<I>,
    state: LockState,
    schedule: ActuationSchedule<I>,
    telemetry: TelemetryRecorder<I>,
    actuator: A,
    indicator: L,
    publisher: P,
}

impl<I, const N: usize> Lockbox<I, NoopActuator, NoopIndicator, NoopPublisher, N>
where
    I: MonotonicInstant,
{
    /// Builds a controller with no hardware attached.
    pub fn new(config: LockboxConfig, secret: SecretCode<N>) -> Result<Self, ConfigError> {
        Self::with_components(config, secret, NoopActuator, NoopIndicator, NoopPublisher)
    }
}

impl<I, A, L, P, const N: usize> Lockbox<I, A, L, P, N>
where
    I: MonotonicInstant,
    A: LockActuator,
    L: StatusIndicator,
    P: StatusPublisher,
{
    /// Builds a controller around the supplied hardware.
    ///
    /// The configuration is validated first. The actuator is then driven to
    /// the lock position, the indicator switched off and `LOCKED` published,
    /// so observers see a correct status before the first tick.
    pub fn with_components(
        config: LockboxConfig,
        secret: SecretCode<N>,
        mut actuator: A,
        mut indicator: L,
        mut publisher: P,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        actuator.move_to(LockPosition::Lock);
        indicator.set(IndicatorLevel::Off);
        publisher.publish(LockState::Locked);

        Ok(Self {
            config,
            secret,
            classifier: PressClassifier::new(config.input.short_max),
            sampler: ButtonSampler::new(),
            buffer: CodeBuffer::new(),
            attempt_started_at: None,
            state: LockState::Locked,
            schedule: ActuationSchedule::new(config.actuation),
            telemetry: TelemetryRecorder::new(),
            actuator,
            indicator,
            publisher,
        })
    }

    /// Feeds the raw electrical level, translated through the configured polarity.
    pub fn tick_level(&mut self, now: I, level: ButtonLevel) -> Option<EntryEvent> {
        let pressed = self.config.input.polarity.is_pressed(level);
        self.tick(now, pressed)
    }

    /// Runs one iteration of the control loop with the logical button reading.
    ///
    /// When an idle timeout lands on the same tick as a filtered release,
    /// [`EntryEvent::Abandoned`] is returned; both are still recorded in the
    /// telemetry ring.
    pub fn tick(&mut self, now: I, pressed: bool) -> Option<EntryEvent> {
        self.advance_schedule(now);

        if self.config.input_policy == InputPolicy::SuspendDuringActuation
            && self.schedule.is_busy()
        {
            return None;
        }

        let mut outcome = match self.sampler.sample(pressed, now) {
            Some(ButtonEdge::Released { held_for, .. }) => Some(self.handle_release(held_for, now)),
            _ => None,
        };

        if !matches!(outcome, Some(EntryEvent::Evaluated(_)))
            && self.buffer.is_idle_timed_out(now, self.config.input.idle_reset)
        {
            let discarded = self.buffer.len();
            self.telemetry.record_attempt(
                TelemetryEventKind::EntryAbandoned,
                discarded,
                self.attempt_started_at,
                now,
            );
            self.clear_attempt();
            outcome = Some(EntryEvent::Abandoned { discarded });
        }

        outcome
    }

    fn handle_release(&mut self, held_for: Duration, now: I) -> EntryEvent {
        let min_press = self.config.input.min_press;
        if !min_press.is_zero() && held_for < min_press {
            self.telemetry
                .record_filtered(held_for, self.buffer.len(), now);
            return EntryEvent::PressFiltered { held_for };
        }

        let symbol = self.classifier.classify(held_for);
        if self.buffer.is_empty() {
            self.attempt_started_at = Some(now);
        }
        let appended = self.buffer.append(symbol, now);
        self.telemetry
            .record_symbol(symbol, held_for, self.buffer.len(), now);

        if appended.became_full() {
            EntryEvent::Evaluated(self.evaluate(now))
        } else {
            EntryEvent::SymbolAccepted {
                symbol,
                entered: self.buffer.len(),
            }
        }
    }

    fn evaluate(&mut self, now: I) -> Verdict {
        let verdict = if matches(self.buffer.as_slice(), &self.secret) {
            Verdict::Accepted
        } else {
            Verdict::Rejected
        };

        let event = match verdict {
            Verdict::Accepted => TelemetryEventKind::CodeAccepted,
            Verdict::Rejected => TelemetryEventKind::CodeRejected,
        };
        self.telemetry
            .record_attempt(event, self.buffer.len(), self.attempt_started_at, now);

        match verdict {
            Verdict::Accepted => self.unlock(now),
            Verdict::Rejected => self.reject(now),
        }

        self.clear_attempt();
        verdict
    }

    fn unlock(&mut self, now: I) {
        self.set_state(LockState::Unlocked, now);
        self.move_actuator(LockPosition::Unlock, now);
        self.indicator.set(IndicatorLevel::On);

        let hold = match self.config.relock {
            RelockPolicy::Remain => None,
            RelockPolicy::After(hold) => Some(hold),
        };
        self.schedule.begin_unlock(now, hold);
    }

    fn reject(&mut self, now: I) {
        self.set_state(LockState::Locked, now);
        self.move_actuator(LockPosition::Lock, now);
        self.indicator.set(IndicatorLevel::On);
        self.schedule.begin_failure_blink(now);
    }

    fn relock(&mut self, now: I) {
        self.telemetry
            .record(TelemetryEventKind::Relocked, TelemetryPayload::None, now);
        self.move_actuator(LockPosition::Lock, now);
        self.indicator.set(IndicatorLevel::Off);
        self.set_state(LockState::Locked, now);
    }

    fn advance_schedule(&mut self, now: I) {
        while let Some(action) = self.schedule.poll(now) {
            match action {
                ScheduledAction::Indicator(level) => self.indicator.set(level),
                ScheduledAction::Relock => self.relock(now),
            }
        }
    }

    fn set_state(&mut self, state: LockState, now: I) {
        self.state = state;
        self.publisher.publish(state);
        self.telemetry.record(
            TelemetryEventKind::StatusPublished(state),
            TelemetryPayload::None,
            now,
        );
    }

    fn move_actuator(&mut self, position: LockPosition, now: I) {
        self.actuator.move_to(position);
        self.telemetry.record(
            TelemetryEventKind::ActuatorMoved(position),
            TelemetryPayload::None,
            now,
        );
    }

    fn clear_attempt(&mut self) {
        self.buffer.reset();
        self.attempt_started_at = None;
    }

    pub const fn state(&self) -> LockState {
        self.state
    }

    pub const fn config(&self) -> &LockboxConfig {
        &self.config
    }

    /// Symbols entered in the current attempt.
    pub const fn buffer(&self) -> &CodeBuffer<I, N> {
        &self.buffer
    }

    /// Returns `true` while a settle or failure-blink window is open.
    pub const fn is_actuating(&self) -> bool {
        self.schedule.is_busy()
    }

    /// Settle or blink window currently open.
    pub const fn actuation_window(&self) -> ActuationWindow<I> {
        self.schedule.window()
    }

    /// Pending automatic relock deadline, if one is armed.
    pub const fn relock_deadline(&self) -> Option<I> {
        self.schedule.relock_at()
    }

    /// Returns `true` while the button is held down.
    pub const fn is_pressed(&self) -> bool {
        self.sampler.is_pressed()
    }

    pub const fn telemetry(&self) -> &TelemetryRecorder<I> {
        &self.telemetry
    }

    pub const fn actuator(&self) -> &A {
        &self.actuator
    }

    pub const fn indicator(&self) -> &L {
        &self.indicator
    }

    pub const fn publisher(&self) -> &P {
        &self.publisher
    }

}
