#![allow(dead_code)]

use lockbox_core::actuation::{
    IndicatorLevel, LockActuator, LockPosition, StatusIndicator, StatusPublisher,
};
use lockbox_core::code::REFERENCE_SECRET;
use lockbox_core::config::LockboxConfig;
use lockbox_core::{EntryEvent, LockState, Lockbox, Millis};

/// Sample period used by the firmware tick task.
pub const TICK_MS: u64 = 5;

#[derive(Debug, Default)]
pub struct RecordingActuator {
    pub moves: Vec<LockPosition>,
}

impl LockActuator for RecordingActuator {
    fn move_to(&mut self, position: LockPosition) {
        self.moves.push(position);
    }
}

#[derive(Debug, Default)]
pub struct RecordingIndicator {
    pub levels: Vec<IndicatorLevel>,
}

impl RecordingIndicator {
    /// Number of off-to-on transitions seen so far.
    pub fn pulses(&self) -> usize {
        let mut lit = false;
        let mut pulses = 0;
        for level in &self.levels {
            if level.is_on() && !lit {
                pulses += 1;
            }
            lit = level.is_on();
        }
        pulses
    }

    pub fn is_on(&self) -> bool {
        self.levels.last().is_some_and(|level| level.is_on())
    }
}

impl StatusIndicator for RecordingIndicator {
    fn set(&mut self, level: IndicatorLevel) {
        self.levels.push(level);
    }
}

#[derive(Debug, Default)]
pub struct RecordingPublisher {
    pub published: Vec<&'static str>,
}

impl RecordingPublisher {
    pub fn last(&self) -> Option<&'static str> {
        self.published.last().copied()
    }
}

impl StatusPublisher for RecordingPublisher {
    fn publish(&mut self, state: LockState) {
        self.published.push(state.as_str());
    }
}

pub type TestLockbox = Lockbox<Millis, RecordingActuator, RecordingIndicator, RecordingPublisher>;

/// Drives a lockbox with a virtual clock sampled every [`TICK_MS`].
pub struct Harness {
    pub lockbox: TestLockbox,
    pub events: Vec<EntryEvent>,
    now: u64,
}

impl Harness {
    pub fn new(config: LockboxConfig) -> Self {
        let lockbox = Lockbox::with_components(
            config,
            REFERENCE_SECRET,
            RecordingActuator::default(),
            RecordingIndicator::default(),
            RecordingPublisher::default(),
        )
        .expect("test config should validate");

        Self {
            lockbox,
            events: Vec::new(),
            now: 0,
        }
    }

    pub fn reference() -> Self {
        Self::new(LockboxConfig::REFERENCE)
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Holds the button for exactly `held_ms`, then releases it.
    pub fn press(&mut self, held_ms: u64) {
        self.step(true);
        let release_at = self.now + held_ms;
        while self.now + TICK_MS < release_at {
            self.now += TICK_MS;
            self.step(true);
        }
        self.now = release_at;
        self.step(false);
    }

    /// Leaves the button released for `ms`, ticking throughout.
    pub fn idle(&mut self, ms: u64) {
        let until = self.now + ms;
        while self.now + TICK_MS <= until {
            self.now += TICK_MS;
            self.step(false);
        }
        if self.now < until {
            self.now = until;
            self.step(false);
        }
    }

    /// Enters one press per duration, separated by `gap_ms` of idle time.
    pub fn enter(&mut self, durations: &[u64], gap_ms: u64) {
        for (index, held) in durations.iter().enumerate() {
            if index > 0 {
                self.idle(gap_ms);
            }
            self.press(*held);
        }
    }

    pub fn last_event(&self) -> Option<EntryEvent> {
        self.events.last().copied()
    }

    pub fn state(&self) -> LockState {
        self.lockbox.state()
    }

    pub fn actuator(&self) -> &RecordingActuator {
        self.lockbox.actuator()
    }

    pub fn indicator(&self) -> &RecordingIndicator {
        self.lockbox.indicator()
    }

    pub fn publisher(&self) -> &RecordingPublisher {
        self.lockbox.publisher()
    }

    fn step(&mut self, pressed: bool) {
        if let Some(event) = self.lockbox.tick(Millis::from_millis(self.now), pressed) {
            self.events.push(event);
        }
    }
}
