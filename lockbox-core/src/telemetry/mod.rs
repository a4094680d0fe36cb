//! Telemetry event catalog and ring buffer shared by firmware and host targets.
//!
//! The controller never logs directly. Each observable step is written to a
//! bounded [`TelemetryRecorder`]; firmware drains new records after every tick
//! and forwards them to `defmt`, the emulator forwards them to `tracing` and
//! its `events` command.

use core::{fmt, time::Duration};

use heapless::HistoryBuf;

use crate::actuation::LockPosition;
use crate::clock::MonotonicInstant;
use crate::controller::LockState;
use crate::input::Symbol;

/// Identifier assigned to each telemetry record.
pub type EventId = u32;

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 32;

/// Discriminated telemetry events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TelemetryEventKind {
    SymbolEntered(Symbol),
    PressFiltered,
    EntryAbandoned,
    CodeAccepted,
    CodeRejected,
    Relocked,
    ActuatorMoved(LockPosition),
    StatusPublished(LockState),
}

impl fmt::Display for TelemetryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEventKind::SymbolEntered(symbol) => write!(f, "symbol-entered {symbol}"),
            TelemetryEventKind::PressFiltered => f.write_str("press-filtered"),
            TelemetryEventKind::EntryAbandoned => f.write_str("entry-abandoned"),
            TelemetryEventKind::CodeAccepted => f.write_str("code-accepted"),
            TelemetryEventKind::CodeRejected => f.write_str("code-rejected"),
            TelemetryEventKind::Relocked => f.write_str("relocked"),
            TelemetryEventKind::ActuatorMoved(LockPosition::Lock) => f.write_str("actuator lock"),
            TelemetryEventKind::ActuatorMoved(LockPosition::Unlock) => {
                f.write_str("actuator unlock")
            }
            TelemetryEventKind::StatusPublished(state) => {
                write!(f, "status-published {}", state.as_str())
            }
        }
    }
}

/// Payloads carried alongside telemetry events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TelemetryPayload {
    None,
    /// Measured press behind a symbol or a filtered glitch.
    Press(PressTelemetry),
    /// Summary of a finished or abandoned entry attempt.
    Attempt(AttemptTelemetry),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PressTelemetry {
    pub held_for: Duration,
    /// Symbols buffered after this press was handled.
    pub buffered: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AttemptTelemetry {
    pub symbols: u8,
    /// Time from the first symbol to the verdict or abandonment.
    pub elapsed: Option<Duration>,
}

/// Telemetry record stored in the ring buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TelemetryRecord<I: Copy> {
    pub id: EventId,
    pub timestamp: I,
    pub event: TelemetryEventKind,
    pub details: TelemetryPayload,
}

/// Records telemetry events into a fixed-size ring buffer.
pub struct TelemetryRecorder<I: Copy, const CAPACITY: usize = TELEMETRY_RING_CAPACITY> {
    ring: HistoryBuf<TelemetryRecord<I>, CAPACITY>,
    next_event_id: EventId,
}

impl<I, const CAPACITY: usize> TelemetryRecorder<I, CAPACITY>
where
    I: MonotonicInstant,
{
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Records an arbitrary telemetry event with the supplied payload.
    pub fn record(
        &mut self,
        event: TelemetryEventKind,
        details: TelemetryPayload,
        timestamp: I,
    ) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(TelemetryRecord {
            id,
            timestamp,
            event,
            details,
        });

        id
    }

    /// Records a press that produced `symbol`.
    pub fn record_symbol(
        &mut self,
        symbol: Symbol,
        held_for: Duration,
        buffered: usize,
        timestamp: I,
    ) -> EventId {
        let payload = TelemetryPayload::Press(PressTelemetry {
            held_for,
            buffered: truncate_count(buffered),
        });
        self.record(TelemetryEventKind::SymbolEntered(symbol), payload, timestamp)
    }

    /// Records a press dropped by the glitch filter.
    pub fn record_filtered(&mut self, held_for: Duration, buffered: usize, timestamp: I) -> EventId {
        let payload = TelemetryPayload::Press(PressTelemetry {
            held_for,
            buffered: truncate_count(buffered),
        });
        self.record(TelemetryEventKind::PressFiltered, payload, timestamp)
    }

    /// Records the end of an entry attempt (verdict or abandonment).
    pub fn record_attempt(
        &mut self,
        event: TelemetryEventKind,
        symbols: usize,
        started_at: Option<I>,
        timestamp: I,
    ) -> EventId {
        let payload = TelemetryPayload::Attempt(AttemptTelemetry {
            symbols: truncate_count(symbols),
            elapsed: started_at.map(|start| timestamp.saturating_duration_since(start)),
        });
        self.record(event, payload, timestamp)
    }

    /// Returns the most recent record.
    pub fn latest(&self) -> Option<&TelemetryRecord<I>> {
        self.ring.recent()
    }

    /// Iterates over retained records, oldest first.
    pub fn oldest_first(&self) -> impl Iterator<Item = &TelemetryRecord<I>> + '_ {
        self.ring.oldest_ordered()
    }

    /// Iterates over records newer than `last_seen`, oldest first.
    ///
    /// Passing `None` yields everything retained. Records evicted from the
    /// ring before being drained are lost.
    pub fn since(
        &self,
        last_seen: Option<EventId>,
    ) -> impl Iterator<Item = &TelemetryRecord<I>> + '_ {
        let first_wanted = last_seen.map_or(0, |id| id.wrapping_add(1));
        let newest = self.next_event_id;
        self.ring.oldest_ordered().filter(move |record| {
            // Distance back from the next id keeps the comparison valid across wrap-around.
            newest.wrapping_sub(record.id) <= newest.wrapping_sub(first_wanted)
        })
    }

    /// Identifier that the next record will receive.
    pub const fn next_event_id(&self) -> EventId {
        self.next_event_id
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Counts retained records matching `event`.
    pub fn count(&self, event: TelemetryEventKind) -> usize {
        self.ring
            .oldest_ordered()
            .filter(|record| record.event == event)
            .count()
    }
}

impl<I, const CAPACITY: usize> Default for TelemetryRecorder<I, CAPACITY>
where
    I: MonotonicInstant,
{
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_count(count: usize) -> u8 {
    u8::try_from(count).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Millis;

    #[test]
    fn assigns_sequential_ids() {
        let mut recorder = TelemetryRecorder::<Millis>::new();
        let first = recorder.record_symbol(
            Symbol::Short,
            Duration::from_millis(120),
            1,
            Millis::from_millis(120),
        );
        let second = recorder.record(
            TelemetryEventKind::EntryAbandoned,
            TelemetryPayload::None,
            Millis::from_millis(6_000),
        );

        assert_eq!((first, second), (0, 1));
        assert_eq!(recorder.len(), 2);
        assert_eq!(
            recorder.latest().map(|record| record.event),
            Some(TelemetryEventKind::EntryAbandoned)
        );
    }

    #[test]
    fn attempt_payload_measures_elapsed_time() {
        let mut recorder = TelemetryRecorder::<Millis>::new();
        recorder.record_attempt(
            TelemetryEventKind::CodeRejected,
            4,
            Some(Millis::from_millis(1_000)),
            Millis::from_millis(3_250),
        );

        let record = recorder.latest().copied().expect("record missing");
        match record.details {
            TelemetryPayload::Attempt(details) => {
                assert_eq!(details.symbols, 4);
                assert_eq!(details.elapsed, Some(Duration::from_millis(2_250)));
            }
            other => panic!("expected attempt payload, got {other:?}"),
        }
    }

    #[test]
    fn since_skips_already_seen_records() {
        let mut recorder = TelemetryRecorder::<Millis>::new();
        for tick in 0..4 {
            recorder.record(
                TelemetryEventKind::PressFiltered,
                TelemetryPayload::None,
                Millis::from_millis(tick),
            );
        }

        assert_eq!(recorder.since(None).count(), 4);
        let fresh: heapless::Vec<EventId, 4> = recorder.since(Some(1)).map(|r| r.id).collect();
        assert_eq!(fresh.as_slice(), &[2, 3]);
        assert_eq!(recorder.since(Some(3)).count(), 0);
    }

    #[test]
    fn ring_keeps_only_latest_records() {
        let mut recorder = TelemetryRecorder::<Millis, 2>::new();
        for tick in 0..3 {
            recorder.record(
                TelemetryEventKind::Relocked,
                TelemetryPayload::None,
                Millis::from_millis(tick),
            );
        }

        let ids: heapless::Vec<EventId, 2> = recorder.oldest_first().map(|r| r.id).collect();
        assert_eq!(ids.as_slice(), &[1, 2]);
        assert_eq!(recorder.count(TelemetryEventKind::Relocked), 2);
    }

    #[test]
    fn renders_events_for_logs() {
        use std::string::ToString;

        assert_eq!(
            TelemetryEventKind::SymbolEntered(Symbol::Long).to_string(),
            "symbol-entered long"
        );
        assert_eq!(
            TelemetryEventKind::StatusPublished(LockState::Unlocked).to_string(),
            "status-published UNLOCKED"
        );
    }
}
