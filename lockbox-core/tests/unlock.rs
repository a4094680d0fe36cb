mod common;

use common::Harness;
use lockbox_core::actuation::{IndicatorLevel, LockPosition};
use lockbox_core::telemetry::TelemetryEventKind;
use lockbox_core::{EntryEvent, LockState, Symbol, Verdict};

#[test]
fn construction_publishes_locked_and_parks_actuator() {
    let harness = Harness::reference();

    assert_eq!(harness.state(), LockState::Locked);
    assert_eq!(harness.publisher().published, ["LOCKED"]);
    assert_eq!(harness.actuator().moves, [LockPosition::Lock]);
    assert_eq!(harness.indicator().levels, [IndicatorLevel::Off]);
}

#[test]
fn reference_sequence_unlocks() {
    let mut harness = Harness::reference();
    harness.enter(&[100, 600, 900, 150], 200);

    assert_eq!(
        harness.events,
        [
            EntryEvent::SymbolAccepted {
                symbol: Symbol::Short,
                entered: 1,
            },
            EntryEvent::SymbolAccepted {
                symbol: Symbol::Long,
                entered: 2,
            },
            EntryEvent::SymbolAccepted {
                symbol: Symbol::Long,
                entered: 3,
            },
            EntryEvent::Evaluated(Verdict::Accepted),
        ]
    );
    assert_eq!(harness.state(), LockState::Unlocked);
    assert_eq!(harness.publisher().last(), Some("UNLOCKED"));
    assert_eq!(harness.actuator().moves.last(), Some(&LockPosition::Unlock));
    assert!(harness.indicator().is_on());
    assert!(harness.lockbox.buffer().is_empty());
}

#[test]
fn short_boundary_press_counts_as_short() {
    let mut harness = Harness::reference();
    harness.enter(&[400, 401, 401, 400], 200);

    assert_eq!(harness.last_event(), Some(EntryEvent::Evaluated(Verdict::Accepted)));
    assert_eq!(harness.state(), LockState::Unlocked);
}

#[test]
fn unlocked_box_stays_open_without_relock_policy() {
    let mut harness = Harness::reference();
    harness.enter(&[100, 600, 900, 150], 200);
    harness.idle(60_000);

    assert_eq!(harness.state(), LockState::Unlocked);
    assert_eq!(harness.publisher().published, ["LOCKED", "UNLOCKED"]);
    assert_eq!(harness.lockbox.relock_deadline(), None);
}

#[test]
fn correct_code_while_unlocked_reasserts_unlock() {
    let mut harness = Harness::reference();
    harness.enter(&[100, 600, 900, 150], 200);
    harness.idle(500);
    harness.enter(&[100, 600, 900, 150], 200);

    assert_eq!(harness.state(), LockState::Unlocked);
    assert_eq!(
        harness.publisher().published,
        ["LOCKED", "UNLOCKED", "UNLOCKED"]
    );
    assert_eq!(
        harness.actuator().moves,
        [LockPosition::Lock, LockPosition::Unlock, LockPosition::Unlock]
    );
}

#[test]
fn telemetry_traces_the_attempt() {
    let mut harness = Harness::reference();
    harness.enter(&[100, 600, 900, 150], 200);

    let telemetry = harness.lockbox.telemetry();
    assert_eq!(telemetry.count(TelemetryEventKind::SymbolEntered(Symbol::Short)), 2);
    assert_eq!(telemetry.count(TelemetryEventKind::SymbolEntered(Symbol::Long)), 2);
    assert_eq!(telemetry.count(TelemetryEventKind::CodeAccepted), 1);
    assert_eq!(
        telemetry.count(TelemetryEventKind::StatusPublished(LockState::Unlocked)),
        1
    );
    assert_eq!(
        telemetry.count(TelemetryEventKind::ActuatorMoved(LockPosition::Unlock)),
        1
    );
}
