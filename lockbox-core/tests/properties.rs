mod common;

use core::time::Duration;

use common::Harness;
use lockbox_core::code::{AppendOutcome, CODE_LEN, CodeBuffer, REFERENCE_SECRET};
use lockbox_core::config::SHORT_PRESS_MAX;
use lockbox_core::{EntryEvent, LockState, Millis, Symbol, Verdict, classify};
use proptest::prelude::*;

fn symbol() -> impl Strategy<Value = Symbol> {
    prop_oneof![Just(Symbol::Short), Just(Symbol::Long)]
}

fn press_for(symbol: Symbol) -> impl Strategy<Value = u64> {
    match symbol {
        Symbol::Short => 0_u64..=400,
        Symbol::Long => 401_u64..=3_000,
    }
}

proptest! {
    #[test]
    fn classify_splits_at_threshold(millis in 0_u64..20_000) {
        let expected = if Duration::from_millis(millis) <= SHORT_PRESS_MAX {
            Symbol::Short
        } else {
            Symbol::Long
        };
        prop_assert_eq!(classify(Duration::from_millis(millis)), expected);
    }

    #[test]
    fn buffer_never_exceeds_capacity(symbols in prop::collection::vec(symbol(), 0..16)) {
        let mut buffer = CodeBuffer::<Millis>::new();
        for (tick, symbol) in symbols.iter().enumerate() {
            let before = buffer.len();
            let outcome = buffer.append(*symbol, Millis::from_millis(tick as u64));
            prop_assert!(buffer.len() <= CODE_LEN);
            if before == CODE_LEN {
                prop_assert_eq!(outcome, AppendOutcome::Ignored);
                prop_assert_eq!(buffer.len(), CODE_LEN);
            }
        }
    }

    #[test]
    fn verdict_follows_symbol_equality(
        durations in prop::collection::vec(symbol(), CODE_LEN)
            .prop_flat_map(|symbols| {
                let presses: Vec<_> = symbols.iter().map(|symbol| press_for(*symbol)).collect();
                (Just(symbols), presses)
            }),
    ) {
        let (symbols, presses) = durations;
        let mut harness = Harness::reference();
        harness.enter(&presses, 200);

        let expected = if symbols.as_slice() == REFERENCE_SECRET.symbols() {
            Verdict::Accepted
        } else {
            Verdict::Rejected
        };
        prop_assert_eq!(harness.last_event(), Some(EntryEvent::Evaluated(expected)));
        prop_assert!(harness.lockbox.buffer().is_empty());

        let expected_state = match expected {
            Verdict::Accepted => LockState::Unlocked,
            Verdict::Rejected => LockState::Locked,
        };
        prop_assert_eq!(harness.state(), expected_state);
    }
}
