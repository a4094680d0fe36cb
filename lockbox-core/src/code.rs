//! Secret code, entry buffer, and matcher.

use core::time::Duration;

use heapless::Vec;
use subtle::{Choice, ConstantTimeEq};
use thiserror::Error;

use crate::clock::MonotonicInstant;
use crate::input::Symbol;

/// Number of symbols in a code.
pub const CODE_LEN: usize = 4;

/// Secret used by the deployed box: short, long, long, short.
pub const REFERENCE_SECRET: SecretCode = SecretCode::new([
    Symbol::Short,
    Symbol::Long,
    Symbol::Long,
    Symbol::Short,
]);

/// Errors raised while building codes from external input.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum CodeError {
    #[error("expected {expected} symbols, found {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("unknown symbol `{0}` (use S or L)")]
    UnknownSymbol(char),
}

/// Fixed sequence that unlocks the box.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct SecretCode<const N: usize = CODE_LEN> {
    symbols: [Symbol; N],
}

impl<const N: usize> SecretCode<N> {
    #[must_use]
    pub const fn new(symbols: [Symbol; N]) -> Self {
        Self { symbols }
    }

    /// Builds a code from a slice that must hold exactly `N` symbols.
    pub fn from_symbols(symbols: &[Symbol]) -> Result<Self, CodeError> {
        let symbols: [Symbol; N] = symbols.try_into().map_err(|_| CodeError::LengthMismatch {
            expected: N,
            found: symbols.len(),
        })?;
        Ok(Self { symbols })
    }

    /// Parses an `S`/`L` pattern such as `"SLLS"`.
    pub fn parse(pattern: &str) -> Result<Self, CodeError> {
        let mut symbols: Vec<Symbol, N> = Vec::new();
        let mut found = 0;
        for ch in pattern.chars().filter(|ch| !ch.is_whitespace()) {
            let symbol = Symbol::from_char(ch)?;
            found += 1;
            // Keep counting past capacity so the error reports the real length.
            let _ = symbols.push(symbol);
        }
        if found != N {
            return Err(CodeError::LengthMismatch { expected: N, found });
        }
        Self::from_symbols(&symbols)
    }

    #[must_use]
    pub const fn symbols(&self) -> &[Symbol; N] {
        &self.symbols
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}

impl<const N: usize> core::fmt::Debug for SecretCode<N> {
    // The secret never appears in logs.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SecretCode(<{N} symbols>)")
    }
}

/// Result of [`CodeBuffer::append`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AppendOutcome {
    /// Symbol stored; more are needed.
    Pending,
    /// Symbol stored and the buffer is now full.
    Filled,
    /// Buffer was already full; nothing changed.
    Ignored,
}

impl AppendOutcome {
    /// Returns `true` when this append filled the buffer.
    #[must_use]
    pub const fn became_full(self) -> bool {
        matches!(self, AppendOutcome::Filled)
    }
}

/// Symbols entered so far in the current attempt.
#[derive(Clone, Debug)]
pub struct CodeBuffer<I, const N: usize = CODE_LEN> {
    entered: Vec<Symbol, N>,
    last_event_at: Option<I>,
}

impl<I: MonotonicInstant, const N: usize> CodeBuffer<I, N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entered: Vec::new(),
            last_event_at: None,
        }
    }

    /// Appends `symbol` unless the buffer is already full.
    pub fn append(&mut self, symbol: Symbol, now: I) -> AppendOutcome {
        if self.entered.push(symbol).is_err() {
            return AppendOutcome::Ignored;
        }
        self.last_event_at = Some(now);

        if self.entered.is_full() {
            AppendOutcome::Filled
        } else {
            AppendOutcome::Pending
        }
    }

    /// Clears the buffer unconditionally.
    pub fn reset(&mut self) {
        self.entered.clear();
        self.last_event_at = None;
    }

    /// Returns `true` when a partial entry has sat idle longer than `idle_reset`.
    pub fn is_idle_timed_out(&self, now: I, idle_reset: Duration) -> bool {
        if self.entered.is_empty() {
            return false;
        }
        self.last_event_at
            .is_some_and(|last| now.saturating_duration_since(last) > idle_reset)
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.entered
    }

    pub fn len(&self) -> usize {
        self.entered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entered.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entered.is_full()
    }

    /// Timestamp of the most recent symbol, if any are buffered.
    pub fn last_event_at(&self) -> Option<I> {
        self.last_event_at
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<I: MonotonicInstant, const N: usize> Default for CodeBuffer<I, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Compares an entered sequence with the secret, element by element.
///
/// Every position is inspected regardless of earlier mismatches so the
/// comparison time does not depend on where the first wrong symbol sits.
#[must_use]
pub fn matches<const N: usize>(entered: &[Symbol], secret: &SecretCode<N>) -> bool {
    if entered.len() != N {
        return false;
    }

    let equal = entered
        .iter()
        .zip(secret.symbols())
        .fold(Choice::from(1), |acc, (lhs, rhs)| {
            acc & lhs.to_raw().ct_eq(&rhs.to_raw())
        });
    equal.into()
}
