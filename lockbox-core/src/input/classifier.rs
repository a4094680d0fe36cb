//! Press duration classification.

use core::fmt;
use core::time::Duration;

use crate::code::CodeError;
use crate::config::SHORT_PRESS_MAX;

/// Classified press type.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Symbol {
    Short,
    Long,
}

impl Symbol {
    /// Single-character rendering used by consoles and logs.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Symbol::Short => 'S',
            Symbol::Long => 'L',
        }
    }

    /// Parses `S`/`L` (case-insensitive); `.` and `-` are accepted as Morse-style aliases.
    pub const fn from_char(value: char) -> Result<Self, CodeError> {
        match value {
            'S' | 's' | '.' => Ok(Symbol::Short),
            'L' | 'l' | '-' => Ok(Symbol::Long),
            other => Err(CodeError::UnknownSymbol(other)),
        }
    }

    /// Compact discriminant used by the constant-time matcher.
    #[must_use]
    pub const fn to_raw(self) -> u8 {
        match self {
            Symbol::Short => 0,
            Symbol::Long => 1,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Short => f.write_str("short"),
            Symbol::Long => f.write_str("long"),
        }
    }
}

/// Classifies a press using the reference threshold.
#[must_use]
pub fn classify(duration: Duration) -> Symbol {
    PressClassifier::REFERENCE.classify(duration)
}

/// Maps press durations to symbols with an inclusive short-side threshold.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PressClassifier {
    short_max: Duration,
}

impl PressClassifier {
    /// Classifier using [`SHORT_PRESS_MAX`].
    pub const REFERENCE: Self = Self::new(SHORT_PRESS_MAX);

    /// Creates a classifier treating presses up to `short_max` as short.
    #[must_use]
    pub const fn new(short_max: Duration) -> Self {
        Self { short_max }
    }

    #[must_use]
    pub fn classify(&self, duration: Duration) -> Symbol {
        if duration <= self.short_max {
            Symbol::Short
        } else {
            Symbol::Long
        }
    }
}

impl Default for PressClassifier {
    fn default() -> Self {
        Self::REFERENCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, Symbol::Short)]
    #[case(1, Symbol::Short)]
    #[case(399, Symbol::Short)]
    #[case(400, Symbol::Short)]
    #[case(401, Symbol::Long)]
    #[case(5_000, Symbol::Long)]
    fn reference_threshold_is_inclusive_on_short_side(#[case] millis: u64, #[case] expected: Symbol) {
        assert_eq!(classify(Duration::from_millis(millis)), expected);
    }

    #[test]
    fn sub_millisecond_overrun_counts_as_long() {
        let just_over = SHORT_PRESS_MAX + Duration::from_micros(1);
        assert_eq!(classify(just_over), Symbol::Long);
    }

    #[test]
    fn custom_threshold_moves_boundary() {
        let classifier = PressClassifier::new(Duration::from_millis(250));
        assert_eq!(classifier.classify(Duration::from_millis(250)), Symbol::Short);
        assert_eq!(classifier.classify(Duration::from_millis(300)), Symbol::Long);
    }

    #[rstest]
    #[case('S', Symbol::Short)]
    #[case('s', Symbol::Short)]
    #[case('.', Symbol::Short)]
    #[case('L', Symbol::Long)]
    #[case('-', Symbol::Long)]
    fn parses_symbol_characters(#[case] input: char, #[case] expected: Symbol) {
        assert_eq!(Symbol::from_char(input), Ok(expected));
    }

    #[test]
    fn rejects_unknown_symbol_character() {
        assert_eq!(Symbol::from_char('x'), Err(CodeError::UnknownSymbol('x')));
    }
}
