//! Console grammar for the emulator.
//!
//! ```text
//! press <duration>      hold the button, then release
//! enter <S|L...>        press out a symbol sequence
//! wait <duration>       advance the virtual clock with the button released
//! status | events | help [topic] | exit
//! ```
//!
//! Durations take an `ms` or `s` suffix; bare numbers are milliseconds. The
//! virtual clock is stepped tick by tick, so one command may span at most
//! [`MAX_DURATION`].

use std::time::Duration;

use lockbox_core::{CodeError, Symbol};
use thiserror::Error;
use winnow::ascii::{alpha1, digit1, space0};
use winnow::combinator::{alt, eof, opt, terminated};
use winnow::ModalResult;
use winnow::prelude::*;

/// Longest `press` or `wait` accepted on one line.
pub const MAX_DURATION: Duration = Duration::from_secs(3_600);

/// Parsed console command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConsoleCommand<'a> {
    Press(Duration),
    Enter(Vec<Symbol>),
    Wait(Duration),
    Status,
    Events,
    Help(Option<&'a str>),
    Exit,
}

/// Console syntax errors.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{command}` expects {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("`{command}` takes no arguments")]
    UnexpectedArgument { command: &'static str },
    #[error("invalid duration `{0}` (use e.g. 150ms, 2s or 600)")]
    InvalidDuration(String),
    #[error("duration `{0}` exceeds the one hour limit")]
    DurationTooLong(String),
    #[error(transparent)]
    Symbol(#[from] CodeError),
}

/// Parses one console line.
pub fn parse(line: &str) -> Result<ConsoleCommand<'_>, CommandError> {
    let mut input = line.trim();
    let Ok(word) = command_word.parse_next(&mut input) else {
        return Err(CommandError::Unknown(line.trim().to_string()));
    };
    let rest = input.trim_end();

    match word.to_ascii_lowercase().as_str() {
        "press" => duration_argument("press", rest).map(ConsoleCommand::Press),
        "wait" => duration_argument("wait", rest).map(ConsoleCommand::Wait),
        "enter" => symbols_argument(rest).map(ConsoleCommand::Enter),
        "status" => no_argument("status", rest).map(|()| ConsoleCommand::Status),
        "events" => no_argument("events", rest).map(|()| ConsoleCommand::Events),
        "exit" | "quit" => no_argument("exit", rest).map(|()| ConsoleCommand::Exit),
        "help" => Ok(ConsoleCommand::Help((!rest.is_empty()).then_some(rest))),
        _ => Err(CommandError::Unknown(word.to_string())),
    }
}

fn command_word<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    terminated(alpha1, space0).parse_next(input)
}

/// Parses `150ms`, `2s` or a bare millisecond count.
pub fn duration(input: &mut &str) -> ModalResult<Duration> {
    let value: u64 = digit1.parse_to().parse_next(input)?;
    let unit = opt(alt(("ms", "s"))).parse_next(input)?;
    Ok(match unit {
        Some("s") => Duration::from_secs(value),
        _ => Duration::from_millis(value),
    })
}

fn duration_argument(command: &'static str, rest: &str) -> Result<Duration, CommandError> {
    if rest.is_empty() {
        return Err(CommandError::MissingArgument {
            command,
            expected: "a duration",
        });
    }
    let duration = terminated(duration, (space0, eof))
        .parse(rest)
        .map_err(|_| CommandError::InvalidDuration(rest.to_string()))?;
    if duration > MAX_DURATION {
        return Err(CommandError::DurationTooLong(rest.to_string()));
    }
    Ok(duration)
}

fn symbols_argument(rest: &str) -> Result<Vec<Symbol>, CommandError> {
    let symbols = rest
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .map(Symbol::from_char)
        .collect::<Result<Vec<_>, _>>()?;
    if symbols.is_empty() {
        return Err(CommandError::MissingArgument {
            command: "enter",
            expected: "a symbol sequence such as SLLS",
        });
    }
    Ok(symbols)
}

fn no_argument(command: &'static str, rest: &str) -> Result<(), CommandError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(CommandError::UnexpectedArgument { command })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("press 150ms", ConsoleCommand::Press(Duration::from_millis(150)))]
    #[case("press 2s", ConsoleCommand::Press(Duration::from_secs(2)))]
    #[case("PRESS 600", ConsoleCommand::Press(Duration::from_millis(600)))]
    #[case("wait 6s", ConsoleCommand::Wait(Duration::from_secs(6)))]
    #[case("wait 3600s", ConsoleCommand::Wait(MAX_DURATION))]
    #[case("  status  ", ConsoleCommand::Status)]
    #[case("events", ConsoleCommand::Events)]
    #[case("quit", ConsoleCommand::Exit)]
    #[case("help", ConsoleCommand::Help(None))]
    #[case("help enter", ConsoleCommand::Help(Some("enter")))]
    fn parses_commands(#[case] line: &str, #[case] expected: ConsoleCommand<'static>) {
        assert_eq!(parse(line), Ok(expected));
    }

    #[test]
    fn parses_symbol_sequences() {
        use Symbol::{Long, Short};

        assert_eq!(
            parse("enter SLLS"),
            Ok(ConsoleCommand::Enter(vec![Short, Long, Long, Short]))
        );
        assert_eq!(
            parse("enter s l . -"),
            Ok(ConsoleCommand::Enter(vec![Short, Long, Short, Long]))
        );
    }

    #[rstest]
    #[case("press", CommandError::MissingArgument { command: "press", expected: "a duration" })]
    #[case("press 10min", CommandError::InvalidDuration("10min".to_string()))]
    #[case("wait soon", CommandError::InvalidDuration("soon".to_string()))]
    #[case("wait 99999999999s", CommandError::DurationTooLong("99999999999s".to_string()))]
    #[case("press 3601s", CommandError::DurationTooLong("3601s".to_string()))]
    #[case("wait 99999999999999999999", CommandError::InvalidDuration("99999999999999999999".to_string()))]
    #[case("status now", CommandError::UnexpectedArgument { command: "status" })]
    #[case("unlock", CommandError::Unknown("unlock".to_string()))]
    #[case("123", CommandError::Unknown("123".to_string()))]
    #[case("enter SXL", CommandError::Symbol(CodeError::UnknownSymbol('X')))]
    fn reports_syntax_errors(#[case] line: &str, #[case] expected: CommandError) {
        assert_eq!(parse(line), Err(expected));
    }

    #[test]
    fn duration_parser_stops_after_unit() {
        let mut input = "250ms rest";
        assert_eq!(duration(&mut input).ok(), Some(Duration::from_millis(250)));
        assert_eq!(input, " rest");
    }
}
