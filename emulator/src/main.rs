//! Interactive host emulator for the lockbox controller.
//!
//! Drives `lockbox-core` with a virtual millisecond clock so code entry can be
//! exercised without hardware:
//!
//! ```bash
//! lockbox-emulator --transcript transcripts/session.log --auto-relock
//! ```

mod grammar;
mod session;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use lockbox_core::code::{CodeError, SecretCode};
use lockbox_core::config::{InputPolicy, LockboxConfig, RelockPolicy};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use grammar::ConsoleCommand;
use session::Session;

/// Lockbox controller emulator
#[derive(Parser, Debug)]
#[command(name = "lockbox-emulator")]
#[command(about = "Console emulator for the single-button lockbox")]
#[command(version)]
struct Args {
    /// Write a HOST/EMU transcript of the session to this file
    #[arg(long, value_name = "PATH")]
    transcript: Option<PathBuf>,

    /// Unlock code as S/L symbols
    #[arg(long, value_name = "PATTERN", default_value = "SLLS", value_parser = parse_secret)]
    secret: SecretCode,

    /// Longest press classified as short, in milliseconds
    #[arg(long, value_name = "MS")]
    short_max: Option<u64>,

    /// Idle time before a partial entry is discarded, in milliseconds
    #[arg(long, value_name = "MS")]
    idle_reset: Option<u64>,

    /// Drop presses shorter than this many milliseconds (0 disables)
    #[arg(long, value_name = "MS", default_value_t = 0)]
    min_press: u64,

    /// Relock automatically after the given hold (default 5000 ms)
    #[arg(long, value_name = "MS", num_args = 0..=1, default_missing_value = "5000")]
    auto_relock: Option<u64>,

    /// Whether the button is sampled during settle and blink windows
    #[arg(long, value_enum, default_value_t = PolicyArg::Suspend)]
    input_policy: PolicyArg,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum PolicyArg {
    Suspend,
    Continuous,
}

impl Args {
    fn config(&self) -> LockboxConfig {
        let mut config =
            LockboxConfig::REFERENCE.with_min_press(Duration::from_millis(self.min_press));
        if let Some(short_max) = self.short_max {
            config = config.with_short_max(Duration::from_millis(short_max));
        }
        if let Some(idle_reset) = self.idle_reset {
            config = config.with_idle_reset(Duration::from_millis(idle_reset));
        }
        if let Some(hold) = self.auto_relock {
            config = config.with_relock(RelockPolicy::After(Duration::from_millis(hold)));
        }
        config.with_input_policy(match self.input_policy {
            PolicyArg::Suspend => InputPolicy::SuspendDuringActuation,
            PolicyArg::Continuous => InputPolicy::SampleContinuously,
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let config = args.config();
    tracing::info!(?config, "starting emulator");
    let mut session = Session::new(config, args.secret, args.transcript.as_deref())?;

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut line = String::new();

    writeln!(
        writer,
        "Lockbox Emulator ready ({}). Type `help` for commands or `exit` to quit.",
        session.lockbox().state().as_str()
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let responses = session.handle_command(trimmed)?;
        for response in &responses {
            writeln!(writer, "{response}")?;
        }

        if should_terminate(trimmed) {
            break;
        }
    }

    Ok(())
}

fn parse_secret(pattern: &str) -> Result<SecretCode, CodeError> {
    SecretCode::parse(pattern)
}

fn should_terminate(input: &str) -> bool {
    matches!(grammar::parse(input), Ok(ConsoleCommand::Exit))
}
