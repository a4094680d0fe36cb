use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use lockbox_core::actuation::{
    IndicatorLevel, LockActuator, LockPosition, StatusIndicator, StatusPublisher,
};
use lockbox_core::code::SecretCode;
use lockbox_core::config::LockboxConfig;
use lockbox_core::controller::ActuationWindow;
use lockbox_core::telemetry::{EventId, TelemetryPayload, TelemetryRecord};
use lockbox_core::{LockState, Lockbox, Millis, MonotonicInstant, Symbol};

use crate::grammar::{self, ConsoleCommand};

/// Virtual sample period, matching the firmware tick.
pub const TICK: Duration = Duration::from_millis(5);
/// Released time between presses issued by `enter`.
pub const ENTRY_GAP: Duration = Duration::from_millis(200);

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "press",
        "press <duration>      - hold the button for <duration>, then release",
    ),
    (
        "enter",
        "enter <S|L...>        - press out a sequence once any settle/blink window closes",
    ),
    (
        "wait",
        "wait <duration>       - advance the clock with the button released",
    ),
    (
        "status",
        "status                - show lock, buffer, LED and servo state",
    ),
    (
        "events",
        "events                - dump the retained telemetry ring",
    ),
    (
        "help",
        "help [topic]          - show help for a command",
    ),
    ("exit", "exit                  - close the session"),
];

/// Servo stand-in that remembers the last commanded position.
#[derive(Debug, Default)]
pub struct EmulatedServo {
    position: Option<LockPosition>,
    moves: usize,
}

impl EmulatedServo {
    pub fn position(&self) -> Option<LockPosition> {
        self.position
    }

    pub fn moves(&self) -> usize {
        self.moves
    }
}

impl LockActuator for EmulatedServo {
    fn move_to(&mut self, position: LockPosition) {
        tracing::debug!(?position, "servo move");
        self.position = Some(position);
        self.moves += 1;
    }
}

/// LED stand-in that counts off-to-on transitions.
#[derive(Debug, Default)]
pub struct EmulatedLed {
    lit: bool,
    pulses: usize,
}

impl EmulatedLed {
    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn pulses(&self) -> usize {
        self.pulses
    }
}

impl StatusIndicator for EmulatedLed {
    fn set(&mut self, level: IndicatorLevel) {
        if level.is_on() && !self.lit {
            self.pulses += 1;
        }
        self.lit = level.is_on();
        tracing::trace!(lit = self.lit, "led");
    }
}

/// Status sink holding the last published literal.
#[derive(Debug, Default)]
pub struct EmulatedStatus {
    published: Option<LockState>,
}

impl EmulatedStatus {
    pub fn published(&self) -> &'static str {
        self.published.map_or("-", LockState::as_str)
    }
}

impl StatusPublisher for EmulatedStatus {
    fn publish(&mut self, state: LockState) {
        tracing::info!(status = state.as_str(), "status published");
        self.published = Some(state);
    }
}

pub type EmulatedLockbox = Lockbox<Millis, EmulatedServo, EmulatedLed, EmulatedStatus>;

pub struct Session {
    lockbox: EmulatedLockbox,
    now: Millis,
    last_reported: Option<EventId>,
    transcript: Option<TranscriptLogger>,
}

impl Session {
    pub fn new(
        config: LockboxConfig,
        secret: SecretCode,
        transcript: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let lockbox = Lockbox::with_components(
            config,
            secret,
            EmulatedServo::default(),
            EmulatedLed::default(),
            EmulatedStatus::default(),
        )
        .context("invalid lockbox configuration")?;

        let transcript = transcript
            .map(TranscriptLogger::new)
            .transpose()
            .context("failed to open transcript")?;

        Ok(Self {
            lockbox,
            now: Millis::ZERO,
            last_reported: None,
            transcript,
        })
    }

    pub fn lockbox(&self) -> &EmulatedLockbox {
        &self.lockbox
    }

    /// Virtual time since power-on.
    pub fn elapsed(&self) -> Duration {
        self.now.saturating_duration_since(Millis::ZERO)
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let elapsed = self.elapsed();
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.append_line(elapsed, TranscriptRole::Host, trimmed)?;
        }

        let lines = match grammar::parse(trimmed) {
            Ok(command) => {
                tracing::debug!(?command, "console command");
                self.execute(command)
            }
            Err(err) => {
                tracing::debug!(%err, "console syntax error");
                vec![format!("ERR syntax {err}")]
            }
        };

        self.record_output(&lines)?;
        Ok(lines)
    }

    fn execute(&mut self, command: ConsoleCommand<'_>) -> Vec<String> {
        match command {
            ConsoleCommand::Press(held) => {
                self.press(held);
                self.report()
            }
            ConsoleCommand::Enter(symbols) => {
                self.enter(&symbols);
                self.report()
            }
            ConsoleCommand::Wait(duration) => {
                self.advance(duration, false);
                self.report()
            }
            ConsoleCommand::Status => self.status_lines(),
            ConsoleCommand::Events => self
                .lockbox
                .telemetry()
                .oldest_first()
                .map(describe_record)
                .collect(),
            ConsoleCommand::Help(topic) => help_lines(topic),
            ConsoleCommand::Exit => vec!["Session closed.".to_string()],
        }
    }

    /// Holds the button for `held`, ticking throughout, then releases it.
    pub fn press(&mut self, held: Duration) {
        self.tick(true);
        let release_at = self.now + held;
        while self.now + TICK < release_at {
            self.now = self.now + TICK;
            self.tick(true);
        }
        self.now = release_at;
        self.tick(false);
    }

    /// Advances the clock by `duration` with a fixed button reading.
    pub fn advance(&mut self, duration: Duration, pressed: bool) {
        let until = self.now + duration;
        while self.now + TICK <= until {
            self.now = self.now + TICK;
            self.tick(pressed);
        }
        if self.now < until {
            self.now = until;
            self.tick(pressed);
        }
    }

    fn enter(&mut self, symbols: &[Symbol]) {
        while self.lockbox.is_actuating() {
            self.advance(TICK, false);
        }

        let input = self.lockbox.config().input;
        let short = (input.short_max / 2).max(input.min_press);
        let long = input.short_max + ENTRY_GAP;

        for (index, symbol) in symbols.iter().enumerate() {
            if index > 0 {
                self.advance(ENTRY_GAP, false);
            }
            let held = match symbol {
                Symbol::Short => short,
                Symbol::Long => long,
            };
            self.press(held);
        }
    }

    fn tick(&mut self, pressed: bool) {
        if let Some(event) = self.lockbox.tick(self.now, pressed) {
            tracing::debug!(?event, at_ms = self.now.as_millis(), "entry event");
        }
    }

    /// Telemetry recorded since the previous report, then a one-line summary.
    fn report(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        for record in self.lockbox.telemetry().since(self.last_reported) {
            lines.push(describe_record(record));
            self.last_reported = Some(record.id);
        }
        lines.push(self.summary_line());
        lines
    }

    fn summary_line(&self) -> String {
        format!(
            "OK t=+{}ms state={} entered={} led={}",
            self.now.as_millis(),
            self.lockbox.state().as_str(),
            render_symbols(self.lockbox.buffer().as_slice()),
            if self.lockbox.indicator().is_lit() { "on" } else { "off" },
        )
    }

    fn status_lines(&self) -> Vec<String> {
        let lockbox = &self.lockbox;
        let buffer = lockbox.buffer();
        let servo = lockbox.actuator();
        let servo_line = match servo.position() {
            Some(position) => format!(
                "servo: {} (angle {}, {} moves)",
                position_label(position),
                position.angle(&lockbox.config().servo),
                servo.moves()
            ),
            None => "servo: idle".to_string(),
        };
        let relock = lockbox.relock_deadline().map_or_else(
            || "off".to_string(),
            |deadline| format!("+{}ms", deadline.as_millis()),
        );

        vec![
            format!(
                "state: {} (published {})",
                lockbox.state().as_str(),
                lockbox.publisher().published()
            ),
            format!(
                "entered: {} ({}/{})",
                render_symbols(buffer.as_slice()),
                buffer.len(),
                buffer.capacity()
            ),
            servo_line,
            format!(
                "led: {} ({} pulses)",
                if lockbox.indicator().is_lit() { "on" } else { "off" },
                lockbox.indicator().pulses()
            ),
            format!("actuating: {}", describe_window(lockbox.actuation_window())),
            format!("relock: {relock}"),
            format!("clock: +{}ms", self.now.as_millis()),
        ]
    }

    fn record_output(&mut self, lines: &[String]) -> io::Result<()> {
        let elapsed = self.elapsed();
        if let Some(transcript) = self.transcript.as_mut() {
            for line in lines {
                transcript.append_line(elapsed, TranscriptRole::Emulator, line)?;
            }
        }
        Ok(())
    }
}

fn help_lines(topic: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    match topic {
        Some(target) => {
            if let Some((_, detail)) = HELP_TOPICS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(target))
            {
                lines.push((*detail).to_string());
            } else {
                lines.push(format!("No help available for `{target}`."));
                lines.push(format!("Available topics: {}", help_topic_list()));
            }
        }
        None => {
            lines.push("Available commands:".to_string());
            for (_, detail) in HELP_TOPICS {
                lines.push(format!("  {detail}"));
            }
            lines.push("Durations accept ms or s suffixes; bare numbers are ms.".to_string());
        }
    }
    lines
}

fn help_topic_list() -> String {
    HELP_TOPICS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_record(record: &TelemetryRecord<Millis>) -> String {
    let detail = match record.details {
        TelemetryPayload::None => String::new(),
        TelemetryPayload::Press(press) => format!(
            " held={}ms buffered={}",
            press.held_for.as_millis(),
            press.buffered
        ),
        TelemetryPayload::Attempt(attempt) => match attempt.elapsed {
            Some(elapsed) => format!(" symbols={} elapsed={}ms", attempt.symbols, elapsed.as_millis()),
            None => format!(" symbols={}", attempt.symbols),
        },
    };
    format!(
        "+{:>6}ms #{:<3} {}{}",
        record.timestamp.as_millis(),
        record.id,
        record.event,
        detail
    )
}

fn describe_window(window: ActuationWindow<Millis>) -> String {
    match window {
        ActuationWindow::Idle => "no".to_string(),
        ActuationWindow::Settling { until } => format!("settling until +{}ms", until.as_millis()),
        ActuationWindow::Blinking { phase, next_at } => {
            format!("blinking phase {} until +{}ms", phase + 1, next_at.as_millis())
        }
    }
}

fn render_symbols(symbols: &[Symbol]) -> String {
    if symbols.is_empty() {
        return "-".to_string();
    }
    symbols.iter().map(|symbol| symbol.as_char()).collect()
}

fn position_label(position: LockPosition) -> &'static str {
    match position {
        LockPosition::Lock => "lock",
        LockPosition::Unlock => "unlock",
    }
}

struct TranscriptLogger {
    writer: BufWriter<File>,
}

impl TranscriptLogger {
    fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };

        logger.write_header()?;
        Ok(logger)
    }

    fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.writer, "# Lockbox emulator transcript")?;
        writeln!(
            self.writer,
            "# Timestamps are virtual milliseconds since power-on"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(
        &mut self,
        elapsed: Duration,
        role: TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>6} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}
