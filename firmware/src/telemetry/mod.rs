#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Forwards controller telemetry to the log sink.
//!
//! `lockbox-core` only records events into its ring. After every tick the lock
//! task hands the ring to [`TelemetryDrain::forward`], which emits each record
//! not yet seen through defmt on target or stdout on the host.

use lockbox_core::telemetry::{
    EventId, TelemetryEventKind, TelemetryPayload, TelemetryRecord, TelemetryRecorder,
};

use crate::clock::FirmwareInstant;

/// Severity chosen for a telemetry event.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Info,
    Warn,
}

/// Tracks which telemetry records have already been logged.
#[derive(Debug, Default)]
pub struct TelemetryDrain {
    last_seen: Option<EventId>,
}

impl TelemetryDrain {
    pub const fn new() -> Self {
        Self { last_seen: None }
    }

    /// Logs every record newer than the previous call and returns how many were emitted.
    pub fn forward(&mut self, recorder: &TelemetryRecorder<FirmwareInstant>) -> usize {
        let mut forwarded = 0;
        for record in recorder.since(self.last_seen) {
            emit_record(record);
            self.last_seen = Some(record.id);
            forwarded += 1;
        }
        forwarded
    }

    pub const fn last_seen(&self) -> Option<EventId> {
        self.last_seen
    }
}

/// Rejections and dropped presses stand out in the log.
pub const fn level_for(event: TelemetryEventKind) -> LogLevel {
    match event {
        TelemetryEventKind::CodeRejected | TelemetryEventKind::PressFiltered => LogLevel::Warn,
        _ => LogLevel::Info,
    }
}

fn payload_millis(details: TelemetryPayload) -> (Option<u64>, Option<u8>) {
    match details {
        TelemetryPayload::None => (None, None),
        TelemetryPayload::Press(press) => {
            (Some(duration_millis(press.held_for)), Some(press.buffered))
        }
        TelemetryPayload::Attempt(attempt) => {
            (attempt.elapsed.map(duration_millis), Some(attempt.symbols))
        }
    }
}

fn duration_millis(duration: core::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(target_os = "none")]
fn emit_record(record: &TelemetryRecord<FirmwareInstant>) {
    let timestamp_ms = record.timestamp.into_embassy().as_millis();
    let event = defmt::Display2Format(&record.event);
    let (span_ms, count) = payload_millis(record.details);

    match level_for(record.event) {
        LogLevel::Warn => defmt::warn!(
            "telemetry:lock #{} {} t={}ms span={}ms n={}",
            record.id,
            event,
            timestamp_ms,
            span_ms,
            count
        ),
        LogLevel::Info => defmt::info!(
            "telemetry:lock #{} {} t={}ms span={}ms n={}",
            record.id,
            event,
            timestamp_ms,
            span_ms,
            count
        ),
    }
}

#[cfg(not(target_os = "none"))]
fn emit_record(record: &TelemetryRecord<FirmwareInstant>) {
    let timestamp_ms = record.timestamp.into_embassy().as_millis();
    let (span_ms, count) = payload_millis(record.details);
    let prefix = match level_for(record.event) {
        LogLevel::Warn => "WARN ",
        LogLevel::Info => "",
    };
    println!(
        "{prefix}telemetry:lock #{} {} t={}ms span={:?}ms n={:?}",
        record.id, record.event, timestamp_ms, span_ms, count
    );
}
