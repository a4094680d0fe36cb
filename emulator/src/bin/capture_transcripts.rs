//! Records scripted emulator sessions under `transcripts/`.

use std::path::Path;

use anyhow::Result;
use lockbox_core::code::REFERENCE_SECRET;
use lockbox_core::config::{LockboxConfig, RelockPolicy, UNLOCK_HOLD};

#[allow(dead_code)]
#[path = "../grammar.rs"]
mod grammar;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::Session;

const SCRIPTS: &[(&str, &[&str])] = &[
    (
        "unlock",
        &[
            "status",
            "press 100ms",
            "wait 200ms",
            "press 600ms",
            "wait 200ms",
            "press 900ms",
            "wait 200ms",
            "press 150ms",
            "status",
        ],
    ),
    ("reject", &["enter SSLS", "wait 1s", "status", "events"]),
    ("idle", &["press 100ms", "wait 6s", "status"]),
];

fn main() -> Result<()> {
    for (name, script) in SCRIPTS {
        record(name, LockboxConfig::REFERENCE, script)?;
    }

    let relock = LockboxConfig::REFERENCE.with_relock(RelockPolicy::After(UNLOCK_HOLD));
    record(
        "relock",
        relock,
        &["enter SLLS", "wait 4s", "status", "wait 1s", "status"],
    )?;
    Ok(())
}

fn record(name: &str, config: LockboxConfig, script: &[&str]) -> Result<()> {
    let path = Path::new("transcripts").join(format!("{name}.log"));
    let mut session = Session::new(config, REFERENCE_SECRET, Some(&path))?;
    for line in script {
        session.handle_command(line)?;
    }
    session.handle_command("exit")?;
    println!(
        "{name}: {} commands, +{}ms -> {}",
        script.len(),
        session.elapsed().as_millis(),
        path.display()
    );
    Ok(())
}
