// Minimal integration test that drives the compiled binary through a PTY.
// This exercises the real event loop and crossterm input handling.
//
// Notes:
// - Requires a TTY; uses expectrl which allocates a pseudo terminal.
// - Marked Unix-only and ignored by default.
// - Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn minimal_session_submits_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("breach.log");
    let config = dir.path().join("config.json");

    let bin = assert_cmd::cargo::cargo_bin("breach");
    let cmd = format!(
        "{} --skip-briefing --seconds 60 --config {} --log-file {}",
        bin.display(),
        config.display(),
        log.display()
    );

    let mut p = spawn(cmd)?;

    // Give the app a moment to initialize the terminal/alternate screen
    std::thread::sleep(Duration::from_millis(200));

    p.send("wrong\r")?;
    std::thread::sleep(Duration::from_millis(200));

    p.send("\x1b")?; // ESC

    p.expect(Eof)?;

    let written = std::fs::read_to_string(&log)?;
    assert!(written.contains("session started"));

    // one-launch flags stay out of the saved preferences
    let saved: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&config)?)?;
    assert_eq!(saved["skip_briefing"], false);
    assert!(saved["session_seconds"].is_null());
    Ok(())
}
