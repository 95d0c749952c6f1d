//! Basic per-level logging example.
//!
//! This example demonstrates the simplest way to initialize per-level
//! log files with levelroll using the builder API.
//!
//! Run with:
//! ```bash
//! cargo run --example basic
//! ```

use levelroll::Severity;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logs = tempfile::tempdir()?;

    // One file per enabled tier, mirrored to stdout
    levelroll::builder()
        .with_logs_path(logs.path())
        .with_level(Severity::Trace, false)
        .with_rotate_num(10)
        .with_stdout(true)
        .init()?;

    tracing::debug!("This is a debug message");
    tracing::info!("This is an info message");
    tracing::warn!("This is a warning message");
    tracing::error!("This is an error message");
    levelroll::fatal!("This is a fatal message");
    tracing::info!(target: levelroll::GLOBAL_TARGET, "This goes to the global file");

    for entry in std::fs::read_dir(logs.path())? {
        println!("created {}", entry?.path().display());
    }

    Ok(())
}
