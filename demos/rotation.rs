//! Rollout and retention of a single level file.
//!
//! Uses a small size bound on a standalone writer so the rollouts happen
//! after a handful of lines.
//!
//! Run with:
//! ```bash
//! cargo run --example rotation
//! ```

use std::io::Write;
use std::sync::Arc;

use levelroll::{LevelFileWriter, LevelRotationCounter, RetentionConfig, RolloutHandler, Severity};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;
    let log_path = temp_dir.path().join("demo-info.log");

    // Keep the two newest rolled-out files
    let handler = RolloutHandler::new(
        Arc::new(LevelRotationCounter::new()),
        RetentionConfig::window(2),
    );
    let hook = Arc::new(handler.clone());
    let mut writer = LevelFileWriter::new(Severity::Info, &log_path, 64, hook)?;

    for i in 0..20 {
        writeln!(writer, "Log message number {}", i)?;
    }
    writer.flush()?;

    println!(
        "{} rollouts of the info log",
        handler.counter().current(Severity::Info)
    );
    let mut files: Vec<_> = std::fs::read_dir(temp_dir.path())?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<Result<_, _>>()?;
    files.sort();
    for name in files {
        println!("{}", name.to_string_lossy());
    }

    Ok(())
}
