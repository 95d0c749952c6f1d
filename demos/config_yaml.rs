//! Example of loading logging configuration from a YAML file.
//!
//! This example demonstrates how to load logging configuration from
//! a YAML file and initialize the per-level logs.
//!
//! Run with:
//! ```bash
//! cargo run --example config_yaml
//! ```

use std::collections::HashMap;
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Read the YAML configuration file
    let config_path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/config.yaml");
    let config_content = fs::read_to_string(config_path)?;

    // Parse the YAML configuration
    let root: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(&config_content)?;
    let mut config: levelroll::LogConfig = serde_yaml::from_value(root["log"].clone())?;

    // Keep the demo's files out of the working directory
    let logs = tempfile::tempdir()?;
    config.logs_path = logs.path().join(&config.logs_path);

    levelroll::init_log(&config)?;

    tracing::trace!("This is a trace message (tier disabled)");
    tracing::debug!("This is a debug message");
    tracing::info!("This is an info message");
    tracing::warn!("This is a warning message");
    tracing::error!("This is an error message");

    // Log with structured data
    tracing::info!(user = "alice", action = "login", "User performed an action");

    tracing::warn!(error_code = 404, path = "/api/users", "Resource not found");

    Ok(())
}
