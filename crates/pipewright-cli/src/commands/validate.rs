//! Validate configuration command

use anyhow::{Context, Result, bail};
use pipewright_core::Config;

/// Run the validate command
///
/// Prints every recorded validation failure and fails without running
/// anything; a configuration with any invalid process is rejected as a
/// whole.
pub fn run(config_path: &str) -> Result<()> {
    tracing::info!("Validating configuration: {}", config_path);

    let file = std::fs::File::open(config_path)
        .with_context(|| format!("failed to open configuration file ({})", config_path))?;
    let (config, report) =
        Config::parse(file, config_path).context("Failed to parse configuration")?;

    if !report.is_empty() {
        for diagnostic in report.iter() {
            eprintln!("error: {}", diagnostic);
        }
        bail!("configuration is invalid ({} errors)", report.len());
    }

    for process in &config.processes {
        tracing::info!("✓ process '{}'", process.name);
    }
    tracing::info!("✓ Configuration is valid");
    Ok(())
}
