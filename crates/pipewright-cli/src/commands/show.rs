//! Show decoded processes command

use anyhow::{Context, Result, bail};
use pipewright_core::Config;

/// Run the show command
pub fn run(config_path: &str, json: bool) -> Result<()> {
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

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    for process in &config.processes {
        println!("process '{}'", process.name);
        if let Some(input) = &process.input {
            if input.fields.is_empty() {
                println!("  input:      {}", input.kind);
            } else {
                println!("  input:      {} ({} fields)", input.kind, input.fields.len());
            }
        }
        if !process.transforms.is_empty() {
            let chain: Vec<&str> = process.transforms.iter().map(|t| t.kind.as_str()).collect();
            println!("  transforms: {}", chain.join(" -> "));
        }
        if let Some(output) = &process.output {
            println!("  output:     {}", output.kind);
        }
    }
    Ok(())
}
