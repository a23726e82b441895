//! Failed command - show which packages are recorded as failed.

use std::fs;
use std::io::ErrorKind;

use wheelhouse::BundleConfig;

use super::common;
use crate::error::CliError;

pub fn run(config: &BundleConfig) -> Result<(), CliError> {
    let content = match fs::read_to_string(&config.failures_file) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            println!("No failed packages file found.");
            println!("All packages may have been downloaded successfully.");
            return Ok(());
        }
        Err(e) => {
            return Err(CliError::Io(format!(
                "failed to read {}: {}",
                config.failures_file.display(),
                e
            )));
        }
    };

    common::banner("Failed packages");
    println!();

    let mut count = 0usize;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        count += 1;
        println!("  {}. {}", count, line);
    }

    println!();
    common::rule();
    println!("Total failed packages: {}", count);
    common::rule();
    println!();
    println!("To retry these packages, run:");
    println!("  wheelhouse retry");

    Ok(())
}
