//! Check command - delete corrupt wheel archives.

use std::fs;

use wheelhouse::maintenance;
use wheelhouse::BundleConfig;

use super::common;
use crate::error::CliError;

pub fn run(config: &BundleConfig) -> Result<(), CliError> {
    common::banner("Checking for corrupted wheels");
    println!("Download directory: {}", config.download_dir.display());
    println!();

    let wheels = maintenance::scan_wheels(&config.download_dir)?;

    if wheels.is_empty() {
        println!("No wheel files found in the download directory.");
        return Ok(());
    }

    println!("Checking {} wheel file(s)...\n", wheels.len());

    let total = wheels.len();
    let mut valid = 0usize;
    let mut removed = 0usize;

    for path in &wheels {
        if maintenance::is_valid_archive(path) {
            valid += 1;
            continue;
        }

        println!("  corrupt: {}", path.display());
        match fs::remove_file(path) {
            Ok(()) => {
                removed += 1;
                println!("  removed: {}", path.display());
            }
            Err(e) => {
                eprintln!("  failed to remove {}: {}", path.display(), e);
            }
        }
    }

    println!();
    common::banner("Summary");
    println!("Total wheels: {}", total);
    println!("Valid:        {}", valid);
    println!("Removed:      {}", removed);
    common::rule();

    Ok(())
}
