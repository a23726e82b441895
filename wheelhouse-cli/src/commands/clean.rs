//! Clean command - delete wheels that cannot run on the target.

use std::fs;

use wheelhouse::maintenance;
use wheelhouse::{BundleConfig, TargetEnvironment};

use super::common;
use crate::error::CliError;

pub fn run(config: &BundleConfig, target: &TargetEnvironment) -> Result<(), CliError> {
    common::banner("Cleaning incompatible wheels");
    println!("Target:             {}", target);
    println!("Interpreter tag:    {}", target.cp_tag());
    println!("Download directory: {}", config.download_dir.display());
    println!();

    let wheels = maintenance::scan_wheels(&config.download_dir)?;

    if wheels.is_empty() {
        println!("No wheel files found in the download directory.");
        return Ok(());
    }

    println!("Found {} wheel file(s)\n", wheels.len());

    let total = wheels.len();
    let (compatible, incompatible) = maintenance::partition_compatible(wheels, target);

    println!("Compatible wheels:   {}", compatible.len());
    println!("Incompatible wheels: {}", incompatible.len());
    println!();

    let mut removed = 0usize;

    if incompatible.is_empty() {
        println!("All wheel files are compatible.");
    } else {
        println!("Removing incompatible wheels:");
        for path in &incompatible {
            match fs::remove_file(path) {
                Ok(()) => {
                    removed += 1;
                    println!("  removed: {}", path.display());
                }
                Err(e) => {
                    // Deletion is best effort; one stubborn file should
                    // not stop the sweep.
                    eprintln!("  failed to remove {}: {}", path.display(), e);
                }
            }
        }
    }

    println!();
    common::banner("Summary");
    println!("Total wheels: {}", total);
    println!("Compatible:   {}", compatible.len());
    println!("Removed:      {}", removed);
    common::rule();

    if !compatible.is_empty() {
        println!("\nInstall the remaining wheels with:");
        println!("  pip install {}/*.whl", config.download_dir.display());
    }

    Ok(())
}
