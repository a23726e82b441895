//! Download command - resolve the requirements file and fetch every
//! package for the target platform.

use std::fs;

use wheelhouse::failures::{self, FailureRecord};
use wheelhouse::fetch::Fetcher;
use wheelhouse::registry::RegistryClient;
use wheelhouse::requirements;
use wheelhouse::{BundleConfig, TargetEnvironment};

use super::common::{self, DownloadStats, PackageError, PackageOutcome};
use crate::error::CliError;

pub fn run(config: &BundleConfig, target: &TargetEnvironment) -> Result<(), CliError> {
    common::banner("Python wheel downloader");
    println!("Target:             {}", target);
    println!("Interpreter tag:    {}", target.cp_tag());
    println!("Platform tag:       {}", target.platform_tag());
    println!("Download directory: {}", config.download_dir.display());
    common::rule();
    println!();

    fs::create_dir_all(&config.download_dir).map_err(|e| {
        CliError::Io(format!(
            "failed to create {}: {}",
            config.download_dir.display(),
            e
        ))
    })?;

    println!(
        "Reading requirements from {}",
        config.requirements_file.display()
    );
    let packages = requirements::resolve_dependencies(&config.requirements_file)?;
    if packages.is_empty() {
        return Err(CliError::Config(format!(
            "no packages found in {}",
            config.requirements_file.display()
        )));
    }
    println!("Found {} package(s) to process\n", packages.len());

    let client = RegistryClient::new(config);
    let fetcher = Fetcher::new(config);

    let mut stats = DownloadStats::new(packages.len());
    let mut failed = Vec::new();

    for (index, package) in packages.iter().enumerate() {
        common::package_label(index, stats.total, &package.name, package.version.as_deref());

        match common::download_package(
            &client,
            &fetcher,
            config,
            target,
            &package.name,
            package.version.as_deref(),
            false,
        ) {
            Ok(PackageOutcome::Downloaded) => stats.downloaded += 1,
            Ok(PackageOutcome::AlreadyPresent) => stats.already_present += 1,
            Err(PackageError::Recoverable(reason)) => {
                stats.failed += 1;
                println!("  failed: {}", reason);
                failed.push(FailureRecord::new(
                    package.name.clone(),
                    package.version.clone(),
                    reason,
                ));
            }
            Err(PackageError::Fatal(e)) => return Err(e),
        }
        println!();
    }

    stats.print_summary("Download Summary");

    if failed.is_empty() {
        println!("\nAll packages downloaded. Install them with:");
        println!("  pip install {}/*.whl", config.download_dir.display());
        Ok(())
    } else {
        failures::save(&config.failures_file, &failed)?;
        println!(
            "\nFailed packages saved to {}",
            config.failures_file.display()
        );
        println!("Run `wheelhouse retry` to retry them.");
        Err(CliError::Failures(failed.len()))
    }
}
