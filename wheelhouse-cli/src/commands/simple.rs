//! Simple command - delegate bulk fetching to `pip download`, then
//! sweep the result and fall back to direct registry downloads when
//! pip produced nothing.

use std::fs;
use std::process::Command;

use tracing::debug;

use wheelhouse::fetch::Fetcher;
use wheelhouse::maintenance;
use wheelhouse::registry::RegistryClient;
use wheelhouse::requirements::{DependencyProvider, RequirementsFileProvider};
use wheelhouse::{BundleConfig, TargetEnvironment};

use super::common::{self, DownloadStats, PackageError, PackageOutcome};
use crate::error::CliError;

pub fn run(config: &BundleConfig, target: &TargetEnvironment) -> Result<(), CliError> {
    common::banner("Simplified downloader (pip download + resume)");
    println!("Download directory: {}", config.download_dir.display());
    common::rule();
    println!();

    if !config.requirements_file.exists() {
        return Err(CliError::Config(format!(
            "requirements file not found: {}",
            config.requirements_file.display()
        )));
    }

    fs::create_dir_all(&config.download_dir).map_err(|e| {
        CliError::Io(format!(
            "failed to create {}: {}",
            config.download_dir.display(),
            e
        ))
    })?;

    println!(
        "Using requirements file: {}",
        config.requirements_file.display()
    );
    println!("Step 1: delegating to pip download...\n");

    // pip handles dependency resolution and platform selection itself;
    // whatever it manages to pull lands in the download directory.
    let no_deps = run_pip_download(config, true);
    if !no_deps {
        println!("pip download with --no-deps had issues, retrying with dependencies...");
        run_pip_download(config, false);
    }

    println!("\nStep 2: checking what landed on disk...\n");

    let artifacts = maintenance::scan_artifacts(&config.download_dir)?;

    if artifacts.is_empty() {
        println!("No files were produced by pip; downloading directly from the registry...\n");
        return direct_download(config, target);
    }

    for (index, path) in artifacts.iter().enumerate() {
        let size = path.metadata().map(|m| m.len()).unwrap_or(0);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        println!("[{}/{}] {} ({} bytes)", index + 1, artifacts.len(), name, size);
    }

    println!();
    common::banner("Summary");
    println!("Files on disk: {}", artifacts.len());
    common::rule();
    println!("\nInstall the wheels with:");
    println!("  pip install {}/*.whl", config.download_dir.display());

    Ok(())
}

/// Run `pip download`; returns whether the process exited cleanly.
fn run_pip_download(config: &BundleConfig, no_deps: bool) -> bool {
    let mut command = Command::new(wheelhouse::requirements::python_interpreter());
    command
        .args(["-m", "pip", "download", "-r"])
        .arg(&config.requirements_file)
        .arg("-d")
        .arg(&config.download_dir);
    if no_deps {
        command.arg("--no-deps");
    }

    debug!(?command, "running pip download");

    match command.status() {
        Ok(status) => status.success(),
        Err(e) => {
            eprintln!("could not run pip: {}", e);
            false
        }
    }
}

/// Direct per-requirement downloads; the fallback when pip cannot run.
fn direct_download(config: &BundleConfig, target: &TargetEnvironment) -> Result<(), CliError> {
    let packages = RequirementsFileProvider.resolve(&config.requirements_file)?;
    if packages.is_empty() {
        return Err(CliError::Config(format!(
            "no packages found in {}",
            config.requirements_file.display()
        )));
    }

    let client = RegistryClient::new(config);
    let fetcher = Fetcher::new(config);

    let mut stats = DownloadStats::new(packages.len());

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
            }
            Err(PackageError::Fatal(e)) => return Err(e),
        }
        println!();
    }

    stats.print_summary("Download Summary");

    if stats.failed == 0 {
        Ok(())
    } else {
        Err(CliError::Failures(stats.failed))
    }
}
