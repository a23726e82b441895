//! Retry command - replay every package recorded in the failures file.

use wheelhouse::error::FailureStoreError;
use wheelhouse::failures;
use wheelhouse::fetch::Fetcher;
use wheelhouse::registry::RegistryClient;
use wheelhouse::{BundleConfig, TargetEnvironment};

use super::common::{self, DownloadStats, PackageError, PackageOutcome};
use crate::error::CliError;

pub fn run(config: &BundleConfig, target: &TargetEnvironment) -> Result<(), CliError> {
    common::banner("Retry failed downloads");
    println!();

    let records = match failures::load(&config.failures_file) {
        Ok(records) => records,
        Err(FailureStoreError::NotFound { path }) => {
            return Err(CliError::Config(format!(
                "{} not found; run `wheelhouse download` first",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    if records.is_empty() {
        println!("No failed packages recorded; nothing to retry.");
        return Ok(());
    }

    println!("Found {} failed package(s) to retry\n", records.len());

    let client = RegistryClient::new(config);
    let fetcher = Fetcher::new(config);

    let mut stats = DownloadStats::new(records.len());

    for (index, record) in records.iter().enumerate() {
        common::package_label(index, stats.total, &record.name, record.version.as_deref());

        // Recorded versions can be stale or mangled; fall back to the
        // registry's latest release before giving up on a package.
        match common::download_package(
            &client,
            &fetcher,
            config,
            target,
            &record.name,
            record.version.as_deref(),
            true,
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

    stats.print_summary("Retry Summary");

    if stats.failed == 0 {
        failures::clear(&config.failures_file)?;
        println!(
            "\nAll packages downloaded; removed {}",
            config.failures_file.display()
        );
        println!("Install them with:");
        println!("  pip install {}/*.whl", config.download_dir.display());
        Ok(())
    } else {
        println!(
            "\n{} package(s) still failed. Run `wheelhouse retry` again,",
            stats.failed
        );
        println!("or check the messages above for details.");
        Err(CliError::Failures(stats.failed))
    }
}
