//! Shared helpers for CLI commands.
//!
//! The per-package download flow lives here because three drivers
//! (`download`, `retry`, `simple`'s direct fallback) walk the same
//! path: registry lookup, version resolution, artifact selection,
//! already-complete check, resumable fetch.

use std::process::Command;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use wheelhouse::error::FetchError;
use wheelhouse::fetch::{FetchOutcome, Fetcher, ProgressCallback};
use wheelhouse::registry::{resolve_version, select_artifact, DistKind, RegistryClient};
use wheelhouse::requirements;
use wheelhouse::{BundleConfig, TargetEnvironment};

use crate::error::CliError;

const RULE_WIDTH: usize = 70;

/// Print a section banner.
pub fn banner(title: &str) {
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("{}", title);
    println!("{}", "=".repeat(RULE_WIDTH));
}

/// Print a closing rule.
pub fn rule() {
    println!("{}", "=".repeat(RULE_WIDTH));
}

/// Counters for a batch run.
#[derive(Debug, Default)]
pub struct DownloadStats {
    pub total: usize,
    pub downloaded: usize,
    pub already_present: usize,
    pub failed: usize,
}

impl DownloadStats {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn print_summary(&self, title: &str) {
        banner(title);
        println!("Total packages:   {}", self.total);
        println!("Downloaded:       {}", self.downloaded);
        println!("Already present:  {}", self.already_present);
        println!("Failed:           {}", self.failed);
        rule();
    }
}

/// How a single package made it into the downloads directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageOutcome {
    Downloaded,
    AlreadyPresent,
}

/// Why a single package did not make it.
#[derive(Debug)]
pub enum PackageError {
    /// Recorded and skipped; the batch continues.
    Recoverable(String),
    /// Environment-level failure; aborts the whole run.
    Fatal(CliError),
}

/// Build the target environment from a `--python` flag or by probing
/// the host interpreter.
pub fn resolve_target(python: Option<&str>) -> Result<TargetEnvironment, CliError> {
    let (major, minor) = match python {
        Some(spec) => parse_python_version(spec)?,
        None => probe_python_version()?,
    };
    let target = TargetEnvironment::detect(major, minor);
    debug!(%target, "resolved target environment");
    Ok(target)
}

fn parse_python_version(spec: &str) -> Result<(u32, u32), CliError> {
    let invalid = || {
        CliError::Config(format!(
            "invalid python version '{}'; expected MAJOR.MINOR, e.g. 3.12",
            spec
        ))
    };

    let (major, minor) = spec.trim().split_once('.').ok_or_else(invalid)?;
    let major = major.parse::<u32>().map_err(|_| invalid())?;
    let minor = minor.parse::<u32>().map_err(|_| invalid())?;
    Ok((major, minor))
}

fn probe_python_version() -> Result<(u32, u32), CliError> {
    let interpreter = requirements::python_interpreter();
    let output = Command::new(&interpreter)
        .args([
            "-c",
            "import sys; print('{}.{}'.format(sys.version_info[0], sys.version_info[1]))",
        ])
        .output()
        .map_err(|e| {
            CliError::Config(format!(
                "could not run '{}' to detect the target interpreter ({}); pass --python MAJOR.MINOR",
                interpreter, e
            ))
        })?;

    if !output.status.success() {
        return Err(CliError::Config(format!(
            "'{}' exited with {}; pass --python MAJOR.MINOR",
            interpreter, output.status
        )));
    }

    parse_python_version(String::from_utf8_lossy(&output.stdout).trim())
}

/// A byte-level progress bar wired to the fetcher's callback.
pub fn byte_progress(filename: &str) -> (ProgressBar, ProgressCallback) {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("    {msg} {bytes}/{total_bytes} ({percent}%)")
            .expect("static progress template is valid"),
    );
    bar.set_message(filename.to_string());

    let updater = bar.clone();
    let callback: ProgressCallback = Box::new(move |on_disk, expected_total| {
        if expected_total > 0 && updater.length() != Some(expected_total) {
            updater.set_length(expected_total);
        }
        updater.set_position(on_disk);
    });

    (bar, callback)
}

/// Fetch one package into the downloads directory.
///
/// `fall_back_to_latest` is the retry driver's behavior: when the
/// recorded version yields nothing even after normalization, the
/// registry's latest release is tried before giving up, and the top
/// known versions are printed as a hint.
pub fn download_package(
    client: &RegistryClient,
    fetcher: &Fetcher,
    config: &BundleConfig,
    target: &TargetEnvironment,
    name: &str,
    version: Option<&str>,
    fall_back_to_latest: bool,
) -> Result<PackageOutcome, PackageError> {
    let info = client
        .package_info(name)
        .map_err(|e| PackageError::Recoverable(e.to_string()))?;

    let mut selection = resolve_version(&info, version)
        .ok()
        .and_then(|(v, files)| select_artifact(files, target).map(|f| (v, f.clone())));

    if selection.is_none() && fall_back_to_latest {
        let latest = info.latest_version().to_string();
        println!(
            "  version {} unavailable, trying latest: {}",
            version.unwrap_or("?"),
            latest
        );
        selection = resolve_version(&info, Some(&latest))
            .ok()
            .and_then(|(v, files)| select_artifact(files, target).map(|f| (v, f.clone())));
    }

    let (version, artifact) = match selection {
        Some(pair) => pair,
        None => {
            if fall_back_to_latest {
                print_available_versions(&info);
            }
            return Err(PackageError::Recoverable(format!(
                "No suitable artifact found for {} {}",
                name,
                version.unwrap_or("latest")
            )));
        }
    };

    if artifact.packagetype == DistKind::Sdist {
        println!("  note: no wheel available; the source distribution requires local compilation");
    }

    let dest = config.download_dir.join(&artifact.filename);

    // The registry's declared size decides whether anything is left to
    // do before a single byte moves.
    if let (Ok(metadata), Some(size)) = (dest.metadata(), artifact.size) {
        if metadata.len() == size {
            println!("  already downloaded: {}", artifact.filename);
            return Ok(PackageOutcome::AlreadyPresent);
        }
        println!("  incomplete file found, resuming: {}", artifact.filename);
    }

    println!("  downloading: {} ({})", artifact.filename, version);
    let (bar, callback) = byte_progress(&artifact.filename);
    let result = fetcher.fetch(
        &artifact.url,
        &dest,
        true,
        artifact.digests.sha256.as_deref(),
        Some(callback),
    );
    bar.finish_and_clear();

    match result {
        Ok(FetchOutcome::AlreadyComplete) => Ok(PackageOutcome::AlreadyPresent),
        Ok(FetchOutcome::Downloaded(_)) => Ok(PackageOutcome::Downloaded),
        Err(
            e @ (FetchError::CreateDirFailed { .. }
            | FetchError::WriteFailed { .. }
            | FetchError::ReadFailed { .. }),
        ) => Err(PackageError::Fatal(CliError::Fetch(e))),
        Err(e) => Err(PackageError::Recoverable(e.to_string())),
    }
}

fn print_available_versions(info: &wheelhouse::registry::PackageInfo) {
    let mut versions: Vec<&String> = info.releases.keys().collect();
    versions.sort_unstable_by(|a, b| b.cmp(a));
    if !versions.is_empty() {
        let preview: Vec<&str> = versions.iter().take(5).map(|v| v.as_str()).collect();
        println!("  available versions: {}", preview.join(", "));
    }
}

/// Print a one-line label for the package being processed.
pub fn package_label(index: usize, total: usize, name: &str, version: Option<&str>) {
    match version {
        Some(version) => println!("[{}/{}] {}=={}", index + 1, total, name, version),
        None => println!("[{}/{}] {}", index + 1, total, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_python_version() {
        assert_eq!(parse_python_version("3.12").unwrap(), (3, 12));
        assert_eq!(parse_python_version(" 3.9 ").unwrap(), (3, 9));
    }

    #[test]
    fn test_parse_python_version_invalid() {
        assert!(parse_python_version("3").is_err());
        assert!(parse_python_version("three.twelve").is_err());
        assert!(parse_python_version("").is_err());
    }

    #[test]
    fn test_stats_start_empty() {
        let stats = DownloadStats::new(7);
        assert_eq!(stats.total, 7);
        assert_eq!(stats.downloaded, 0);
        assert_eq!(stats.already_present, 0);
        assert_eq!(stats.failed, 0);
    }
}
