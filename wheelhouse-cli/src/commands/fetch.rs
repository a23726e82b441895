//! Fetch command - download a single package by name.
//!
//! Handy when one wheel in an otherwise complete bundle turned out to
//! be wrong for the platform: list what the registry offers, pick the
//! best match, and pull just that file.

use std::fs;

use wheelhouse::error::RegistryError;
use wheelhouse::fetch::{FetchOutcome, Fetcher};
use wheelhouse::registry::{resolve_version, select_artifact, DistKind, RegistryClient};
use wheelhouse::{BundleConfig, TargetEnvironment};

use super::common;
use crate::error::CliError;

pub fn run(
    config: &BundleConfig,
    target: &TargetEnvironment,
    name: &str,
    version: Option<&str>,
) -> Result<(), CliError> {
    common::banner(&format!("Fetching {}", name));
    println!("Target: {}", target);
    println!();

    let client = RegistryClient::new(config);
    let info = client.package_info(name)?;
    let (version, files) = resolve_version(&info, version)?;

    let wheels: Vec<&str> = files
        .iter()
        .filter(|f| f.packagetype == DistKind::BdistWheel)
        .map(|f| f.filename.as_str())
        .collect();

    println!("Found {} wheel file(s) for {} {}:", wheels.len(), name, version);
    for filename in &wheels {
        println!("  - {}", filename);
    }
    println!();

    let artifact = select_artifact(files, target).ok_or_else(|| {
        CliError::Registry(RegistryError::NoArtifact {
            name: name.to_string(),
            version: version.clone(),
        })
    })?;

    println!("Selected: {}", artifact.filename);
    if artifact.packagetype == DistKind::Sdist {
        println!("note: no wheel available; the source distribution requires local compilation");
    }

    fs::create_dir_all(&config.download_dir).map_err(|e| {
        CliError::Io(format!(
            "failed to create {}: {}",
            config.download_dir.display(),
            e
        ))
    })?;

    let dest = config.download_dir.join(&artifact.filename);

    let fetcher = Fetcher::new(config);
    let (bar, callback) = common::byte_progress(&artifact.filename);
    let outcome = fetcher.fetch(
        &artifact.url,
        &dest,
        true,
        artifact.digests.sha256.as_deref(),
        Some(callback),
    );
    bar.finish_and_clear();

    match outcome? {
        FetchOutcome::AlreadyComplete => println!("Already downloaded: {}", dest.display()),
        FetchOutcome::Downloaded(bytes) => {
            println!("Downloaded {} ({} bytes)", dest.display(), bytes)
        }
    }

    Ok(())
}
