//! Package registry JSON API client.
//!
//! `GET <registry>/<package>/json` returns the metadata for every
//! published release of a package. The endpoint is read-only and
//! eventually consistent; an exact requested version may be missing and
//! is resolved by [`resolve_version`]. Lookups retry transient
//! network failures with a fixed delay; decode failures and missing
//! packages are reported immediately.

mod select;

pub use select::{resolve_version, select_artifact};

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::warn;

use crate::config::BundleConfig;
use crate::error::RegistryError;

/// User-Agent sent with every registry request.
const USER_AGENT: &str = concat!("wheelhouse/", env!("CARGO_PKG_VERSION"));

/// Full metadata for a package, as returned by the registry.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageInfo {
    pub info: PackageMeta,
    #[serde(default)]
    pub releases: HashMap<String, Vec<ReleaseFile>>,
}

impl PackageInfo {
    /// Latest published version of the package.
    pub fn latest_version(&self) -> &str {
        &self.info.version
    }
}

/// The `info` block of a registry response.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageMeta {
    #[serde(default)]
    pub name: String,
    pub version: String,
}

/// One downloadable artifact of a release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseFile {
    pub filename: String,
    pub url: String,
    pub packagetype: DistKind,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub digests: Digests,
}

/// Content digests the registry publishes per file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Digests {
    #[serde(default)]
    pub sha256: Option<String>,
}

/// Kind of distribution artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistKind {
    /// Prebuilt binary wheel.
    BdistWheel,
    /// Source distribution requiring local compilation.
    Sdist,
    /// Legacy formats (eggs and friends); never selected.
    #[serde(other)]
    Other,
}

/// Blocking registry client.
#[derive(Debug)]
pub struct RegistryClient {
    http: Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl RegistryClient {
    /// Create a client from the run configuration.
    pub fn new(config: &BundleConfig) -> Self {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to create HTTP client");

        Self {
            http,
            base_url: config.registry_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        }
    }

    /// Fetch the full metadata record for a package.
    ///
    /// Transient failures (timeouts, connection errors, non-2xx answers
    /// other than 404) are retried up to the configured ceiling with a
    /// fixed delay. A 404 means the package does not exist and is not
    /// retried; neither is a malformed response body.
    pub fn package_info(&self, name: &str) -> Result<PackageInfo, RegistryError> {
        let url = format!("{}/{}/json", self.base_url, name);
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            match self.http.get(&url).send() {
                Ok(response) if response.status() == StatusCode::NOT_FOUND => {
                    return Err(RegistryError::PackageNotFound {
                        name: name.to_string(),
                    });
                }
                Ok(response) if response.status().is_success() => {
                    return response.json::<PackageInfo>().map_err(|e| {
                        RegistryError::ParseFailed {
                            url: url.clone(),
                            reason: e.to_string(),
                        }
                    });
                }
                Ok(response) => {
                    last_error = format!("registry answered with status {}", response.status());
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }

            if attempt < self.max_retries {
                warn!(
                    package = name,
                    attempt,
                    max = self.max_retries,
                    "registry lookup failed, retrying: {}",
                    last_error
                );
                thread::sleep(self.retry_delay);
            }
        }

        Err(RegistryError::FetchFailed {
            url,
            reason: last_error,
        })
    }
}
