//! Run configuration.
//!
//! A [`BundleConfig`] is built once per run and passed explicitly into
//! the registry client, fetcher, and maintenance passes; nothing reads
//! ambient global state. Defaults match the well-known relative layout:
//! a `downloads/` directory next to a requirements file, with failures
//! recorded in `failed_packages.txt`.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of attempts per network operation.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default fixed delay between retry attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default package registry JSON endpoint.
pub const DEFAULT_REGISTRY_URL: &str = "https://pypi.org/pypi";

/// Configuration for a bundling run.
#[derive(Debug, Clone)]
pub struct BundleConfig {
    /// Directory artifacts are downloaded into.
    pub download_dir: PathBuf,

    /// Requirements file naming the packages to bundle.
    pub requirements_file: PathBuf,

    /// Flat file recording packages that failed to download.
    pub failures_file: PathBuf,

    /// Base URL of the registry JSON API.
    pub registry_url: String,

    /// Attempt ceiling for network operations.
    pub max_retries: u32,

    /// Fixed sleep between attempts; no backoff, no jitter.
    pub retry_delay: Duration,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("downloads"),
            requirements_file: default_requirements_file(),
            failures_file: PathBuf::from("failed_packages.txt"),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl BundleConfig {
    /// Create a configuration with the given download directory.
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            ..Default::default()
        }
    }

    /// Set the requirements file.
    pub fn with_requirements_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.requirements_file = path.into();
        self
    }

    /// Set the failures file.
    pub fn with_failures_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.failures_file = path.into();
        self
    }

    /// Set the registry base URL.
    pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = url.into();
        self
    }

    /// Set the attempt ceiling (minimum 1).
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    /// Set the delay between attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The default requirements file, preferring the fully pinned variant
/// when one has been generated.
pub fn default_requirements_file() -> PathBuf {
    let full = Path::new("requirements_full.txt");
    if full.exists() {
        full.to_path_buf()
    } else {
        PathBuf::from("requirements.txt")
    }
}
