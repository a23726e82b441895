//! CLI error type.
//!
//! Everything a command can fail with, flattened to one printable
//! message and an exit status of 1. Per-package failures are reported
//! inline as they happen; only their count travels through here.

use std::fmt;

use wheelhouse::error::{
    FailureStoreError, FetchError, MaintenanceError, RegistryError, ResolveError,
};

#[derive(Debug)]
pub enum CliError {
    /// Missing or invalid input/configuration.
    Config(String),

    /// Environment-level I/O failure.
    Io(String),

    /// Some packages failed; details were already reported inline.
    Failures(usize),

    /// Registry lookup failure.
    Registry(RegistryError),

    /// Download failure.
    Fetch(FetchError),

    /// Dependency resolution failure.
    Resolve(ResolveError),

    /// Failure-record store trouble.
    FailureStore(FailureStoreError),

    /// Local artifact maintenance trouble.
    Maintenance(MaintenanceError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "{}", msg),
            CliError::Io(msg) => write!(f, "{}", msg),
            CliError::Failures(count) => {
                write!(f, "{} package(s) failed; see the report above", count)
            }
            CliError::Registry(e) => write!(f, "{}", e),
            CliError::Fetch(e) => write!(f, "{}", e),
            CliError::Resolve(e) => write!(f, "{}", e),
            CliError::FailureStore(e) => write!(f, "{}", e),
            CliError::Maintenance(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Registry(e) => Some(e),
            CliError::Fetch(e) => Some(e),
            CliError::Resolve(e) => Some(e),
            CliError::FailureStore(e) => Some(e),
            CliError::Maintenance(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RegistryError> for CliError {
    fn from(e: RegistryError) -> Self {
        CliError::Registry(e)
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::Fetch(e)
    }
}

impl From<ResolveError> for CliError {
    fn from(e: ResolveError) -> Self {
        CliError::Resolve(e)
    }
}

impl From<FailureStoreError> for CliError {
    fn from(e: FailureStoreError) -> Self {
        CliError::FailureStore(e)
    }
}

impl From<MaintenanceError> for CliError {
    fn from(e: MaintenanceError) -> Self {
        CliError::Maintenance(e)
    }
}
