//! Error types for wheelhouse operations.
//!
//! Each subsystem carries its own error enum so drivers can tell lookup
//! failures (record and continue) apart from environment failures
//! (abort the run).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from registry lookups.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry has no package under this name.
    #[error("package '{name}' not found in the registry")]
    PackageNotFound { name: String },

    /// Network-level failure after exhausting retries.
    #[error("failed to fetch {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    /// The registry answered with something that is not the expected JSON.
    #[error("failed to parse registry response from {url}: {reason}")]
    ParseFailed { url: String, reason: String },

    /// No release matches the requested version, even after normalization.
    #[error("no release of {name} matches version {version}")]
    VersionNotFound { name: String, version: String },

    /// A release exists but offers nothing downloadable.
    #[error("no suitable artifact for {name} {version}")]
    NoArtifact { name: String, version: String },
}

/// Errors from artifact downloads.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every attempt failed; carries the last error seen.
    #[error("failed to download {url} after {attempts} attempts: {reason}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// Could not create the destination directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Could not write to the destination file.
    #[error("failed to write {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },

    /// Could not read a local file back for verification.
    #[error("failed to read {path}: {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    /// Downloaded bytes do not hash to the digest the registry declared.
    #[error("digest mismatch for {filename}: expected {expected}, got {actual}")]
    DigestMismatch {
        filename: String,
        expected: String,
        actual: String,
    },
}

/// Errors from dependency resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The requirements file is missing.
    #[error("requirements file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The requirements file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    /// pip could not be run or did not produce a usable result.
    #[error("pip did not produce a usable dependency report: {reason}")]
    PipFailed { reason: String },
}

/// Errors from the failure-record store.
#[derive(Debug, Error)]
pub enum FailureStoreError {
    /// The failures file does not exist.
    #[error("failures file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },
}

/// Errors from local artifact maintenance.
#[derive(Debug, Error)]
pub enum MaintenanceError {
    /// The downloads directory does not exist.
    #[error("download directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Directory scan failed.
    #[error("failed to scan artifacts: {reason}")]
    ScanFailed { reason: String },

    /// Could not delete a flagged artifact.
    #[error("failed to remove {path}: {source}")]
    RemoveFailed { path: PathBuf, source: io::Error },
}
