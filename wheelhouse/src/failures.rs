//! Persistent record of packages that failed to download.
//!
//! Failures are collected during a run and written out as a flat text
//! file, one `name==version  # reason` line per package, so a later
//! retry run can replay exactly the failed set. The file is advisory:
//! it is rewritten wholesale at the end of a run, consumed by the retry
//! driver, and removed once everything has succeeded.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::FailureStoreError;

/// One package that failed, with the reason it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub name: String,
    pub version: Option<String>,
    pub reason: String,
}

impl FailureRecord {
    pub fn new(
        name: impl Into<String>,
        version: Option<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            reason: reason.into(),
        }
    }
}

/// Load failure records from a file.
///
/// Comment lines and blanks are skipped; inline comments carry the
/// recorded failure reason. Versions are trimmed of trailing dots,
/// which sneak in when reasons get glued onto version strings.
pub fn load(path: &Path) -> Result<Vec<FailureRecord>, FailureStoreError> {
    if !path.exists() {
        return Err(FailureStoreError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| FailureStoreError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut records = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (spec, reason) = match line.split_once('#') {
            Some((spec, reason)) => (spec.trim(), reason.trim()),
            None => (line, ""),
        };
        if spec.is_empty() {
            continue;
        }

        let (name, version) = match spec.split_once("==") {
            Some((name, version)) => (
                name.trim().to_string(),
                Some(version.trim().trim_end_matches('.').to_string()),
            ),
            None => (spec.to_string(), None),
        };

        records.push(FailureRecord {
            name,
            version,
            reason: reason.to_string(),
        });
    }

    Ok(records)
}

/// Rewrite the failures file with the given records.
pub fn save(path: &Path, records: &[FailureRecord]) -> Result<(), FailureStoreError> {
    let mut file = fs::File::create(path).map_err(|e| FailureStoreError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let write_err = |e| FailureStoreError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    writeln!(file, "# Failed packages - run `wheelhouse retry` to retry these").map_err(write_err)?;

    for record in records {
        let line = match &record.version {
            Some(version) => format!("{}=={}  # {}", record.name, version, record.reason),
            None => format!("{}  # {}", record.name, record.reason),
        };
        writeln!(file, "{}", line).map_err(write_err)?;
    }

    Ok(())
}

/// Remove the failures file; missing is fine.
pub fn clear(path: &Path) -> Result<(), FailureStoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FailureStoreError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
