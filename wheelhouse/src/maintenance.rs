//! Local artifact upkeep.
//!
//! Two janitorial passes operate purely on files already on disk and
//! never touch the network:
//!
//! - corruption checks treat each wheel as a zip archive and flag
//!   anything that fails to open or stream cleanly
//! - compatibility pruning classifies each wheel filename against the
//!   target environment so incompatible artifacts can be deleted

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::MaintenanceError;
use crate::target::TargetEnvironment;
use crate::wheel;

/// Find all wheel files in a directory.
pub fn scan_wheels(dir: &Path) -> Result<Vec<PathBuf>, MaintenanceError> {
    scan(dir, &["*.whl"])
}

/// Find all downloadable artifacts (wheels and source archives).
pub fn scan_artifacts(dir: &Path) -> Result<Vec<PathBuf>, MaintenanceError> {
    scan(dir, &["*.whl", "*.tar.gz"])
}

fn scan(dir: &Path, patterns: &[&str]) -> Result<Vec<PathBuf>, MaintenanceError> {
    if !dir.is_dir() {
        return Err(MaintenanceError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut paths = Vec::new();

    for pattern in patterns {
        let full_pattern = dir.join(pattern);
        let matches = glob::glob(&full_pattern.to_string_lossy()).map_err(|e| {
            MaintenanceError::ScanFailed {
                reason: e.to_string(),
            }
        })?;

        for entry in matches {
            match entry {
                Ok(path) => paths.push(path),
                Err(e) => {
                    return Err(MaintenanceError::ScanFailed {
                        reason: e.to_string(),
                    })
                }
            }
        }
    }

    Ok(paths)
}

/// Whether a stored artifact is a readable, internally consistent zip.
///
/// Every entry is streamed to completion, which exercises the per-entry
/// CRC check; any failure along the way marks the artifact corrupt.
pub fn is_valid_archive(path: &Path) -> bool {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return false,
    };

    let mut archive = match zip::ZipArchive::new(file) {
        Ok(archive) => archive,
        Err(_) => return false,
    };

    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(_) => return false,
        };

        if io::copy(&mut entry, &mut io::sink()).is_err() {
            return false;
        }
    }

    true
}

/// Split wheel paths into (compatible, incompatible) by filename.
pub fn partition_compatible(
    paths: Vec<PathBuf>,
    target: &TargetEnvironment,
) -> (Vec<PathBuf>, Vec<PathBuf>) {
    paths.into_iter().partition(|path| {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        wheel::is_compatible(&filename, target)
    })
}
