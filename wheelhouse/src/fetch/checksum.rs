//! SHA-256 digest verification for downloaded artifacts.
//!
//! The registry publishes a sha256 digest per release file; a completed
//! download must hash to it before it counts as complete.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::FetchError;

/// Buffer size for reading files during digest calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Calculate the SHA-256 digest of a file as lowercase hex.
pub fn file_sha256(path: &Path) -> Result<String, FetchError> {
    let mut file = File::open(path).map_err(|e| FetchError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| FetchError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Verify that a file hashes to the expected digest.
pub fn verify_sha256(path: &Path, expected: &str) -> Result<(), FetchError> {
    let actual = file_sha256(path)?;
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(FetchError::DigestMismatch {
            filename: path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // SHA-256 of "hello world"
    const HELLO_DIGEST: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_file_sha256() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("artifact.whl");
        fs::write(&path, b"hello world").unwrap();

        assert_eq!(file_sha256(&path).unwrap(), HELLO_DIGEST);
    }

    #[test]
    fn test_verify_match() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("artifact.whl");
        fs::write(&path, b"hello world").unwrap();

        assert!(verify_sha256(&path, HELLO_DIGEST).is_ok());
        // Registry digests are lowercase hex, but don't depend on it.
        assert!(verify_sha256(&path, &HELLO_DIGEST.to_uppercase()).is_ok());
    }

    #[test]
    fn test_verify_mismatch() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("artifact.whl");
        fs::write(&path, b"something else").unwrap();

        let err = verify_sha256(&path, HELLO_DIGEST).unwrap_err();
        match err {
            FetchError::DigestMismatch { filename, .. } => {
                assert_eq!(filename, "artifact.whl");
            }
            other => panic!("expected DigestMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let result = file_sha256(Path::new("/nonexistent/artifact.whl"));
        assert!(matches!(result, Err(FetchError::ReadFailed { .. })));
    }
}
