//! Resumable artifact downloads.
//!
//! Downloads stream to disk in small chunks, appending to any partial
//! file a previous attempt left behind, so interrupted transfers are
//! never wasted work. Every completed transfer is size-checked against
//! what the server advertised, and digest-checked when the registry
//! supplied one. Network failures retry with a fixed delay up to the
//! configured ceiling; local I/O failures surface immediately because
//! repeating them cannot help.

mod checksum;

pub use checksum::{file_sha256, verify_sha256};

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::config::BundleConfig;
use crate::error::FetchError;

/// Transfer chunk size; each chunk is written before the next is read.
const CHUNK_SIZE: usize = 8 * 1024;

/// Progress callback: (bytes on disk so far, expected total or 0).
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// How a fetch concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The destination already held the complete artifact; no bytes
    /// were transferred.
    AlreadyComplete,
    /// Bytes were transferred; carries the final size on disk.
    Downloaded(u64),
}

/// Outcome of a single transfer attempt, before retry policy applies.
enum AttemptError {
    /// Worth retrying: timeouts, connection failures, bad statuses,
    /// short transfers.
    Transient(String),
    /// Not worth retrying: local filesystem trouble.
    Fatal(FetchError),
}

/// Blocking HTTP fetcher with resume support.
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl Fetcher {
    /// Create a fetcher from the run configuration.
    pub fn new(config: &BundleConfig) -> Self {
        Self::with_settings(config.timeout, config.max_retries, config.retry_delay)
    }

    /// Create a fetcher with explicit settings.
    pub fn with_settings(timeout: Duration, max_retries: u32, retry_delay: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create HTTP client");

        Self {
            client,
            timeout,
            max_retries: max_retries.max(1),
            retry_delay,
        }
    }

    /// Get the remote size of a URL via a metadata-only probe.
    ///
    /// Returns 0 if the size cannot be determined; callers treat an
    /// unknown size as "cannot short-circuit".
    pub fn remote_size(&self, url: &str) -> u64 {
        self.client
            .head(url)
            .send()
            .ok()
            .filter(|r| r.status().is_success())
            .and_then(|r| {
                r.headers()
                    .get("content-length")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
            })
            .unwrap_or(0)
    }

    /// Download `url` into `dest`, resuming a partial file when allowed.
    ///
    /// When the destination already holds exactly the remote size (and
    /// matches the expected digest, when one is given), nothing is
    /// transferred. A partial file is extended from its current length
    /// via a byte-range request; partial bytes also survive failed
    /// attempts, so retries resume rather than restart.
    pub fn fetch(
        &self,
        url: &str,
        dest: &Path,
        resume: bool,
        expected_sha256: Option<&str>,
        progress: Option<ProgressCallback>,
    ) -> Result<FetchOutcome, FetchError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| FetchError::CreateDirFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let remote_size = self.remote_size(url);
        let existing_size = dest.metadata().map(|m| m.len()).unwrap_or(0);

        if remote_size > 0 && existing_size == remote_size {
            match expected_sha256 {
                None => return Ok(FetchOutcome::AlreadyComplete),
                Some(expected) => match verify_sha256(dest, expected) {
                    Ok(()) => return Ok(FetchOutcome::AlreadyComplete),
                    Err(FetchError::DigestMismatch { .. }) => {
                        // Right length, wrong bytes: start over.
                        warn!(path = %dest.display(), "stored artifact fails digest check, refetching");
                        fs::remove_file(dest).map_err(|e| FetchError::WriteFailed {
                            path: dest.to_path_buf(),
                            source: e,
                        })?;
                    }
                    Err(e) => return Err(e),
                },
            }
        }

        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            let resume_from = if resume {
                dest.metadata().map(|m| m.len()).unwrap_or(0)
            } else {
                0
            };

            match self.attempt(url, dest, resume_from, progress.as_ref()) {
                Ok(total) => {
                    if let Some(expected) = expected_sha256 {
                        match verify_sha256(dest, expected) {
                            Ok(()) => {}
                            Err(FetchError::DigestMismatch { .. }) => {
                                // The bytes on disk are unusable; drop
                                // them so the retry starts clean.
                                fs::remove_file(dest).ok();
                                last_error = "digest mismatch after transfer".to_string();
                                self.wait_before_retry(url, attempt, &last_error);
                                continue;
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    return Ok(FetchOutcome::Downloaded(total));
                }
                Err(AttemptError::Transient(reason)) => {
                    last_error = reason;
                    self.wait_before_retry(url, attempt, &last_error);
                }
                Err(AttemptError::Fatal(e)) => return Err(e),
            }
        }

        Err(FetchError::RetriesExhausted {
            url: url.to_string(),
            attempts: self.max_retries,
            reason: last_error,
        })
    }

    fn wait_before_retry(&self, url: &str, attempt: u32, reason: &str) {
        if attempt < self.max_retries {
            warn!(
                url,
                attempt,
                max = self.max_retries,
                "transfer failed, retrying: {}",
                reason
            );
            thread::sleep(self.retry_delay);
        }
    }

    /// One transfer attempt: request, stream to disk, verify length.
    fn attempt(
        &self,
        url: &str,
        dest: &Path,
        resume_from: u64,
        progress: Option<&ProgressCallback>,
    ) -> Result<u64, AttemptError> {
        let mut request = self.client.get(url);
        if resume_from > 0 {
            request = request.header("Range", format!("bytes={}-", resume_from));
            debug!(url, resume_from, "resuming partial download");
        }

        let mut response = request.send().map_err(|e| {
            if e.is_timeout() {
                AttemptError::Transient(format!(
                    "request timed out after {}s",
                    self.timeout.as_secs()
                ))
            } else {
                AttemptError::Transient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Transient(format!(
                "server answered with status {}",
                status
            )));
        }

        // A plain 200 to a range request means the server restarted the
        // body from byte zero; appending would corrupt the file.
        let start_from = if resume_from > 0 && status.as_u16() != 206 {
            debug!(url, "server ignored range request, starting fresh");
            0
        } else {
            resume_from
        };

        let content_length = response.content_length().unwrap_or(0);
        let expected_total = if content_length > 0 {
            start_from + content_length
        } else {
            0
        };

        let mut file = if start_from > 0 {
            OpenOptions::new().append(true).open(dest)
        } else {
            File::create(dest)
        }
        .map_err(|e| {
            AttemptError::Fatal(FetchError::WriteFailed {
                path: dest.to_path_buf(),
                source: e,
            })
        })?;

        let mut buffer = [0u8; CHUNK_SIZE];
        let mut on_disk = start_from;

        loop {
            let bytes_read = response
                .read(&mut buffer)
                .map_err(|e| AttemptError::Transient(format!("read error: {}", e)))?;

            if bytes_read == 0 {
                break;
            }

            file.write_all(&buffer[..bytes_read]).map_err(|e| {
                AttemptError::Fatal(FetchError::WriteFailed {
                    path: dest.to_path_buf(),
                    source: e,
                })
            })?;

            on_disk += bytes_read as u64;

            if let Some(cb) = progress {
                cb(on_disk, expected_total);
            }
        }

        // A short body is corruption, not success; the partial file is
        // kept for the next attempt to resume from.
        if expected_total > 0 && on_disk != expected_total {
            return Err(AttemptError::Transient(format!(
                "incomplete transfer: {} of {} bytes",
                on_disk, expected_total
            )));
        }

        Ok(on_disk)
    }
}
