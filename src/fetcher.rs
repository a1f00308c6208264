// src/fetcher.rs

//! Uniform resource fetching over HTTP(S) and the local filesystem
//!
//! Provides a wrapper around reqwest with retry support. Resources are
//! dispatched by string prefix: `http://` and `https://` go over the network,
//! anything else is treated as a local path. Callers never need to care which
//! kind of resource they are holding.

use crate::error::{Error, Result};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default retry attempts for failed fetches
pub const DEFAULT_RETRIES: u32 = 3;

/// Base retry delay in milliseconds, doubled on every failed attempt
const RETRY_DELAY_MS: u64 = 1000;

/// Whether a resource string names a remote URL rather than a local path
pub fn is_remote(resource: &str) -> bool {
    resource.starts_with("http://") || resource.starts_with("https://")
}

/// Byte fetcher for remote URLs and local paths with bounded retry
pub struct Fetcher {
    client: Client,
    max_retries: u32,
}

impl Fetcher {
    /// Create a fetcher with the given per-request timeout and retry bound
    pub fn new(timeout: Duration, max_retries: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries,
        })
    }

    /// Create a fetcher with default timeout and retry settings
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_RETRIES)
    }

    /// Fetch a resource into memory
    pub fn fetch(&self, resource: &str) -> Result<Vec<u8>> {
        if is_remote(resource) {
            self.fetch_remote(resource)
        } else {
            fs::read(resource).map_err(|e| {
                Error::IoError(format!("Failed to read {resource}: {e}"))
            })
        }
    }

    /// Fetch a resource as a UTF-8 string
    pub fn fetch_string(&self, resource: &str) -> Result<String> {
        let bytes = self.fetch(resource)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in {resource}: {e}")))
    }

    /// Fetch a remote URL with bounded retry and exponential backoff
    ///
    /// HTTP error statuses fail immediately (a 404 will not improve on retry);
    /// transport errors are retried up to the configured bound.
    fn fetch_remote(&self, url: &str) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url).send() {
                Ok(response) => {
                    if !response.status().is_success() {
                        return Err(Error::DownloadError(format!(
                            "HTTP {} from {}",
                            response.status(),
                            url
                        )));
                    }

                    let bytes = response.bytes().map_err(|e| {
                        Error::DownloadError(format!("Failed to read response from {url}: {e}"))
                    })?;

                    debug!("Fetched {} bytes from {}", bytes.len(), url);
                    return Ok(bytes.to_vec());
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::DownloadError(format!(
                            "Failed to fetch {url} after {attempt} attempts: {e}"
                        )));
                    }
                    warn!("Fetch attempt {} for {} failed: {}, retrying...", attempt, url, e);
                    std::thread::sleep(Duration::from_millis(
                        RETRY_DELAY_MS << (attempt - 1).min(6),
                    ));
                }
            }
        }
    }

    /// Save a resource to a destination path
    ///
    /// Creates parent directories, streams into a `.tmp` sibling and renames
    /// into place on success, so the destination only ever holds complete
    /// files. Remote fetches retry with exponential backoff before the final
    /// error propagates.
    pub fn save(&self, url: &str, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::IoError(format!("Failed to create directory {}: {e}", parent.display()))
            })?;
        }

        if !is_remote(url) {
            fs::copy(url, dest).map_err(|e| {
                Error::IoError(format!("Failed to copy {url} to {}: {e}", dest.display()))
            })?;
            return Ok(());
        }

        let temp_path = dest.with_extension("tmp");
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url).send() {
                Ok(mut response) => {
                    if !response.status().is_success() {
                        return Err(Error::DownloadError(format!(
                            "HTTP {} from {}",
                            response.status(),
                            url
                        )));
                    }

                    let mut file = File::create(&temp_path).map_err(|e| {
                        Error::IoError(format!(
                            "Failed to create file {}: {e}",
                            temp_path.display()
                        ))
                    })?;

                    io::copy(&mut response, &mut file).map_err(|e| {
                        Error::IoError(format!("Failed to write downloaded data: {e}"))
                    })?;

                    fs::rename(&temp_path, dest).map_err(|e| {
                        Error::IoError(format!(
                            "Failed to move {} to {}: {e}",
                            temp_path.display(),
                            dest.display()
                        ))
                    })?;

                    info!("Downloaded {} to {}", url, dest.display());
                    return Ok(());
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        let _ = fs::remove_file(&temp_path);
                        return Err(Error::DownloadError(format!(
                            "Failed to download {url} after {attempt} attempts: {e}"
                        )));
                    }
                    warn!("Download attempt {} for {} failed: {}, retrying...", attempt, url, e);
                    std::thread::sleep(Duration::from_millis(
                        RETRY_DELAY_MS << (attempt - 1).min(6),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("http://example.com/a.ks"));
        assert!(is_remote("https://example.com/a.ks"));
        assert!(!is_remote("/srv/repo/a.ks"));
        assert!(!is_remote("relative/a.ks"));
    }

    #[test]
    fn test_fetch_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        fs::write(&path, b"hello").unwrap();

        let fetcher = Fetcher::with_defaults().unwrap();
        let bytes = fetcher.fetch(path.to_str().unwrap()).unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_fetch_missing_local_file() {
        let fetcher = Fetcher::with_defaults().unwrap();
        let result = fetcher.fetch("/nonexistent/path/data.txt");
        assert!(result.is_err());
    }

    #[test]
    fn test_save_local_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.rpm");
        fs::write(&src, b"payload").unwrap();

        let dest = dir.path().join("out/deep/pkg.rpm");
        let fetcher = Fetcher::with_defaults().unwrap();
        fetcher.save(src.to_str().unwrap(), &dest).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"payload");
    }
}
