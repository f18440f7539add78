// src/remote/client.rs

//! HTTP client for remote listings, the advisory feed and artifact downloads
//!
//! Provides the [`Fetcher`] seam used by the catalog, the vulnerability
//! index and the artifact cache, and [`HttpFetcher`], a reqwest-based
//! implementation with connect timeout, bounded retries, a delay between
//! attempts and an overall retry time budget.

use crate::config::NetworkConfig;
use crate::error::{Error, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Buffer size for streaming downloads (8 KB)
const STREAM_BUFFER_SIZE: usize = 8192;

/// Source of raw remote bytes
///
/// Implementations must be shareable across the resolver's worker threads.
pub trait Fetcher: Send + Sync {
    /// Fetch a URL into memory
    ///
    /// A missing resource must be reported as [`Error::NotFound`].
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;

    /// Download a URL into `dest`, truncating any previous content
    ///
    /// Returns the number of bytes written.
    fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        let bytes = self.fetch(url)?;
        fs::write(dest, &bytes).map_err(|e| {
            Error::IoError(format!("Failed to write {}: {}", dest.display(), e))
        })?;
        Ok(bytes.len() as u64)
    }

    /// Fetch a URL and decode it as UTF-8 text
    fn fetch_text(&self, url: &str) -> Result<String> {
        let bytes = self.fetch(url)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in response from {}: {}", url, e)))
    }
}

/// Timeout and retry settings for [`HttpFetcher`]
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub connect_timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub max_retry_time: Duration,
    /// Draw download progress bars on stderr
    pub show_progress: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from(&NetworkConfig::default())
    }
}

impl From<&NetworkConfig> for FetchOptions {
    fn from(network: &NetworkConfig) -> Self {
        Self {
            connect_timeout: network.connect_timeout(),
            max_retries: network.max_retries.max(1),
            retry_delay: network.retry_delay(),
            max_retry_time: network.max_retry_time(),
            show_progress: true,
        }
    }
}

/// Outcome of one failed attempt
enum Attempt {
    /// Worth retrying (transport failure, 5xx, 429)
    Retry(String),
    /// Retrying cannot help
    Fatal(Error),
}

/// HTTP fetcher with retry support
pub struct HttpFetcher {
    client: Client,
    options: FetchOptions,
}

impl HttpFetcher {
    /// Create a new fetcher
    pub fn new(options: FetchOptions) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(None::<Duration>)
            .user_agent(concat!("plugdeps/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, options })
    }

    /// Send a GET request and classify the response
    fn get(&self, url: &str) -> std::result::Result<Response, Attempt> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Attempt::Retry(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else if status == StatusCode::NOT_FOUND {
            Err(Attempt::Fatal(Error::NotFound(format!("HTTP 404 from {url}"))))
        } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Err(Attempt::Retry(format!("HTTP {status}")))
        } else {
            Err(Attempt::Fatal(Error::DownloadError {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            }))
        }
    }

    /// Run `op` until it succeeds, fails permanently, or the budget runs out
    fn with_retry<T>(
        &self,
        url: &str,
        mut op: impl FnMut() -> std::result::Result<T, Attempt>,
    ) -> Result<T> {
        let started = Instant::now();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(Attempt::Fatal(e)) => return Err(e),
                Err(Attempt::Retry(reason)) => {
                    let out_of_time =
                        started.elapsed() + self.options.retry_delay > self.options.max_retry_time;
                    if attempt >= self.options.max_retries || out_of_time {
                        return Err(Error::DownloadError {
                            url: url.to_string(),
                            reason: format!("{reason} (gave up after {attempt} attempts)"),
                        });
                    }
                    warn!("Fetch attempt {} for {} failed: {}, retrying...", attempt, url, reason);
                    std::thread::sleep(self.options.retry_delay);
                }
            }
        }
    }

    fn progress_bar(&self, total_size: u64, url: &str) -> ProgressBar {
        let target = if self.options.show_progress {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let pb = ProgressBar::with_draw_target(Some(total_size), target);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        let name = url.rsplit('/').next().unwrap_or(url);
        pb.set_message(name.to_string());
        pb
    }
}

/// Stream an HTTP response to file, updating the progress bar
fn stream_response_to_file(
    mut response: Response,
    file: &mut File,
    progress_bar: &ProgressBar,
) -> std::result::Result<u64, Attempt> {
    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; STREAM_BUFFER_SIZE];

    loop {
        // A broken stream mid-body is a transport failure
        let bytes_read = response
            .read(&mut buffer)
            .map_err(|e| Attempt::Retry(format!("Failed to read response: {e}")))?;

        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read]).map_err(|e| {
            Attempt::Fatal(Error::IoError(format!("Failed to write data: {e}")))
        })?;

        downloaded += bytes_read as u64;
        progress_bar.set_position(downloaded);
    }

    Ok(downloaded)
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Fetching {}", url);
        self.with_retry(url, || {
            let response = self.get(url)?;
            let bytes = response
                .bytes()
                .map_err(|e| Attempt::Retry(format!("Failed to read response: {e}")))?;
            Ok(bytes.to_vec())
        })
    }

    fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        info!("Downloading {} to {}", url, dest.display());

        let downloaded = self.with_retry(url, || {
            let response = self.get(url)?;
            let total_size = response.content_length().unwrap_or(0);

            let mut file = File::create(dest).map_err(|e| {
                Attempt::Fatal(Error::IoError(format!(
                    "Failed to create file {}: {e}",
                    dest.display()
                )))
            })?;

            let pb = self.progress_bar(total_size, url);
            match stream_response_to_file(response, &mut file, &pb) {
                Ok(bytes) => {
                    pb.finish_and_clear();
                    Ok(bytes)
                }
                Err(e) => {
                    pb.abandon();
                    Err(e)
                }
            }
        })?;

        debug!("Downloaded {} bytes from {}", downloaded, url);
        Ok(downloaded)
    }
}
