// src/cache.rs

//! Local artifact cache
//!
//! Packages are stored at `{root}/{name}/{version}/{file}`, so the path is a
//! pure function of name and version. A present entry is returned without
//! any network access and without re-validating its content.
//!
//! Downloads land in a temp file inside the entry directory and are renamed
//! into place only once complete, so an interrupted download never leaves a
//! partial entry behind.

use crate::error::{Error, Result};
use crate::remote::{Fetcher, RemoteLayout};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Content cache keyed by artifact name and version
pub struct ArtifactCache {
    root: PathBuf,
    fetcher: Arc<dyn Fetcher>,
    layout: RemoteLayout,
}

impl ArtifactCache {
    pub fn new(root: impl Into<PathBuf>, fetcher: Arc<dyn Fetcher>, layout: RemoteLayout) -> Self {
        Self {
            root: root.into(),
            fetcher,
            layout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic location of `name` at `version`
    pub fn entry_path(&self, name: &str, version: &str) -> Result<PathBuf> {
        check_segment(name)?;
        check_segment(version)?;
        Ok(self
            .root
            .join(name)
            .join(version)
            .join(self.layout.file_name(name)))
    }

    /// Whether a complete entry exists
    pub fn contains(&self, name: &str, version: &str) -> bool {
        self.entry_path(name, version)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Fetch `name` at `version` from its standard remote location
    pub fn fetch_artifact(&self, name: &str, version: &str) -> Result<PathBuf> {
        let url = self.layout.artifact_url(name, version);
        self.fetch(name, version, &url)
    }

    /// Return the cached package, downloading it from `url` if absent
    pub fn fetch(&self, name: &str, version: &str, url: &str) -> Result<PathBuf> {
        let dest = self.entry_path(name, version)?;
        if dest.is_file() {
            debug!("Cache hit for {}:{} at {}", name, version, dest.display());
            return Ok(dest);
        }

        let dir = dest
            .parent()
            .ok_or_else(|| Error::IoError(format!("No parent for {}", dest.display())))?;
        fs::create_dir_all(dir).map_err(|e| {
            Error::IoError(format!("Failed to create directory {}: {e}", dir.display()))
        })?;

        let temp = NamedTempFile::new_in(dir).map_err(|e| {
            Error::IoError(format!("Failed to create temp file in {}: {e}", dir.display()))
        })?;

        // Dropping `temp` on error removes the partial file
        let bytes = self.fetcher.download_to(url, temp.path())?;

        temp.persist(&dest).map_err(|e| {
            Error::IoError(format!("Failed to move download to {}: {}", dest.display(), e.error))
        })?;

        info!("Cached {}:{} ({} bytes)", name, version, bytes);
        Ok(dest)
    }
}

/// Reject names and versions that would escape the cache directory
fn check_segment(segment: &str) -> Result<()> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
    {
        return Err(Error::ParseError(format!(
            "'{}' is not a valid artifact name or version",
            segment
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serves fixed bytes and counts requests
    struct CountingFetcher {
        body: Vec<u8>,
        fail: bool,
        calls: Mutex<Vec<String>>,
    }

    impl CountingFetcher {
        fn new(body: &[u8]) -> Self {
            Self {
                body: body.to_vec(),
                fail: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl Fetcher for CountingFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.calls.lock().unwrap().push(url.to_string());
            if self.fail {
                return Err(Error::DownloadError {
                    url: url.to_string(),
                    reason: "connection reset".to_string(),
                });
            }
            Ok(self.body.clone())
        }

        fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
            // Write something first so a failure leaves a partial temp file
            fs::write(dest, b"partial").unwrap();
            let bytes = self.fetch(url)?;
            fs::write(dest, &bytes).unwrap();
            Ok(bytes.len() as u64)
        }
    }

    #[test]
    fn test_fetch_downloads_once() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(CountingFetcher::new(b"archive"));
        let cache = ArtifactCache::new(dir.path().join("cache"), fetcher.clone(), RemoteLayout::default());

        let first = cache.fetch_artifact("git", "4.11.0").unwrap();
        let second = cache.fetch_artifact("git", "4.11.0").unwrap();

        assert_eq!(first, second);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(fs::read(&first).unwrap(), b"archive");
        assert!(first.ends_with("git/4.11.0/git.hpi"));
        assert!(cache.contains("git", "4.11.0"));
    }

    #[test]
    fn test_failed_download_leaves_no_entry() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(CountingFetcher {
            fail: true,
            ..CountingFetcher::new(b"")
        });
        let cache = ArtifactCache::new(dir.path(), fetcher, RemoteLayout::default());

        let err = cache.fetch_artifact("git", "1.0").unwrap_err();
        assert!(matches!(err, Error::DownloadError { .. }));
        assert!(!cache.contains("git", "1.0"));

        let entry_dir = dir.path().join("git").join("1.0");
        assert_eq!(fs::read_dir(&entry_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let cache = ArtifactCache::new(
            dir.path(),
            Arc::new(CountingFetcher::new(b"")),
            RemoteLayout::default(),
        );
        assert!(cache.entry_path("..", "1.0").is_err());
        assert!(cache.entry_path("git", "../../etc").is_err());
    }

    #[test]
    fn test_core_entry_uses_core_file_name() {
        let dir = TempDir::new().unwrap();
        let cache = ArtifactCache::new(
            dir.path(),
            Arc::new(CountingFetcher::new(b"war")),
            RemoteLayout::default(),
        );
        let path = cache.fetch_artifact("core", "2.300").unwrap();
        assert!(path.ends_with("core/2.300/jenkins.war"));
    }
}
