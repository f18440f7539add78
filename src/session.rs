// src/session.rs

//! Per-invocation wiring of catalog, cache, advisory index and resolver
//!
//! A [`Session`] owns everything whose lifetime is one command invocation:
//! the fetched advisory feed, and the ephemeral cache directory used when no
//! cache location is configured.

use crate::cache::ArtifactCache;
use crate::catalog::VersionCatalog;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::remote::{FetchOptions, Fetcher, HttpFetcher, RemoteLayout};
use crate::resolver::{DependencyResolver, ResolveOptions};
use crate::vulnerability::VulnerabilityIndex;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::debug;

/// Components shared by all commands of one invocation
pub struct Session {
    config: Config,
    catalog: Arc<VersionCatalog>,
    cache: Arc<ArtifactCache>,
    vulnerabilities: VulnerabilityIndex,
    // Keeps an ephemeral cache alive until the session ends
    _ephemeral_cache: Option<TempDir>,
}

impl Session {
    /// Build a session that talks HTTP
    pub fn new(config: Config, show_progress: bool) -> Result<Self> {
        let options = FetchOptions {
            show_progress,
            ..FetchOptions::from(&config.network)
        };
        let fetcher = Arc::new(HttpFetcher::new(options)?);
        Self::with_fetcher(config, fetcher)
    }

    /// Build a session on top of any fetcher
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let layout = RemoteLayout::new(config.remote.clone());
        let ordering = config.ordering();

        let (cache_root, ephemeral) = match config.cache_dir {
            Some(ref dir) => {
                fs::create_dir_all(dir).map_err(|e| {
                    Error::IoError(format!("Failed to create cache directory {}: {e}", dir.display()))
                })?;
                (dir.clone(), None)
            }
            None => {
                let temp = tempfile::Builder::new()
                    .prefix("plugdeps-cache-")
                    .tempdir()
                    .map_err(|e| Error::IoError(format!("Failed to create temp cache: {e}")))?;
                debug!("Using ephemeral cache at {}", temp.path().display());
                (temp.path().to_path_buf(), Some(temp))
            }
        };

        let catalog = Arc::new(VersionCatalog::new(fetcher.clone(), layout.clone(), ordering));
        let cache = Arc::new(ArtifactCache::new(cache_root, fetcher.clone(), layout.clone()));
        let vulnerabilities = VulnerabilityIndex::new(fetcher, layout.feed_url(), ordering);

        Ok(Self {
            config,
            catalog,
            cache,
            vulnerabilities,
            _ephemeral_cache: ephemeral,
        })
    }

    pub fn catalog(&self) -> &VersionCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    pub fn cache_dir(&self) -> &Path {
        self.cache.root()
    }

    pub fn vulnerabilities(&self) -> &VulnerabilityIndex {
        &self.vulnerabilities
    }

    /// Resolver using this session's catalog and cache
    pub fn resolver(&self, fix: bool) -> Result<DependencyResolver> {
        DependencyResolver::new(
            self.catalog.clone(),
            self.cache.clone(),
            ResolveOptions {
                fix,
                jobs: self.config.network.jobs,
            },
        )
    }
}
