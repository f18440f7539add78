// src/remote/layout.rs

//! URL layout of the remote artifact store
//!
//! Plugins live under `{plugins_url}/{name}/{version}/{name}.{ext}`; the host
//! application (`core`) lives under a separate base,
//! `{core_url}/{version}/{core_artifact}.{ext}`.

use crate::config::RemoteConfig;
use crate::plugin::CORE_NAME;

/// Maps artifact names and versions to listing and download URLs
#[derive(Debug, Clone)]
pub struct RemoteLayout {
    config: RemoteConfig,
}

impl RemoteLayout {
    pub fn new(config: RemoteConfig) -> Self {
        Self { config }
    }

    fn is_core(name: &str) -> bool {
        name == CORE_NAME
    }

    /// Directory listing that enumerates published versions of `name`
    pub fn listing_url(&self, name: &str) -> String {
        if Self::is_core(name) {
            format!("{}/", trim_base(&self.config.core_url))
        } else {
            format!("{}/{}/", trim_base(&self.config.plugins_url), name)
        }
    }

    /// Package extension for `name` (`hpi` for plugins, `war` for core)
    pub fn extension(&self, name: &str) -> &str {
        if Self::is_core(name) {
            &self.config.core_extension
        } else {
            &self.config.plugin_extension
        }
    }

    /// File name of the package for `name`
    pub fn file_name(&self, name: &str) -> String {
        let stem = if Self::is_core(name) {
            self.config.core_artifact.as_str()
        } else {
            name
        };
        format!("{}.{}", stem, self.extension(name))
    }

    /// Download URL of `name` at `version`
    pub fn artifact_url(&self, name: &str, version: &str) -> String {
        if Self::is_core(name) {
            format!(
                "{}/{}/{}",
                trim_base(&self.config.core_url),
                version,
                self.file_name(name)
            )
        } else {
            format!(
                "{}/{}/{}/{}",
                trim_base(&self.config.plugins_url),
                name,
                version,
                self.file_name(name)
            )
        }
    }

    /// Advisory feed URL
    pub fn feed_url(&self) -> &str {
        &self.config.feed_url
    }
}

impl Default for RemoteLayout {
    fn default() -> Self {
        Self::new(RemoteConfig::default())
    }
}

fn trim_base(url: &str) -> &str {
    url.trim_end_matches('/')
}
