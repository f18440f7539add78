// src/catalog.rs

//! Published version catalog
//!
//! Versions of an artifact are discovered by scanning the remote directory
//! listing for links to the artifact's package file. The list is ordered
//! newest first, so [`VersionCatalog::next`] steps toward older releases
//! and [`VersionCatalog::prev`] toward newer ones.
//!
//! Listings are fetched fresh on every call; nothing is cached.

use crate::error::{Error, Result};
use crate::remote::{Fetcher, RemoteLayout};
use crate::version::{LEGACY_FIELD_LIMIT, PluginVersion, VersionOrdering};
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).unwrap());

/// Extract version path segments from a directory listing
///
/// Every link whose path ends in `/{version}/{file_name}` contributes
/// `{version}`. Results keep listing order with duplicates removed.
pub fn parse_listing(listing: &str, file_name: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut versions = Vec::new();

    for caps in HREF_RE.captures_iter(listing) {
        let href = &caps[1];
        let path = href.split(['?', '#']).next().unwrap_or(href);
        let mut segments = path.rsplit('/');
        if segments.next() != Some(file_name) {
            continue;
        }
        let Some(version) = segments.next() else {
            continue;
        };
        if !version.is_empty() && seen.insert(version.to_string()) {
            versions.push(version.to_string());
        }
    }

    versions
}

/// Sort version strings newest first
///
/// Strings that are not dotted-numeric cannot be ordered and are dropped.
/// Of several strings that compare equal, the first one listed is kept.
/// Versions outside the legacy packed range are reported once here.
pub fn sort_descending(versions: Vec<String>, ordering: VersionOrdering) -> Vec<String> {
    let mut parsed: Vec<PluginVersion> = versions
        .into_iter()
        .filter_map(|v| match PluginVersion::parse(&v) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Skipping unorderable version '{}': {}", v, e);
                None
            }
        })
        .collect();

    let anomalies: Vec<&str> = parsed
        .iter()
        .filter(|v| v.exceeds_legacy_range())
        .map(PluginVersion::as_str)
        .collect();
    if !anomalies.is_empty() {
        warn!(
            "Versions with a component >= {}: {} (legacy packed ordering would misplace them)",
            LEGACY_FIELD_LIMIT,
            anomalies.join(", ")
        );
    }

    parsed.sort_by(|a, b| ordering.cmp_versions(b, a));
    parsed.dedup_by(|later, earlier| {
        ordering.cmp_versions(earlier, later) == std::cmp::Ordering::Equal
    });
    parsed.into_iter().map(|v| v.as_str().to_string()).collect()
}

/// Lists and navigates published versions of named artifacts
pub struct VersionCatalog {
    fetcher: Arc<dyn Fetcher>,
    layout: RemoteLayout,
    ordering: VersionOrdering,
}

impl VersionCatalog {
    pub fn new(fetcher: Arc<dyn Fetcher>, layout: RemoteLayout, ordering: VersionOrdering) -> Self {
        Self {
            fetcher,
            layout,
            ordering,
        }
    }

    pub fn ordering(&self) -> VersionOrdering {
        self.ordering
    }

    /// All published versions of `name`, newest first
    pub fn list_versions(&self, name: &str) -> Result<Vec<String>> {
        let url = self.layout.listing_url(name);
        let listing = match self.fetcher.fetch_text(&url) {
            Ok(listing) => listing,
            Err(Error::NotFound(_)) => {
                return Err(Error::NotFound(format!("Unknown artifact '{}'", name)));
            }
            Err(e) => return Err(e),
        };

        let versions = sort_descending(
            parse_listing(&listing, &self.layout.file_name(name)),
            self.ordering,
        );
        if versions.is_empty() {
            return Err(Error::NotFound(format!(
                "No published versions of '{}' at {}",
                name, url
            )));
        }

        debug!("{} has {} published versions", name, versions.len());
        Ok(versions)
    }

    /// Newest published version of `name`
    pub fn latest(&self, name: &str) -> Result<String> {
        let versions = self.list_versions(name)?;
        Ok(versions[0].clone())
    }

    /// The release immediately older than `version`
    pub fn next(&self, name: &str, version: &str) -> Result<String> {
        let versions = self.list_versions(name)?;
        let index = self.position(&versions, name, version)?;
        versions.get(index + 1).cloned().ok_or_else(|| {
            Error::NotFound(format!("{}:{} is the oldest published version", name, version))
        })
    }

    /// The release immediately newer than `version`
    pub fn prev(&self, name: &str, version: &str) -> Result<String> {
        let versions = self.list_versions(name)?;
        let index = self.position(&versions, name, version)?;
        if index == 0 {
            return Err(Error::NotFound(format!(
                "{}:{} is the newest published version",
                name, version
            )));
        }
        Ok(versions[index - 1].clone())
    }

    /// Oldest published version strictly newer than `threshold`
    ///
    /// Equivalent to [`prev`](Self::prev) when `threshold` is itself
    /// published, but also works for thresholds missing from the listing.
    pub fn first_above(&self, name: &str, threshold: &str) -> Result<String> {
        let threshold_version = PluginVersion::parse(threshold)?;
        let versions = self.list_versions(name)?;
        versions
            .iter()
            .rev()
            .find(|v| {
                PluginVersion::parse(v).is_ok_and(|parsed| {
                    self.ordering.cmp_versions(&parsed, &threshold_version)
                        == std::cmp::Ordering::Greater
                })
            })
            .cloned()
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "No published version of '{}' newer than {}",
                    name, threshold
                ))
            })
    }

    fn position(&self, versions: &[String], name: &str, version: &str) -> Result<usize> {
        if let Some(index) = versions.iter().position(|v| v == version) {
            return Ok(index);
        }
        let wanted = PluginVersion::parse(version)?;
        versions
            .iter()
            .position(|v| {
                PluginVersion::parse(v).is_ok_and(|parsed| {
                    self.ordering.cmp_versions(&parsed, &wanted) == std::cmp::Ordering::Equal
                })
            })
            .ok_or_else(|| {
                Error::NotFound(format!("{}:{} is not a published version", name, version))
            })
    }
}
