// src/vulnerability.rs

//! Known-vulnerable version lookup
//!
//! The advisory feed is a JSON document, usually wrapped in a JSONP call
//! expression (`updateCenter.post( ... );`). Each advisory names an
//! artifact and lists the last affected version of every vulnerable range.
//! A version is vulnerable when it is at or below any threshold; an
//! advisory without a threshold flags every version of the artifact.
//!
//! The feed is fetched once per [`VulnerabilityIndex`], which lives for a
//! single command invocation.

use crate::catalog::VersionCatalog;
use crate::error::{Error, Result};
use crate::plugin::{CORE_NAME, strip_line_marker};
use crate::remote::Fetcher;
use crate::version::{PluginVersion, VersionOrdering};
use serde::Deserialize;
use std::cmp::Ordering;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// One vulnerable range of one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VulnerabilityRecord {
    pub name: String,
    /// Highest affected version; `None` means every version is affected
    pub threshold_version: Option<String>,
}

/// Advisory metadata used for human-readable reports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Advisory {
    pub id: Option<String>,
    pub name: String,
    pub url: Option<String>,
    pub message: Option<String>,
    pub records: Vec<VulnerabilityRecord>,
}

/// Highest known-vulnerable version of an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Threshold {
    /// No advisory mentions the artifact
    None,
    /// Some advisory flags every version
    AllVersions,
    /// Versions at or below this one are vulnerable
    UpTo(String),
}

#[derive(Debug, Deserialize)]
struct FeedDocument {
    #[serde(default)]
    warnings: Vec<FeedWarning>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedWarning {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    name: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    versions: Vec<FeedVersionRange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedVersionRange {
    #[serde(default)]
    last_version: Option<String>,
}

/// Remove a JSONP call wrapper, if any
///
/// `updateCenter.post(\n{...}\n);` becomes `{...}`. Plain JSON is returned
/// unchanged.
pub fn strip_call_wrapper(document: &str) -> &str {
    let trimmed = document.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }
    match (trimmed.find('('), trimmed.rfind(')')) {
        (Some(open), Some(close)) if open < close => trimmed[open + 1..close].trim(),
        _ => trimmed,
    }
}

/// Parse an advisory feed document
pub fn parse_feed(document: &str) -> Result<Vec<Advisory>> {
    let payload = strip_call_wrapper(document);
    let feed: FeedDocument = serde_json::from_str(payload)
        .map_err(|e| Error::ParseError(format!("Invalid advisory feed: {e}")))?;

    let advisories = feed
        .warnings
        .into_iter()
        .map(|warning| {
            let name = if warning.kind.as_deref() == Some("core") {
                CORE_NAME.to_string()
            } else {
                warning.name
            };

            let mut records: Vec<VulnerabilityRecord> = warning
                .versions
                .into_iter()
                .map(|range| VulnerabilityRecord {
                    name: name.clone(),
                    threshold_version: range
                        .last_version
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty()),
                })
                .collect();
            if records.is_empty() {
                records.push(VulnerabilityRecord {
                    name: name.clone(),
                    threshold_version: None,
                });
            }

            Advisory {
                id: warning.id,
                name,
                url: warning.url,
                message: warning.message,
                records,
            }
        })
        .collect();

    Ok(advisories)
}

/// Answers "is artifact@version known to be vulnerable"
pub struct VulnerabilityIndex {
    fetcher: Arc<dyn Fetcher>,
    feed_url: String,
    ordering: VersionOrdering,
    advisories: OnceLock<Vec<Advisory>>,
}

impl VulnerabilityIndex {
    pub fn new(fetcher: Arc<dyn Fetcher>, feed_url: impl Into<String>, ordering: VersionOrdering) -> Self {
        Self {
            fetcher,
            feed_url: feed_url.into(),
            ordering,
            advisories: OnceLock::new(),
        }
    }

    /// Build an index from an already-parsed feed (no network access)
    pub fn from_advisories(advisories: Vec<Advisory>, ordering: VersionOrdering) -> Self {
        struct Offline;
        impl Fetcher for Offline {
            fn fetch(&self, url: &str) -> Result<Vec<u8>> {
                Err(Error::NotFound(url.to_string()))
            }
        }

        let index = Self::new(Arc::new(Offline), "", ordering);
        let _ = index.advisories.set(advisories);
        index
    }

    /// Every advisory in the feed, fetched on first use
    pub fn fetch_all(&self) -> Result<&[Advisory]> {
        if let Some(advisories) = self.advisories.get() {
            return Ok(advisories);
        }

        info!("Fetching advisory feed from {}", self.feed_url);
        let document = self.fetcher.fetch_text(&self.feed_url)?;
        let advisories = parse_feed(&document)?;
        debug!("Advisory feed lists {} advisories", advisories.len());

        Ok(self.advisories.get_or_init(|| advisories))
    }

    /// Every vulnerable-range record in the feed
    pub fn records(&self) -> Result<Vec<&VulnerabilityRecord>> {
        Ok(self.fetch_all()?.iter().flat_map(|a| a.records.iter()).collect())
    }

    /// Advisories that mention `name`
    pub fn advisories(&self, name: &str) -> Result<Vec<&Advisory>> {
        Ok(self.fetch_all()?.iter().filter(|a| a.name == name).collect())
    }

    /// Parse a threshold, skipping ones that cannot be ordered
    fn parse_threshold(record: &VulnerabilityRecord, threshold: &str) -> Option<PluginVersion> {
        match PluginVersion::parse(threshold) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(
                    "Ignoring advisory threshold '{}' for {}: {}",
                    threshold, record.name, e
                );
                None
            }
        }
    }

    /// Whether `name` at `version` is at or below a known-vulnerable threshold
    ///
    /// A leading distribution-line marker on `version` (e.g. `LTS 2.300`)
    /// is stripped before comparison.
    pub fn is_vulnerable(&self, name: &str, version: &str) -> Result<bool> {
        let version = PluginVersion::parse(strip_line_marker(version))?;

        for record in self.records()? {
            if record.name != name {
                continue;
            }
            let Some(ref threshold) = record.threshold_version else {
                debug!("{} flagged vulnerable in every version", name);
                return Ok(true);
            };
            if let Some(threshold) = Self::parse_threshold(record, threshold)
                && self.ordering.cmp_versions(&version, &threshold) != Ordering::Greater
            {
                debug!("{}:{} is at or below threshold {}", name, version, threshold);
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Highest known-vulnerable version of `name` across all its records
    pub fn max_threshold(&self, name: &str) -> Result<Threshold> {
        let mut highest: Option<PluginVersion> = None;

        for record in self.records()? {
            if record.name != name {
                continue;
            }
            let Some(ref threshold) = record.threshold_version else {
                return Ok(Threshold::AllVersions);
            };
            let Some(threshold) = Self::parse_threshold(record, threshold) else {
                continue;
            };
            let replace = highest
                .as_ref()
                .is_none_or(|h| self.ordering.cmp_versions(&threshold, h) == Ordering::Greater);
            if replace {
                highest = Some(threshold);
            }
        }

        Ok(match highest {
            Some(v) => Threshold::UpTo(v.as_str().to_string()),
            None => Threshold::None,
        })
    }

    /// First published version above the highest known-vulnerable one
    ///
    /// Returns `None` when no advisory mentions `name`, meaning the caller's
    /// own version (or latest) should be used. Fails with `NotFound` when
    /// every version is flagged or nothing newer than the threshold exists.
    pub fn last_secure_version(&self, name: &str, catalog: &VersionCatalog) -> Result<Option<String>> {
        match self.max_threshold(name)? {
            Threshold::None => Ok(None),
            Threshold::AllVersions => Err(Error::NotFound(format!(
                "Every version of '{}' is flagged vulnerable",
                name
            ))),
            Threshold::UpTo(threshold) => {
                let secure = catalog.first_above(name, &threshold)?;
                debug!("{}: last vulnerable {}, first secure {}", name, threshold, secure);
                Ok(Some(secure))
            }
        }
    }
}
