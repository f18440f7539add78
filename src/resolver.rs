// src/resolver.rs

//! Transitive dependency closure
//!
//! Resolution is an iterative breadth-first walk over batches of
//! `name:version` pairs:
//!
//! 1. Versioned requests become pins; unversioned requests resolve to the
//!    catalog's latest version. A request that exceeds another request's pin
//!    for the same name is checked like any dependency edge.
//! 2. Every pair in the batch not yet scanned is downloaded through the
//!    [`ArtifactCache`] and its manifest read. Downloads within a batch run
//!    on a bounded worker pool.
//! 3. Once the whole batch is in, mandatory edges are checked against the
//!    pins in batch order and merged into the closure, keeping the highest
//!    version per name. Optional edges are ignored entirely.
//! 4. Closure entries that are not yet scanned form the next batch.
//!
//! A dependency that exceeds its pin is a [`Error::PinConflict`], unless
//! fix-mode is on, in which case the higher version is kept and the
//! override reported.
//!
//! Pins are only ever compared with the version an edge declares. After a
//! fix-mode override nothing re-checks whether the overriding version pulls
//! in further conflicts through other names.

use crate::cache::ArtifactCache;
use crate::catalog::VersionCatalog;
use crate::error::{Error, Result};
use crate::manifest::{self, DependencyEdge};
use crate::plugin::{PinSet, PluginRef};
use crate::version::{PluginVersion, VersionOrdering};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// `required_by` of a conflict raised by the caller's own request list
pub const REQUESTED_BY: &str = "the request list";

/// Options for one resolver
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Downgrade pin conflicts to reported overrides
    pub fix: bool,
    /// Parallel downloads per batch
    pub jobs: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { fix: false, jobs: 4 }
    }
}

/// A pin exceeded by a dependency and overridden in fix-mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinOverride {
    pub name: String,
    pub pinned: String,
    pub required: String,
    pub required_by: String,
}

impl std::fmt::Display for PinOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} pinned to {} but {} requires {}",
            self.name, self.pinned, self.required_by, self.required
        )
    }
}

/// Result of one resolution run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    closure: BTreeMap<String, String>,
    overrides: Vec<PinOverride>,
    scanned: usize,
}

impl Resolution {
    /// Highest version per name
    pub fn closure(&self) -> &BTreeMap<String, String> {
        &self.closure
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.closure.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.closure.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closure.is_empty()
    }

    /// Pins overridden in fix-mode, in discovery order
    pub fn overrides(&self) -> &[PinOverride] {
        &self.overrides
    }

    /// Number of distinct `name:version` pairs downloaded and read
    pub fn scanned(&self) -> usize {
        self.scanned
    }

    /// Sorted `name:version` lines
    pub fn lines(&self) -> Vec<String> {
        self.closure
            .iter()
            .map(|(name, version)| format!("{}:{}", name, version))
            .collect()
    }
}

/// Mutable state of one run
struct ResolutionState {
    ordering: VersionOrdering,
    scanned: HashSet<(String, String)>,
    closure: BTreeMap<String, String>,
    overrides: Vec<PinOverride>,
}

impl ResolutionState {
    fn new(ordering: VersionOrdering) -> Self {
        Self {
            ordering,
            scanned: HashSet::new(),
            closure: BTreeMap::new(),
            overrides: Vec::new(),
        }
    }

    fn is_scanned(&self, name: &str, version: &str) -> bool {
        self.scanned.contains(&(name.to_string(), version.to_string()))
    }

    fn mark_scanned(&mut self, name: &str, version: &str) {
        self.scanned.insert((name.to_string(), version.to_string()));
    }

    /// Add `name:version`, dropping the lower of two same-name entries
    ///
    /// Every version is parsed, so a malformed one fails the run whether or
    /// not the name was already in the closure.
    fn merge(&mut self, name: &str, version: &str) -> Result<()> {
        let candidate = PluginVersion::parse(version)?;
        if let Some(existing) = self.closure.get(name) {
            let current = PluginVersion::parse(existing)?;
            if self.ordering.cmp_versions(&candidate, &current) != Ordering::Greater {
                return Ok(());
            }
            debug!("{}: {} supersedes {}", name, version, existing);
        }
        self.closure.insert(name.to_string(), version.to_string());
        Ok(())
    }

    /// Closure entries that still need scanning, for the given names
    fn pending_for<'a>(&self, names: impl IntoIterator<Item = &'a String>) -> Vec<(String, String)> {
        names
            .into_iter()
            .filter_map(|name| {
                let version = self.closure.get(name)?;
                (!self.is_scanned(name, version)).then(|| (name.clone(), version.clone()))
            })
            .collect()
    }

    fn into_resolution(self) -> Resolution {
        Resolution {
            closure: self.closure,
            overrides: self.overrides,
            scanned: self.scanned.len(),
        }
    }
}

/// Computes the mandatory dependency closure of a set of plugin requests
pub struct DependencyResolver {
    catalog: Arc<VersionCatalog>,
    cache: Arc<ArtifactCache>,
    options: ResolveOptions,
    pool: ThreadPool,
}

impl DependencyResolver {
    pub fn new(
        catalog: Arc<VersionCatalog>,
        cache: Arc<ArtifactCache>,
        options: ResolveOptions,
    ) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(options.jobs.max(1))
            .thread_name(|i| format!("plugdeps-fetch-{i}"))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to create worker pool: {e}")))?;

        Ok(Self {
            catalog,
            cache,
            options,
            pool,
        })
    }

    /// Reject (or in fix-mode record) `name:version` when it exceeds a pin
    fn check_pin(
        &self,
        pins: &PinSet,
        state: &mut ResolutionState,
        name: &str,
        version: &str,
        required_by: &str,
    ) -> Result<()> {
        let Some(pinned) = pins.get(name) else {
            return Ok(());
        };
        if state.ordering.compare(version, pinned)? != Ordering::Greater {
            return Ok(());
        }

        let conflict = PinOverride {
            name: name.to_string(),
            pinned: pinned.to_string(),
            required: version.to_string(),
            required_by: required_by.to_string(),
        };
        if !self.options.fix {
            return Err(Error::PinConflict {
                name: conflict.name,
                pinned: conflict.pinned,
                required: conflict.required,
                required_by: conflict.required_by,
            });
        }
        warn!("Overriding pin: {}", conflict);
        state.overrides.push(conflict);
        Ok(())
    }

    /// Download `name:version` (cached) and read its declared edges
    fn scan(&self, name: &str, version: &str) -> Result<Vec<DependencyEdge>> {
        let path = self.cache.fetch_artifact(name, version)?;
        manifest::read_dependencies(&path)
    }

    /// Resolve unversioned requests to the catalog's latest version
    fn normalize(&self, requests: &[PluginRef]) -> Result<Vec<(String, String)>> {
        let resolved: Vec<Result<(String, String)>> = self.pool.install(|| {
            requests
                .par_iter()
                .map(|request| match request.version {
                    Some(ref version) => Ok((request.name.clone(), version.clone())),
                    None => {
                        let latest = self.catalog.latest(&request.name)?;
                        debug!("{} resolved to latest {}", request.name, latest);
                        Ok((request.name.clone(), latest))
                    }
                })
                .collect()
        });

        let mut seen = HashSet::new();
        let mut batch = Vec::new();
        for pair in resolved {
            let pair = pair?;
            if seen.insert(pair.clone()) {
                batch.push(pair);
            }
        }
        Ok(batch)
    }

    /// Compute the closure of `requests`
    pub fn resolve(&self, requests: &[PluginRef]) -> Result<Resolution> {
        let pins = PinSet::from_refs(requests);
        let ordering = self.catalog.ordering();
        let mut state = ResolutionState::new(ordering);

        let requested = self.normalize(requests)?;
        for (name, version) in &requested {
            self.check_pin(&pins, &mut state, name, version, REQUESTED_BY)?;
            state.merge(name, version)?;
        }
        let names: BTreeSet<&String> = requested.iter().map(|(name, _)| name).collect();
        let mut batch = state.pending_for(names);

        let mut depth = 0;
        while !batch.is_empty() {
            depth += 1;
            batch.retain(|(name, version)| !state.is_scanned(name, version));
            if batch.is_empty() {
                break;
            }
            debug!("Batch {}: scanning {} artifacts", depth, batch.len());

            let fetched: Vec<Result<Vec<DependencyEdge>>> = self.pool.install(|| {
                batch
                    .par_iter()
                    .map(|(name, version)| self.scan(name, version))
                    .collect()
            });

            let mut touched = BTreeSet::new();
            for ((name, version), edges) in batch.iter().zip(fetched) {
                let edges = edges?;
                let mut direct = Vec::new();

                let required_by = format!("{}:{}", name, version);
                for edge in edges.into_iter().filter(|e| !e.optional) {
                    self.check_pin(&pins, &mut state, &edge.name, &edge.version, &required_by)?;
                    state.merge(&edge.name, &edge.version)?;
                    direct.push(format!("{}:{}", edge.name, edge.version));
                    touched.insert(edge.name);
                }

                state.mark_scanned(name, version);
                info!(
                    "{}:{} depends on [{}]; closure so far [{}]",
                    name,
                    version,
                    direct.join(" "),
                    state
                        .closure
                        .iter()
                        .map(|(n, v)| format!("{}:{}", n, v))
                        .collect::<Vec<_>>()
                        .join(" ")
                );
            }

            // Names from this batch whose winning version is still unscanned,
            // plus requests superseded by a higher version
            let names: Vec<String> = touched
                .into_iter()
                .chain(batch.iter().map(|(name, _)| name.clone()))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            batch = state.pending_for(&names);
        }

        let resolution = state.into_resolution();
        info!(
            "Resolved {} artifacts ({} scanned, {} pin overrides)",
            resolution.len(),
            resolution.scanned(),
            resolution.overrides().len()
        );
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_highest() {
        let mut state = ResolutionState::new(VersionOrdering::Numeric);
        state.merge("a", "1.0").unwrap();
        state.merge("a", "2.10").unwrap();
        state.merge("a", "2.9").unwrap();
        assert_eq!(state.closure.get("a").map(String::as_str), Some("2.10"));
    }

    #[test]
    fn test_merge_rejects_malformed_version_for_new_name() {
        let mut state = ResolutionState::new(VersionOrdering::Numeric);
        assert!(matches!(state.merge("x", "1.2-beta"), Err(Error::ParseError(_))));
        assert!(state.closure.is_empty());

        state.merge("x", "1.0").unwrap();
        assert!(matches!(state.merge("x", "1.2-beta"), Err(Error::ParseError(_))));
        assert_eq!(state.closure.get("x").map(String::as_str), Some("1.0"));
    }

    #[test]
    fn test_scanned_is_exact_pair_membership() {
        let mut state = ResolutionState::new(VersionOrdering::Numeric);
        state.mark_scanned("git", "1.0");
        assert!(state.is_scanned("git", "1.0"));
        assert!(!state.is_scanned("git-client", "1.0"));
        assert!(!state.is_scanned("git", "1.0.1"));
        assert!(!state.is_scanned("gi", "1.0"));
    }

    #[test]
    fn test_pending_skips_scanned_winners() {
        let mut state = ResolutionState::new(VersionOrdering::Numeric);
        state.merge("a", "1.0").unwrap();
        state.merge("b", "2.0").unwrap();
        state.mark_scanned("a", "1.0");
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(state.pending_for(&names), vec![("b".to_string(), "2.0".to_string())]);
    }

    #[test]
    fn test_resolution_lines_sorted() {
        let mut state = ResolutionState::new(VersionOrdering::Numeric);
        state.merge("zeta", "1.0").unwrap();
        state.merge("alpha", "3.0").unwrap();
        let resolution = state.into_resolution();
        assert_eq!(resolution.lines(), vec!["alpha:3.0", "zeta:1.0"]);
    }
}
