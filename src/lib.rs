// src/lib.rs

//! Plugdeps
//!
//! Transitive plugin dependency resolution for a plugin-based application
//! distribution, plus version navigation and known-vulnerability lookup.
//!
//! # Architecture
//!
//! - `version`: dotted numeric version ordering
//! - `catalog`: published versions from remote directory listings
//! - `vulnerability`: advisory feed and threshold checks
//! - `cache`: name+version keyed local package cache
//! - `manifest`: `Plugin-Dependencies` extraction from plugin archives
//! - `resolver`: cycle-safe, pin-aware closure computation

pub mod cache;
pub mod catalog;
pub mod config;
mod error;
pub mod manifest;
pub mod plugin;
pub mod remote;
pub mod resolver;
pub mod session;
pub mod version;
pub mod vulnerability;

pub use cache::ArtifactCache;
pub use catalog::VersionCatalog;
pub use config::{Config, NetworkConfig, RemoteConfig};
pub use error::{Error, Result};
pub use manifest::DependencyEdge;
pub use plugin::{CORE_NAME, PinSet, PluginRef};
pub use remote::{FetchOptions, Fetcher, HttpFetcher, RemoteLayout};
pub use resolver::{DependencyResolver, PinOverride, Resolution, ResolveOptions};
pub use session::Session;
pub use version::{PluginVersion, VersionOrdering};
pub use vulnerability::{Advisory, Threshold, VulnerabilityIndex, VulnerabilityRecord};
