// src/plugin.rs

//! Plugin references and caller pins
//!
//! A reference is written `name[:version]`. The version part may carry a
//! distribution-line marker such as `LTS 2.300`; the marker is stripped when
//! the reference is parsed and has no ordering semantics.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Reserved name for the host application itself
pub const CORE_NAME: &str = "core";

/// One artifact, optionally at an exact version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginRef {
    pub name: String,
    pub version: Option<String>,
}

impl PluginRef {
    pub fn new(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// Reference pinned to an exact version
    pub fn versioned(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(name, Some(version.into()))
    }

    /// Parse a `name[:version]` token
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        let (name, version) = match token.split_once(':') {
            Some((name, version)) => {
                let version = strip_line_marker(version);
                if version.is_empty() {
                    return Err(Error::ParseError(format!(
                        "Empty version in reference '{}'",
                        token
                    )));
                }
                (name.trim(), Some(version.to_string()))
            }
            None => (token, None),
        };

        if name.is_empty() {
            return Err(Error::ParseError(format!(
                "Missing artifact name in reference '{}'",
                token
            )));
        }

        Ok(Self::new(name, version))
    }

    /// Whether this reference names the host application
    pub fn is_core(&self) -> bool {
        self.name == CORE_NAME
    }
}

impl fmt::Display for PluginRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(ref version) => write!(f, "{}:{}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}

impl FromStr for PluginRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Remove a leading distribution-line marker from a version
///
/// `"LTS 2.300"`, `"lts-2.300"` and `"LTS:2.300"` all become `"2.300"`.
/// Strings that already start with a digit are returned trimmed.
pub fn strip_line_marker(version: &str) -> &str {
    let version = version.trim();
    let marker_len = version
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(version.len());
    if marker_len == 0 {
        return version;
    }

    let rest = &version[marker_len..];
    let stripped = rest.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '_' | ':'));
    if stripped.len() < rest.len() && stripped.starts_with(|c: char| c.is_ascii_digit()) {
        stripped
    } else {
        version
    }
}

/// Exact versions the caller fixed; read-only during a resolution run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinSet {
    pins: BTreeMap<String, String>,
}

impl PinSet {
    /// Build pins from the caller's initial references
    ///
    /// Every versioned reference is a pin; bare names are not. When the same
    /// name is pinned twice the first pin is kept.
    pub fn from_refs(refs: &[PluginRef]) -> Self {
        let mut pins = BTreeMap::new();
        for plugin in refs {
            let Some(ref version) = plugin.version else {
                continue;
            };
            match pins.get(&plugin.name) {
                Some(existing) if existing != version => {
                    warn!(
                        "{} pinned twice ({} and {}), keeping {}",
                        plugin.name, existing, version, existing
                    );
                }
                Some(_) => {}
                None => {
                    pins.insert(plugin.name.clone(), version.clone());
                }
            }
        }
        Self { pins }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pins.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}
