// src/version/mod.rs

//! Version parsing and ordering for plugin artifacts
//!
//! Plugin and core versions are dotted numeric strings with up to four
//! components (`major.minor.patch.build`). Missing trailing components are
//! treated as zero, so `2.1` and `2.1.0` compare equal.
//!
//! Components are compared as arbitrary-precision integers. The legacy
//! packed-integer key is still available through [`VersionOrdering::LegacyPacked`]
//! for callers that must reproduce previously generated output.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Maximum number of dot-separated components in a version
pub const MAX_COMPONENTS: usize = 4;

/// Components at or above this value do not fit the legacy packed layout
pub const LEGACY_FIELD_LIMIT: u64 = 1000;

/// A parsed plugin version
#[derive(Debug, Clone)]
pub struct PluginVersion {
    raw: String,
    /// Decimal digits of each component with leading zeros stripped,
    /// always padded to `MAX_COMPONENTS` entries
    components: Vec<String>,
}

impl PluginVersion {
    /// Parse a dotted numeric version string
    ///
    /// Examples:
    /// - "2.300" → [2, 300, 0, 0]
    /// - "1.2.3.4" → [1, 2, 3, 4]
    /// - "007.1" → [7, 1, 0, 0]
    pub fn parse(s: &str) -> Result<Self> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(Error::ParseError("Empty version string".to_string()));
        }

        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() > MAX_COMPONENTS {
            return Err(Error::ParseError(format!(
                "Version '{}' has {} components (at most {} allowed)",
                raw,
                parts.len(),
                MAX_COMPONENTS
            )));
        }

        let mut components = Vec::with_capacity(MAX_COMPONENTS);
        for part in parts {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::ParseError(format!(
                    "Invalid component '{}' in version '{}'",
                    part, raw
                )));
            }
            let digits = part.trim_start_matches('0');
            components.push(if digits.is_empty() {
                "0".to_string()
            } else {
                digits.to_string()
            });
        }
        components.resize(MAX_COMPONENTS, "0".to_string());

        Ok(Self {
            raw: raw.to_string(),
            components,
        })
    }

    /// The string this version was parsed from
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether any component is outside the 0-999 range of the legacy key
    pub fn exceeds_legacy_range(&self) -> bool {
        self.components
            .iter()
            .any(|c| c.len() > 3 || c.parse::<u64>().map_or(true, |v| v >= LEGACY_FIELD_LIMIT))
    }

    /// Legacy packed key: `((major*1000 + minor)*1000 + patch)*1000 + build`
    ///
    /// Components >= 1000 carry into the neighboring field, reproducing the
    /// ordering the legacy design produced for such data.
    pub fn packed_key(&self) -> u128 {
        self.components.iter().fold(0u128, |acc, c| {
            let value = c.parse::<u128>().unwrap_or(u128::MAX);
            acc.wrapping_mul(LEGACY_FIELD_LIMIT as u128)
                .wrapping_add(value)
        })
    }

    /// Component-wise numeric comparison
    pub fn compare(&self, other: &PluginVersion) -> Ordering {
        for (a, b) in self.components.iter().zip(other.components.iter()) {
            // Normalized digit strings: longer means larger, then lexical
            match a.len().cmp(&b.len()).then_with(|| a.cmp(b)) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for PluginVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for PluginVersion {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for PluginVersion {}

impl Hash for PluginVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.components.hash(state);
    }
}

impl Ord for PluginVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for PluginVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// How version strings are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionOrdering {
    /// Arbitrary-precision component-wise comparison
    #[default]
    Numeric,
    /// Fixed-width packed integer key (byte-for-byte legacy compatibility)
    LegacyPacked,
}

impl VersionOrdering {
    /// Select the ordering from the `legacy_version_packing` setting
    pub fn from_legacy_flag(legacy: bool) -> Self {
        if legacy {
            VersionOrdering::LegacyPacked
        } else {
            VersionOrdering::Numeric
        }
    }

    /// Compare two parsed versions
    pub fn cmp_versions(&self, a: &PluginVersion, b: &PluginVersion) -> Ordering {
        match self {
            VersionOrdering::Numeric => a.compare(b),
            VersionOrdering::LegacyPacked => a.packed_key().cmp(&b.packed_key()),
        }
    }

    /// Parse and compare two version strings
    pub fn compare(&self, a: &str, b: &str) -> Result<Ordering> {
        let a = PluginVersion::parse(a)?;
        let b = PluginVersion::parse(b)?;
        Ok(self.cmp_versions(&a, &b))
    }

    /// Return the higher of two version strings (the first on a tie)
    pub fn max<'a>(&self, a: &'a str, b: &'a str) -> Result<&'a str> {
        Ok(match self.compare(a, b)? {
            Ordering::Less => b,
            _ => a,
        })
    }
}

/// Compare two version strings with the default numeric ordering
pub fn compare(a: &str, b: &str) -> Result<Ordering> {
    VersionOrdering::Numeric.compare(a, b)
}
