// src/manifest.rs

//! Dependency extraction from plugin archives
//!
//! Plugin packages are zip archives carrying `META-INF/MANIFEST.MF`. The
//! `Plugin-Dependencies` attribute lists dependencies as comma-separated
//! `name:version[;resolution:=optional]` tuples. Manifest lines are folded
//! at 72 bytes: a line starting with a single space continues the previous
//! one, and folding must be undone before the attribute is read.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

/// Archive entry holding the manifest
pub const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";

/// Attribute listing plugin dependencies
pub const DEPENDENCIES_ATTRIBUTE: &str = "Plugin-Dependencies";

const OPTIONAL_MARKER: &str = "resolution:=optional";

/// One declared dependency of an artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    pub name: String,
    pub version: String,
    pub optional: bool,
}

impl DependencyEdge {
    pub fn new(name: impl Into<String>, version: impl Into<String>, optional: bool) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            optional,
        }
    }
}

impl std::fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.version)?;
        if self.optional {
            write!(f, ";{}", OPTIONAL_MARKER)?;
        }
        Ok(())
    }
}

/// Read the declared dependencies of a downloaded plugin archive
pub fn read_dependencies(artifact: &Path) -> Result<Vec<DependencyEdge>> {
    let manifest = read_manifest(artifact)?;
    let edges = parse_manifest(&manifest)?;
    debug!(
        "{} declares {} dependencies",
        artifact.display(),
        edges.len()
    );
    Ok(edges)
}

/// Extract the manifest text from an archive
pub fn read_manifest(artifact: &Path) -> Result<String> {
    let file = File::open(artifact).map_err(|e| {
        Error::IoError(format!("Failed to open {}: {}", artifact.display(), e))
    })?;
    let mut archive = ZipArchive::new(file).map_err(|e| {
        Error::ParseError(format!("{} is not a valid archive: {}", artifact.display(), e))
    })?;

    let mut entry = match archive.by_name(MANIFEST_ENTRY) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(Error::ParseError(format!(
                "{} has no {}",
                artifact.display(),
                MANIFEST_ENTRY
            )));
        }
        Err(e) => {
            return Err(Error::ParseError(format!(
                "Failed to read {} from {}: {}",
                MANIFEST_ENTRY,
                artifact.display(),
                e
            )));
        }
    };

    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).map_err(|e| {
        Error::ParseError(format!("Failed to read {}: {}", MANIFEST_ENTRY, e))
    })?;
    Ok(String::from_utf8_lossy(&unfold_bytes(&bytes)).into_owned())
}

/// Join folded lines before decoding
///
/// The 72-byte fold may split a multibyte character, so continuation breaks
/// (a line break followed by one space) are removed from the raw bytes.
pub fn unfold_bytes(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let fold = match &raw[i..] {
            [b'\r', b'\n', b' ', ..] => 3,
            [b'\n', b' ', ..] | [b'\r', b' ', ..] => 2,
            _ => 0,
        };
        if fold > 0 {
            i += fold;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    out
}

/// Undo manifest line folding
///
/// Returns logical lines; a physical line starting with one space is
/// appended (without that space) to the previous logical line.
pub fn unfold_lines(manifest: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in manifest.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        match (line.strip_prefix(' '), lines.last_mut()) {
            (Some(continuation), Some(last)) => last.push_str(continuation),
            _ => lines.push(line.to_string()),
        }
    }
    lines
}

/// Value of a main-section attribute (names are case-insensitive)
pub fn attribute(manifest: &str, name: &str) -> Option<String> {
    unfold_lines(manifest).into_iter().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_string())
    })
}

/// Parse the dependency edges declared in manifest text
pub fn parse_manifest(manifest: &str) -> Result<Vec<DependencyEdge>> {
    match attribute(manifest, DEPENDENCIES_ATTRIBUTE) {
        Some(value) => parse_dependency_list(&value),
        None => Ok(Vec::new()),
    }
}

/// Parse a `Plugin-Dependencies` value
pub fn parse_dependency_list(value: &str) -> Result<Vec<DependencyEdge>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tuple| !tuple.is_empty())
        .map(parse_tuple)
        .collect()
}

fn parse_tuple(tuple: &str) -> Result<DependencyEdge> {
    let mut parts = tuple.split(';');
    let coordinate = parts.next().unwrap_or_default().trim();
    let optional = parts.any(|attr| attr.trim() == OPTIONAL_MARKER);

    let (name, version) = coordinate
        .split_once(':')
        .map(|(n, v)| (n.trim(), v.trim()))
        .filter(|(n, v)| !n.is_empty() && !v.is_empty())
        .ok_or_else(|| {
            Error::ParseError(format!("Malformed dependency '{}' in {}", tuple, DEPENDENCIES_ATTRIBUTE))
        })?;

    Ok(DependencyEdge::new(name, version, optional))
}
