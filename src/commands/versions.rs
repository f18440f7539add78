// src/commands/versions.rs
//! Version listing and navigation commands

use crate::cli::VersionMode;
use anyhow::{Context, Result, bail};
use plugdeps::{PluginRef, Session};
use tracing::{info, warn};

/// Print versions of each reference according to `mode`
pub fn cmd_versions(session: &Session, refs: &[String], mode: VersionMode) -> Result<()> {
    for token in refs {
        let plugin = PluginRef::parse(token)?;
        for line in select_versions(session, &plugin, mode)? {
            println!("{}", line);
        }
    }
    Ok(())
}

/// `name:version` lines for one reference
pub fn select_versions(session: &Session, plugin: &PluginRef, mode: VersionMode) -> Result<Vec<String>> {
    let catalog = session.catalog();
    let name = plugin.name.as_str();
    let line = |version: String| format!("{}:{}", name, version);

    let lines = match mode {
        VersionMode::All => catalog
            .list_versions(name)?
            .into_iter()
            .map(line)
            .collect(),
        VersionMode::Latest => vec![line(catalog.latest(name)?)],
        VersionMode::Next => vec![line(catalog.next(name, required_version(plugin)?)?)],
        VersionMode::Prev => vec![line(catalog.prev(name, required_version(plugin)?)?)],
        VersionMode::Secure => vec![line(secure_version(session, plugin)?)],
    };
    Ok(lines)
}

fn required_version(plugin: &PluginRef) -> Result<&str> {
    match plugin.version {
        Some(ref version) => Ok(version),
        None => bail!("'{}' needs a version (name:version) for this mode", plugin.name),
    }
}

/// The version to use for `plugin` so that it is not known-vulnerable
///
/// An unversioned reference resolves to latest and is presumed secure
/// without checking the advisory feed.
pub fn secure_version(session: &Session, plugin: &PluginRef) -> Result<String> {
    let catalog = session.catalog();
    let Some(ref version) = plugin.version else {
        return Ok(catalog.latest(&plugin.name)?);
    };

    let index = session.vulnerabilities();
    if !index.is_vulnerable(&plugin.name, version)? {
        return Ok(version.clone());
    }

    match index.last_secure_version(&plugin.name, catalog)? {
        Some(secure) => {
            warn!("{} is vulnerable, using {}", plugin, secure);
            Ok(secure)
        }
        None => Ok(version.clone()),
    }
}

/// Print the first secure version of each name
pub fn cmd_last_secure(session: &Session, names: &[String]) -> Result<()> {
    let catalog = session.catalog();
    let index = session.vulnerabilities();

    for name in names {
        let secure = index
            .last_secure_version(name, catalog)
            .with_context(|| format!("Failed to find a secure version of '{}'", name))?;
        match secure {
            Some(version) => println!("{}:{}", name, version),
            None => {
                info!("No advisories for {}", name);
                println!("{}", name);
            }
        }
    }
    Ok(())
}
