// src/commands/vulnerable.rs
//! Advisory checks

use anyhow::Result;
use plugdeps::{PluginRef, Session};
use tracing::debug;

/// Report which references are known-vulnerable
///
/// Diagnostics go to stderr. Returns true if at least one reference is
/// vulnerable. Unversioned references are checked at their latest version.
pub fn cmd_is_vulnerable(session: &Session, refs: &[String]) -> Result<bool> {
    let index = session.vulnerabilities();
    let mut found = false;

    for token in refs {
        let plugin = PluginRef::parse(token)?;
        let version = match plugin.version {
            Some(ref version) => version.clone(),
            None => session.catalog().latest(&plugin.name)?,
        };

        if !index.is_vulnerable(&plugin.name, &version)? {
            debug!("{}:{} has no known advisories", plugin.name, version);
            continue;
        }

        found = true;
        eprintln!("{}:{} is vulnerable", plugin.name, version);
        for advisory in index.advisories(&plugin.name)? {
            let id = advisory.id.as_deref().unwrap_or("advisory");
            match (advisory.message.as_deref(), advisory.url.as_deref()) {
                (Some(message), Some(url)) => eprintln!("  {}: {} ({})", id, message, url),
                (Some(message), None) => eprintln!("  {}: {}", id, message),
                (None, Some(url)) => eprintln!("  {}: {}", id, url),
                (None, None) => eprintln!("  {}", id),
            }
        }
    }

    Ok(found)
}
