// src/commands/resolve.rs
//! Dependency closure command

use anyhow::Result;
use plugdeps::{PluginRef, Session};
use tracing::info;

/// Resolve the closure of `refs` and print one `name:version` per line
pub fn cmd_resolve_deps(session: &Session, refs: &[String], fix: bool) -> Result<()> {
    let requests = refs
        .iter()
        .map(|token| PluginRef::parse(token))
        .collect::<plugdeps::Result<Vec<_>>>()?;

    info!(
        "Resolving {} requests (cache: {})",
        requests.len(),
        session.cache_dir().display()
    );

    let resolver = session.resolver(fix)?;
    let resolution = match resolver.resolve(&requests) {
        Ok(resolution) => resolution,
        Err(e) if e.is_pin_conflict() => {
            return Err(anyhow::Error::new(e)
                .context("Dependency resolution failed (rerun with --fix to keep the higher version)"));
        }
        Err(e) => return Err(anyhow::Error::new(e).context("Dependency resolution failed")),
    };

    for line in resolution.lines() {
        println!("{}", line);
    }

    if !resolution.overrides().is_empty() {
        eprintln!("Pin overrides applied:");
        for conflict in resolution.overrides() {
            eprintln!("  {}", conflict);
        }
    }

    Ok(())
}
