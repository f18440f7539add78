// src/commands/mod.rs
//! Command handlers for the plugdeps CLI

mod resolve;
mod versions;
mod vulnerable;

pub use resolve::cmd_resolve_deps;
pub use versions::{cmd_last_secure, cmd_versions};
pub use vulnerable::cmd_is_vulnerable;
