// src/cli/mod.rs
//! CLI definitions for plugdeps
//!
//! This module contains the command-line interface definitions using clap.
//! The command implementations are in the `commands` module.
//!
//! - `versions` - List or navigate published versions
//! - `last-secure` - First version above every known advisory
//! - `is-vulnerable` - Check references against the advisory feed
//! - `resolve-deps` - Compute the mandatory dependency closure

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plugdeps")]
#[command(author = "Plugdeps Contributors")]
#[command(version)]
#[command(about = "Resolve plugin dependency closures and check versions against known advisories", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Hide download progress bars
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: ~/.config/plugdeps/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Artifact cache directory (default: a temporary directory)
    #[arg(long, value_name = "DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Report fatal errors as warnings and exit successfully
    #[arg(short, long, global = true)]
    pub force: bool,

    /// Parallel downloads per resolution batch
    #[arg(short, long, value_name = "N", global = true)]
    pub jobs: Option<usize>,

    /// Download attempts before giving up
    #[arg(long, value_name = "N", global = true)]
    pub retries: Option<u32>,

    /// Connect timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub connect_timeout: Option<u64>,
}

/// What `versions` prints for each reference
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionMode {
    /// Every published version, newest first
    #[default]
    All,
    /// The newest published version
    Latest,
    /// The release just older than the given version
    Next,
    /// The release just newer than the given version
    Prev,
    /// The given version if not vulnerable, else the first secure one
    Secure,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List or navigate published versions of artifacts
    #[command(alias = "plugin-versions")]
    Versions {
        /// Artifact references (name[:version]); use "core" for the host application
        #[arg(required = true, value_name = "REF")]
        refs: Vec<String>,

        /// Selection mode
        #[arg(short, long, value_enum, default_value_t = VersionMode::All)]
        mode: VersionMode,
    },

    /// Print the first version above every known advisory
    LastSecure {
        /// Artifact names
        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,
    },

    /// Check references against the advisory feed
    ///
    /// Exits 0 if at least one reference is vulnerable, 1 otherwise.
    IsVulnerable {
        /// Artifact references (name[:version]); versions may carry a line marker such as "LTS 2.300"
        #[arg(required = true, value_name = "REF")]
        refs: Vec<String>,
    },

    /// Compute the mandatory dependency closure of a set of plugins
    ResolveDeps {
        /// Plugin references (name[:version]); versioned references are pins
        #[arg(required = true, value_name = "REF")]
        refs: Vec<String>,

        /// Keep dependencies that exceed a pin instead of failing
        #[arg(long)]
        fix: bool,
    },
}
