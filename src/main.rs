// src/main.rs

mod cli;
mod commands;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands, GlobalArgs};
use plugdeps::{Config, Session};
use std::process::ExitCode;
use tracing::{debug, warn};

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

/// Load the config file and layer command-line flags on top
fn load_config(global: &GlobalArgs) -> Result<Config> {
    let mut config = Config::load(global.config.as_deref())?;

    if let Some(ref dir) = global.cache_dir {
        config.cache_dir = Some(dir.clone());
    }
    if global.force {
        config.force = true;
    }
    if let Some(jobs) = global.jobs {
        if jobs == 0 {
            bail!("--jobs must be at least 1");
        }
        config.network.jobs = jobs;
    }
    if let Some(retries) = global.retries {
        if retries == 0 {
            bail!("--retries must be at least 1");
        }
        config.network.max_retries = retries;
    }
    if let Some(secs) = global.connect_timeout {
        config.network.connect_timeout_secs = secs;
    }

    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Run one command; `Ok(false)` means a negative answer, not a failure
fn run(command: Commands, session: &Session) -> Result<bool> {
    match command {
        Commands::Versions { refs, mode } => {
            commands::cmd_versions(session, &refs, mode)?;
            Ok(true)
        }
        Commands::LastSecure { names } => {
            commands::cmd_last_secure(session, &names)?;
            Ok(true)
        }
        Commands::IsVulnerable { refs } => commands::cmd_is_vulnerable(session, &refs),
        Commands::ResolveDeps { refs, fix } => {
            commands::cmd_resolve_deps(session, &refs, fix)?;
            Ok(true)
        }
    }
}

fn report(error: anyhow::Error, forced: bool) -> ExitCode {
    if forced {
        warn!("Ignoring failure: {:#}", error);
        ExitCode::SUCCESS
    } else {
        eprintln!("Error: {:#}", error);
        ExitCode::FAILURE
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let config = match load_config(&cli.global) {
        Ok(config) => config,
        Err(e) => return report(e, cli.global.force),
    };
    let forced = config.force;

    let outcome = Session::new(config, !cli.global.quiet)
        .map_err(anyhow::Error::from)
        .and_then(|session| run(cli.command, &session));

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => report(e, forced),
    }
}
