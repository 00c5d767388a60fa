//! `incident-map` command line entry point.
//!
//! # Responsibility
//! - Resolve configuration from file, environment and flags, in that order.
//! - Run the command shell over stdin until `quit` or end of input.

mod shell;

use anyhow::{Context, Result};
use clap::Parser;
use incident_map_core::{
    core_version, default_log_level, init_logging, load_config, AppConfig, IncidentRegistry,
    MapScreen,
};
use log::info;
use shell::{Reply, Shell, ShellCommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "incident-map", version, about = "Place and track incidents on a map")]
struct Cli {
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long)]
    log_dir: Option<String>,
}

fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };
    config.apply_env_overrides();
    if let Some(level) = &cli.log_level {
        config.log_level = Some(level.clone());
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    if let Some(dir) = config.log_dir.as_deref() {
        let level = config.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, dir).context("failed to initialize logging")?;
    }
    info!(
        "event=cli_start module=cli status=ok version={}",
        core_version()
    );

    let registry = Arc::new(IncidentRegistry::new(config.registry.clone()));
    let mut shell = Shell::new(MapScreen::new(registry, &config.map));

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let reply = match line.parse::<ShellCommand>() {
            Ok(command) => shell.execute(command),
            Err(err) => Reply::Output(format!("error: {err}")),
        };
        match reply {
            Reply::Output(text) => writeln!(stdout, "{text}")?,
            Reply::Quit => break,
        }
    }

    info!("event=cli_exit module=cli status=ok");
    Ok(())
}
