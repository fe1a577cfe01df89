mod cli;
mod commands;
mod shutdown;

use anyhow::Result;
use clap::Parser;
use cli::{AnswerFormat, Args, Command};
use tosu_core::{Config, PatternTables, load_patterns};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let mut args = Args::parse();

    let default_filter = if args.debug {
        "tosu=debug,tosu_core=debug"
    } else {
        "tosu=info,tosu_core=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // Answers go to stdout; keep logs off it.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command.take() {
        Some(Command::Patterns { output }) => commands::patterns::run(&output),
        Some(Command::Domain { name, pid, wait }) => {
            let (config, patterns) = load_setup(&args);
            commands::domain::run(config, patterns, &name, pid, wait)
        }
        Some(Command::Watch {
            format,
            interval,
            once,
        }) => {
            let (config, patterns) = load_setup(&args);
            commands::watch::run(config, patterns, format, interval, once)
        }
        None => {
            let (config, patterns) = load_setup(&args);
            commands::watch::run(config, patterns, AnswerFormat::V2, 1000, false)
        }
    }
}

/// Config and pattern tables, falling back to defaults on errors.
fn load_setup(args: &Args) -> (Config, PatternTables) {
    let config = match Config::load(&args.config) {
        Ok(c) => {
            info!("Loaded config from {:?}", args.config);
            c
        }
        Err(e) => {
            warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        }
    };

    let mut patterns = PatternTables::default();
    if let Some(path) = &args.stable_patterns {
        match load_patterns(path) {
            Ok(table) => {
                info!("Loaded stable patterns version: {}", table.version);
                patterns.stable = table;
            }
            Err(e) => warn!("Failed to load stable patterns: {}, using built-in table", e),
        }
    }
    if let Some(path) = &args.lazer_patterns {
        match load_patterns(path) {
            Ok(table) => {
                info!("Loaded lazer patterns version: {}", table.version);
                patterns.lazer = table;
            }
            Err(e) => warn!("Failed to load lazer patterns: {}, using built-in table", e),
        }
    }

    (config, patterns)
}
