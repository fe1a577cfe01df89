//! CLI argument definitions for tosu.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tosu_core::AnswerKind;

#[derive(Parser)]
#[command(name = "tosu")]
#[command(about = "osu! memory reader", version)]
pub struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "config.json", env = "TOSU_CONFIG")]
    pub config: PathBuf,

    /// Load the stable pattern table from file
    #[arg(long, value_name = "FILE")]
    pub stable_patterns: Option<PathBuf>,

    /// Load the lazer pattern table from file
    #[arg(long, value_name = "FILE")]
    pub lazer_patterns: Option<PathBuf>,

    /// Verbose logging
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the focused client's answer until interrupted
    Watch {
        /// Answer shape
        #[arg(short, long, value_enum, default_value = "v2")]
        format: AnswerFormat,
        /// Print interval in milliseconds
        #[arg(short, long, default_value = "1000")]
        interval: u64,
        /// Print a single answer and exit
        #[arg(long)]
        once: bool,
    },
    /// Print one domain snapshot as JSON
    Domain {
        /// Domain name (global, menu, gameplay, beatmapPP, ...)
        name: String,
        /// Process ID (defaults to the focused client)
        #[arg(long)]
        pid: Option<u32>,
        /// How long to let the loops fill the snapshot, in milliseconds
        #[arg(long, default_value = "2000")]
        wait: u64,
    },
    /// Write the built-in pattern tables
    Patterns {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnswerFormat {
    V1,
    V2,
    Precise,
}

impl From<AnswerFormat> for AnswerKind {
    fn from(format: AnswerFormat) -> Self {
        match format {
            AnswerFormat::V1 => AnswerKind::V1,
            AnswerFormat::V2 => AnswerKind::V2,
            AnswerFormat::Precise => AnswerKind::Precise,
        }
    }
}
