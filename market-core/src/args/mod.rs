//! Defines the command-line arguments of the price feed.
//!
//! Every argument is optional. When present it overrides the matching value from the
//! settings file or environment (see `configuration::EngineSettings`).

use clap::Parser;
use std::path::PathBuf;

/// Holds the configuration parameters parsed from the command line.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct CommonArgs {
    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to a JSON file listing the instruments to simulate
    #[arg(long)]
    instruments: Option<PathBuf>,

    /// Seed for the engine's random generator (reproducible runs)
    #[arg(long)]
    seed: Option<u64>,

    /// Log filter (e.g. "info", "market_core=debug")
    #[arg(long)]
    log_level: Option<String>,
}

impl CommonArgs {
    /// Parses command-line arguments into a `CommonArgs` struct.
    ///
    /// Handles `--help` and `--version` via `clap` and exits on invalid input.
    pub fn parse_args(args: Vec<String>) -> Self {
        CommonArgs::parse_from(args)
    }

    /// Returns the settings file path, if one was given.
    pub fn get_config(&self) -> Option<PathBuf> {
        self.config.clone()
    }

    pub fn get_instruments(&self) -> Option<PathBuf> {
        self.instruments.clone()
    }

    pub fn get_seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn get_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}
