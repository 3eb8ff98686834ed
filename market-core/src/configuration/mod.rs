//! Runtime settings of the price feed.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `PRICE_FEED__*` environment variables, then command-line overrides.

use crate::args::CommonArgs;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SECONDS_PER_DAY: f64 = 86400.0;

/// One tick advances simulated time by one second's share of a day.
pub const DEFAULT_DT: f64 = 1.0 / SECONDS_PER_DAY;

/// Observations older than this are eligible for expiry (7 days).
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// How long a stopping engine waits for outstanding writes.
pub const DEFAULT_SHUTDOWN_DRAIN: Duration = Duration::from_secs(5);

/// Outstanding writes allowed before new batches are dropped.
pub const DEFAULT_MAX_PENDING_WRITES: usize = 64;

const ENV_PREFIX: &str = "PRICE_FEED";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Wall-clock period between ticks.
    pub tick_interval_ms: u64,
    /// Simulated time increment applied per tick, as a fraction of a year.
    pub dt: f64,
    /// Seed for the engine's random generator. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Age after which stored observations expire.
    pub retention_secs: u64,
    /// How often the store's retention sweep runs.
    pub retention_sweep_secs: u64,
    /// JSON instrument file. `None` uses the store's seeded base instruments.
    pub instruments_file: Option<PathBuf>,
    /// Time allowed on stop for outstanding writes before they are abandoned.
    pub shutdown_drain_ms: u64,
    pub max_pending_writes: usize,
    pub log_level: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            dt: DEFAULT_DT,
            seed: None,
            retention_secs: DEFAULT_RETENTION.as_secs(),
            retention_sweep_secs: 60,
            instruments_file: None,
            shutdown_drain_ms: millis(DEFAULT_SHUTDOWN_DRAIN),
            max_pending_writes: DEFAULT_MAX_PENDING_WRITES,
            log_level: "info".to_string(),
        }
    }
}

impl EngineSettings {
    /// Loads settings from an optional file plus the environment.
    ///
    /// A missing `path` is an error; `None` skips the file layer entirely.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let settings: Self = builder
            .build()
            .context("Failed to read price feed settings")?
            .try_deserialize()
            .context("Failed to deserialize price feed settings")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings and applies command-line overrides on top.
    pub fn from_args(args: &CommonArgs) -> Result<Self> {
        let mut settings = Self::load(args.get_config().as_deref())?;

        if let Some(seed) = args.get_seed() {
            settings.seed = Some(seed);
        }
        if let Some(file) = args.get_instruments() {
            settings.instruments_file = Some(file);
        }
        if let Some(level) = args.get_log_level() {
            settings.log_level = level;
        }

        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            anyhow::bail!("tick_interval_ms must be greater than 0");
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            anyhow::bail!("dt must be a positive finite number, got {}", self.dt);
        }
        if self.retention_secs == 0 {
            anyhow::bail!("retention_secs must be greater than 0");
        }
        if self.retention_sweep_secs == 0 {
            anyhow::bail!("retention_sweep_secs must be greater than 0");
        }
        if self.max_pending_writes == 0 {
            anyhow::bail!("max_pending_writes must be greater than 0");
        }
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = millis(interval);
        self
    }

    pub fn with_shutdown_drain(mut self, timeout: Duration) -> Self {
        self.shutdown_drain_ms = millis(timeout);
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn shutdown_drain(&self) -> Duration {
        Duration::from_millis(self.shutdown_drain_ms)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn retention_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.retention_sweep_secs)
    }
}

/// Whole milliseconds of `d`, saturating at `u64::MAX`.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_one_second_cadence() {
        let settings = EngineSettings::default();
        assert_eq!(settings.tick_interval(), Duration::from_secs(1));
        assert_eq!(settings.dt, 1.0 / 86400.0);
        assert_eq!(settings.retention(), Duration::from_secs(604_800));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "tick_interval_ms = 250")?;
        writeln!(file, "seed = 7")?;
        writeln!(file, "instruments_file = \"instruments.json\"")?;

        let settings = EngineSettings::load(Some(file.path()))?;
        assert_eq!(settings.tick_interval(), Duration::from_millis(250));
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.instruments_file, Some(PathBuf::from("instruments.json")));
        assert_eq!(settings.dt, DEFAULT_DT);
        Ok(())
    }

    #[test]
    fn test_load_rejects_zero_interval() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "tick_interval_ms = 0")?;

        assert!(EngineSettings::load(Some(file.path())).is_err());
        Ok(())
    }

    #[test]
    fn test_zero_retention_is_rejected() {
        let settings = EngineSettings {
            retention_secs: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_huge_tick_interval_saturates() {
        let settings = EngineSettings::default().with_tick_interval(Duration::MAX);
        assert_eq!(settings.tick_interval_ms, u64::MAX);

        let settings = EngineSettings::default().with_shutdown_drain(Duration::from_millis(1500));
        assert_eq!(settings.shutdown_drain(), Duration::from_millis(1500));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(EngineSettings::load(Some(Path::new("/no/such/feed.toml"))).is_err());
    }
}
