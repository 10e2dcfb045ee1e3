use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use daogov_core::utils::{days, SECONDS_PER_DAY};
use daogov_core::ComponentAddresses;

/// Errors that can occur in configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidEnvVar(String, String),

    #[error("Failed to read file: {0}")]
    FileReadError(String),

    #[error("Failed to parse YAML: {0}")]
    YamlParseError(#[from] serde_yaml::Error),

    #[error("Invalid time period: {0}")]
    InvalidTimePeriod(String),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Allowed proposal time periods, in days
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePeriodBounds {
    #[serde(default = "default_active_days")]
    pub default_active: i64,
    #[serde(default = "default_min_active")]
    pub min_active: i64,
    #[serde(default = "default_max_active")]
    pub max_active: i64,
    #[serde(default = "default_min_pending")]
    pub min_pending: i64,
    #[serde(default = "default_max_pending")]
    pub max_pending: i64,
    #[serde(default = "default_min_execute")]
    pub min_execute: i64,
    #[serde(default = "default_max_execute")]
    pub max_execute: i64,
    #[serde(default = "default_veto_active_days")]
    pub default_veto_active: i64,
    #[serde(default = "default_min_veto_active")]
    pub min_veto_active: i64,
    #[serde(default = "default_max_veto_active")]
    pub max_veto_active: i64,
    #[serde(default = "default_min_veto_execute")]
    pub min_veto_execute: i64,
    #[serde(default = "default_max_veto_execute")]
    pub max_veto_execute: i64,
}

fn default_active_days() -> i64 {
    7
}

fn default_min_active() -> i64 {
    1
}

fn default_max_active() -> i64 {
    15
}

fn default_min_pending() -> i64 {
    5
}

fn default_max_pending() -> i64 {
    7
}

fn default_min_execute() -> i64 {
    3
}

fn default_max_execute() -> i64 {
    5
}

fn default_veto_active_days() -> i64 {
    3
}

fn default_min_veto_active() -> i64 {
    1
}

fn default_max_veto_active() -> i64 {
    5
}

fn default_min_veto_execute() -> i64 {
    1
}

fn default_max_veto_execute() -> i64 {
    3
}

impl Default for TimePeriodBounds {
    fn default() -> Self {
        Self {
            default_active: default_active_days(),
            min_active: default_min_active(),
            max_active: default_max_active(),
            min_pending: default_min_pending(),
            max_pending: default_max_pending(),
            min_execute: default_min_execute(),
            max_execute: default_max_execute(),
            default_veto_active: default_veto_active_days(),
            min_veto_active: default_min_veto_active(),
            max_veto_active: default_max_veto_active(),
            min_veto_execute: default_min_veto_execute(),
            max_veto_execute: default_max_veto_execute(),
        }
    }
}

fn check_days(name: &str, seconds: i64, min: i64, max: i64) -> ConfigResult<()> {
    if seconds < days(min) || seconds > days(max) {
        return Err(ConfigError::InvalidTimePeriod(format!(
            "{} of {}s is outside {}..={} days",
            name, seconds, min, max
        )));
    }
    Ok(())
}

impl TimePeriodBounds {
    /// Periods a DAO starts with
    pub fn default_periods(&self) -> ProposalTimePeriod {
        ProposalTimePeriod {
            active_time_period: days(self.default_active),
            veto_active_time_period: days(self.default_veto_active),
            pending_time_period: days(self.min_pending),
            execute_time_period: days(self.min_execute),
            veto_execute_time_period: days(self.min_veto_execute),
        }
    }

    /// Check the active window of a single proposal
    pub fn check_active(&self, seconds: i64, veto: bool) -> ConfigResult<()> {
        if veto {
            check_days("veto active period", seconds, self.min_veto_active, self.max_veto_active)
        } else {
            check_days("active period", seconds, self.min_active, self.max_active)
        }
    }

    pub fn validate(&self, periods: &ProposalTimePeriod) -> ConfigResult<()> {
        self.check_active(periods.active_time_period, false)?;
        self.check_active(periods.veto_active_time_period, true)?;
        check_days("pending period", periods.pending_time_period, self.min_pending, self.max_pending)?;
        check_days("execute period", periods.execute_time_period, self.min_execute, self.max_execute)?;
        check_days(
            "veto execute period",
            periods.veto_execute_time_period,
            self.min_veto_execute,
            self.max_veto_execute,
        )
    }
}

/// Per-DAO proposal time periods, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalTimePeriod {
    pub active_time_period: i64,
    pub veto_active_time_period: i64,
    pub pending_time_period: i64,
    pub execute_time_period: i64,
    pub veto_execute_time_period: i64,
}

impl Default for ProposalTimePeriod {
    fn default() -> Self {
        TimePeriodBounds::default().default_periods()
    }
}

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoGovConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub time_periods: TimePeriodBounds,
    #[serde(default = "default_memo_max_length")]
    pub memo_max_length: usize,
    #[serde(default = "default_max_description_url_length")]
    pub max_description_url_length: usize,
    #[serde(default)]
    pub addresses: ComponentAddresses,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_memo_max_length() -> usize {
    64
}

fn default_max_description_url_length() -> usize {
    256
}

impl Default for DaoGovConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            time_periods: TimePeriodBounds::default(),
            memo_max_length: default_memo_max_length(),
            max_description_url_length: default_max_description_url_length(),
            addresses: ComponentAddresses::default(),
        }
    }
}

impl DaoGovConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        if let Ok(config_path) = env::var("DAOGOV_CONFIG_FILE") {
            if Path::new(&config_path).exists() {
                return Self::from_file(&config_path);
            }
            return Err(ConfigError::InvalidEnvVar(
                "DAOGOV_CONFIG_FILE".to_string(),
                format!("{} does not exist", config_path),
            ));
        }

        let mut config = Self::default();
        if let Ok(log_level) = env::var("DAOGOV_LOG_LEVEL") {
            config.log_level = log_level;
        }
        if let Ok(memo) = env::var("DAOGOV_MEMO_MAX_LENGTH") {
            config.memo_max_length = memo
                .parse()
                .map_err(|e| ConfigError::InvalidEnvVar("DAOGOV_MEMO_MAX_LENGTH".to_string(), format!("{}", e)))?;
        }
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileReadError(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> ConfigResult<Self> {
        let config: DaoGovConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let bounds = &self.time_periods;
        let ordered = [
            (bounds.min_active, bounds.default_active, bounds.max_active),
            (bounds.min_veto_active, bounds.default_veto_active, bounds.max_veto_active),
            (bounds.min_pending, bounds.min_pending, bounds.max_pending),
            (bounds.min_execute, bounds.min_execute, bounds.max_execute),
            (bounds.min_veto_execute, bounds.min_veto_execute, bounds.max_veto_execute),
        ];
        if ordered.iter().any(|(min, value, max)| *min <= 0 || min > value || value > max) {
            return Err(ConfigError::InvalidTimePeriod(
                "time period bounds must satisfy 0 < min <= default <= max".to_string(),
            ));
        }
        if bounds.max_active > i64::MAX / SECONDS_PER_DAY {
            return Err(ConfigError::InvalidTimePeriod("active bound too large".to_string()));
        }
        Ok(())
    }
}

/// Install the global fmt subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &DaoGovConfig) -> ConfigResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))?;
    info!("Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = DaoGovConfig::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.memo_max_length, 64);
        assert_eq!(config.max_description_url_length, 256);
        assert_eq!(config.addresses.governance.as_str(), "governance");
        config.validate().unwrap();
    }

    #[test]
    fn test_default_periods() {
        let periods = ProposalTimePeriod::default();
        assert_eq!(periods.active_time_period, days(7));
        assert_eq!(periods.veto_active_time_period, days(3));
        assert_eq!(periods.pending_time_period, days(5));
        assert_eq!(periods.execute_time_period, days(3));
        assert_eq!(periods.veto_execute_time_period, days(1));
        TimePeriodBounds::default().validate(&periods).unwrap();
    }

    #[test]
    fn test_period_bounds() {
        let bounds = TimePeriodBounds::default();
        assert!(bounds.check_active(days(15), false).is_ok());
        assert!(bounds.check_active(days(16), false).is_err());
        assert!(bounds.check_active(days(5), true).is_ok());
        assert!(bounds.check_active(days(6), true).is_err());

        let too_short = ProposalTimePeriod {
            pending_time_period: days(4),
            ..ProposalTimePeriod::default()
        };
        assert!(matches!(
            bounds.validate(&too_short),
            Err(ConfigError::InvalidTimePeriod(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "log_level: debug\nmemo_max_length: 32\ntime_periods:\n  max_active: 20\naddresses:\n  governance: gov"
        )
        .unwrap();

        let config = DaoGovConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.memo_max_length, 32);
        assert_eq!(config.time_periods.max_active, 20);
        assert_eq!(config.time_periods.min_active, 1);
        assert_eq!(config.addresses.governance.as_str(), "gov");
        assert_eq!(config.addresses.vote.as_str(), "vote");
    }

    #[test]
    fn test_inverted_bounds_are_rejected() {
        let yaml = "time_periods:\n  min_execute: 6\n";
        assert!(matches!(
            DaoGovConfig::from_yaml(yaml),
            Err(ConfigError::InvalidTimePeriod(_))
        ));
        assert!(DaoGovConfig::from_file("/nonexistent/daogov.yaml").is_err());
    }
}
