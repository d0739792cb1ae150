//! Fleet Configuration - operational thresholds as operator-tunable TOML values
//!
//! Every boundary the risk scorer and anomaly engine use is a field here.
//! Each struct implements `Default` with the shipped values, so behavior is
//! unchanged when no config file is present. The literal numbers are tuning,
//! not law: validation only requires the orderings the engine depends on.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults::{
    ASSISTANT_TIMEOUT_SECS, DEFAULT_FLEET_SIZE, DEFAULT_TICK_INTERVAL_SECS,
};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a fleet deployment.
///
/// Load with `FleetConfig::load()` which searches:
/// 1. `$FLEETWATCH_CONFIG` env var
/// 2. `./fleetwatch.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Tick loop and fleet seeding
    #[serde(default)]
    pub stream: StreamConfig,

    /// Anomaly rule thresholds
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Risk scoring weights and level boundaries
    #[serde(default)]
    pub risk: RiskConfig,

    /// AI assistant collaborator
    #[serde(default)]
    pub assistant: AssistantConfig,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            stream: StreamConfig::default(),
            thresholds: ThresholdConfig::default(),
            risk: RiskConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }
}

impl FleetConfig {
    /// Load configuration using the standard search order:
    /// 1. `$FLEETWATCH_CONFIG` environment variable
    /// 2. `./fleetwatch.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("FLEETWATCH_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded fleet config from FLEETWATCH_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from FLEETWATCH_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "FLEETWATCH_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from("fleetwatch.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded fleet config from ./fleetwatch.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./fleetwatch.toml, using defaults");
                }
            }
        }

        info!("No fleetwatch.toml found — using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the orderings the engine depends on.
    ///
    /// Risk level boundaries must be strictly increasing and inside (0, 100]
    /// so every score maps to exactly one level; the temperature warning
    /// band must nest inside the critical band; speed-drop fractions must
    /// be fractions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.risk;
        if !(0.0 < r.medium_at && r.medium_at < r.high_at && r.high_at < r.critical_at
            && r.critical_at <= 100.0)
        {
            return Err(ConfigError::Invalid(format!(
                "risk boundaries must satisfy 0 < medium_at < high_at < critical_at <= 100 \
                 (got {} / {} / {})",
                r.medium_at, r.high_at, r.critical_at
            )));
        }
        let weight_sum =
            r.weight_delay + r.weight_temperature + r.weight_speed + r.weight_alerts;
        if r.weight_delay < 0.0
            || r.weight_temperature < 0.0
            || r.weight_speed < 0.0
            || r.weight_alerts < 0.0
            || weight_sum <= 0.0
        {
            return Err(ConfigError::Invalid(
                "risk weights must be non-negative with a positive sum".to_string(),
            ));
        }

        let t = &self.thresholds;
        if !(t.temp_critical_low_f < t.temp_warn_low_f
            && t.temp_warn_low_f < t.temp_warn_high_f
            && t.temp_warn_high_f < t.temp_critical_high_f)
        {
            return Err(ConfigError::Invalid(format!(
                "temperature bands must nest: critical_low < warn_low < warn_high < critical_high \
                 (got {} / {} / {} / {})",
                t.temp_critical_low_f, t.temp_warn_low_f, t.temp_warn_high_f, t.temp_critical_high_f
            )));
        }
        if !(0.0 < t.speed_drop_warn_frac && t.speed_drop_warn_frac < t.speed_drop_critical_frac
            && t.speed_drop_critical_frac < 1.0)
        {
            return Err(ConfigError::Invalid(
                "speed drop fractions must satisfy 0 < warn < critical < 1".to_string(),
            ));
        }
        if !(0.0 < t.fuel_low_pct && t.fuel_low_pct < 100.0) {
            return Err(ConfigError::Invalid(
                "fuel_low_pct must be in (0, 100)".to_string(),
            ));
        }

        let s = &self.stream;
        if s.tick_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "tick_interval_secs must be >= 1".to_string(),
            ));
        }
        if s.fleet_size == 0 {
            return Err(ConfigError::Invalid("fleet_size must be >= 1".to_string()));
        }

        Ok(())
    }
}

// ============================================================================
// Sections
// ============================================================================

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the REST + WebSocket server
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Tick loop and fleet seeding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Interval between ticks (seconds)
    pub tick_interval_secs: u64,
    /// Number of trucks seeded at startup (fleet size is conserved)
    pub fleet_size: usize,
    /// RNG seed for reproducible runs; unset means entropy-seeded
    pub seed: Option<u64>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: DEFAULT_TICK_INTERVAL_SECS,
            fleet_size: DEFAULT_FLEET_SIZE,
            seed: None,
        }
    }
}

/// Anomaly rule thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Below this temperature (°F) the low-temperature rule fires critical
    pub temp_critical_low_f: f64,
    /// Below this temperature (°F) the low-temperature rule fires warning
    pub temp_warn_low_f: f64,
    /// Above this temperature (°F) the high-temperature rule fires warning
    pub temp_warn_high_f: f64,
    /// Above this temperature (°F) the high-temperature rule fires critical
    pub temp_critical_high_f: f64,
    /// Speed this fraction below the truck's rolling average fires warning
    pub speed_drop_warn_frac: f64,
    /// Speed this fraction below the truck's rolling average fires critical
    pub speed_drop_critical_frac: f64,
    /// Fuel below this percentage fires the low-fuel warning
    pub fuel_low_pct: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            temp_critical_low_f: 25.0,
            temp_warn_low_f: 28.0,
            temp_warn_high_f: 38.0,
            temp_critical_high_f: 42.0,
            speed_drop_warn_frac: 0.25,
            speed_drop_critical_frac: 0.50,
            fuel_low_pct: 15.0,
        }
    }
}

/// Risk scoring weights and level boundaries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Weight of schedule/delay risk in the composite score
    pub weight_delay: f64,
    /// Weight of temperature deviation
    pub weight_temperature: f64,
    /// Weight of speed deviation
    pub weight_speed: f64,
    /// Weight of active alert severity
    pub weight_alerts: f64,
    /// Scores below this are LOW
    pub medium_at: f64,
    /// Scores at or above `medium_at` and below this are MEDIUM
    pub high_at: f64,
    /// Scores at or above this are CRITICAL; HIGH in between
    pub critical_at: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            weight_delay: 0.30,
            weight_temperature: 0.25,
            weight_speed: 0.25,
            weight_alerts: 0.20,
            medium_at: 25.0,
            high_at: 50.0,
            critical_at: 75.0,
        }
    }
}

/// AI assistant collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Base URL of an OpenAI-compatible chat endpoint; unset means
    /// rule-based answers only
    pub base_url: Option<String>,
    /// Model name passed to the collaborator
    pub model: String,
    /// Environment variable holding the API key (the key itself never
    /// lives in the config file)
    pub api_key_env: String,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: "llama3".to_string(),
            api_key_env: "FLEETWATCH_AI_KEY".to_string(),
            timeout_secs: ASSISTANT_TIMEOUT_SECS,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Configuration loading / validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
