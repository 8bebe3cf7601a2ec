//! Engine configuration with validation and defaults
//!
//! Centralized configuration tree with factory presets and TOML round-trip.

use crate::money::{Amount, BPS_SCALE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level engine configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    pub session: SessionConfig,
    pub stakes: StakeConfig,
    pub crash: CrashTickConfig,
    pub autoplay: AutoplayConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            stakes: StakeConfig::default(),
            crash: CrashTickConfig::default(),
            autoplay: AutoplayConfig::default(),
        }
    }
}

/// Session lifecycle settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Opening balance credited when the session is created
    pub starting_balance: Amount,
    /// A committed round resolving longer than this is force-aborted
    pub round_deadline_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_balance: Amount::from_units(1_000),
            round_deadline_ms: 60_000,
        }
    }
}

/// Stake limits applied to every game
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StakeConfig {
    pub min_stake: Amount,
    pub max_stake: Amount,
}

impl Default for StakeConfig {
    fn default() -> Self {
        Self {
            min_stake: Amount::from_minor(1),
            max_stake: Amount::from_units(10_000),
        }
    }
}

/// Crash multiplier tick behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrashTickConfig {
    /// Running multiplier growth per tick, in basis points
    pub tick_step_bps: u32,
    /// Delay between ticks; zero resolves rounds inline without timers
    pub tick_interval_ms: u64,
}

impl Default for CrashTickConfig {
    fn default() -> Self {
        Self {
            tick_step_bps: 100, // +0.01x per tick
            tick_interval_ms: 50,
        }
    }
}

/// Autoplay pacing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AutoplayConfig {
    /// Delay between settled rounds; zero runs back-to-back
    pub inter_round_delay_ms: u64,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            inter_round_delay_ms: 500,
        }
    }
}

/// Configuration load/save/validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl EngineConfig {
    /// Preset with zero delays for tests and batch simulations
    pub fn fast_sim() -> Self {
        Self {
            crash: CrashTickConfig {
                tick_step_bps: 100,
                tick_interval_ms: 0,
            },
            autoplay: AutoplayConfig {
                inter_round_delay_ms: 0,
            },
            ..Default::default()
        }
    }

    /// Preset with a large bankroll and raised stake ceiling
    pub fn high_stakes() -> Self {
        Self {
            session: SessionConfig {
                starting_balance: Amount::from_units(1_000_000),
                ..Default::default()
            },
            stakes: StakeConfig {
                min_stake: Amount::from_units(1),
                max_stake: Amount::from_units(1_000_000),
            },
            ..Default::default()
        }
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        let config: Self = toml::from_str(&raw).map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        std::fs::write(path, raw).map_err(|e| ConfigError::SaveFailed(e.to_string()))
    }

    /// Validate for logical consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stakes.min_stake.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "stakes.min_stake".to_string(),
                reason: "zero stakes are not accepted".to_string(),
            });
        }
        if self.stakes.max_stake < self.stakes.min_stake {
            return Err(ConfigError::InvalidValue {
                field: "stakes.max_stake".to_string(),
                reason: "must be at least min_stake".to_string(),
            });
        }
        if self.crash.tick_step_bps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "crash.tick_step_bps".to_string(),
                reason: "running multiplier must grow each tick".to_string(),
            });
        }
        if self.crash.tick_step_bps as u64 > BPS_SCALE {
            return Err(ConfigError::InvalidValue {
                field: "crash.tick_step_bps".to_string(),
                reason: "tick step above 1.00x skips cash-out windows".to_string(),
            });
        }
        if self.session.round_deadline_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.round_deadline_ms".to_string(),
                reason: "a zero deadline aborts every committed round".to_string(),
            });
        }
        Ok(())
    }
}
