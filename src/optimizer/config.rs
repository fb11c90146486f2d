//! Tuning for every optimizer stage, gathered in one value so strategies can be
//! exercised with different numbers. Defaults are the empirically tuned values;
//! a YAML file may override any subset of them.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const STRATEGY_CONFIG_ENV: &str = "VOYAGER_STRATEGY_CONFIG";

/// Largest retained pool; combinations are enumerated as 32-bit masks.
pub const MAX_POOL_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StrategyConfig {
    pub search: SearchConfig,
    pub boost: BoostConfig,
    pub projector: ProjectorConfig,
    pub estimator: EstimatorConfig,
    pub selection: SelectionConfig,
}

/// Rank-prune-seat tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub pool_size: usize,
    pub skill_floor: usize,
    pub skill_ceiling: usize,
    /// Combinations with fewer crew than this for any skill are rejected unseen.
    pub min_crew_per_skill: usize,
    pub combination_ceiling: usize,
    /// Enumeration stops after this many combinations once any of them can be seated.
    pub enumeration_budget: usize,
    pub total_weight: f64,
    pub depth_weight: f64,
    /// Multiplier on primary and secondary scores when specialists are favored.
    pub specialist_weight: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            pool_size: 20,
            skill_floor: 4,
            skill_ceiling: 12,
            min_crew_per_skill: 2,
            combination_ceiling: 100_000,
            enumeration_budget: 2_000_000,
            total_weight: 1.0,
            depth_weight: 0.25,
            specialist_weight: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrimeFactorStep {
    pub min_total_score: f64,
    pub prime_factor: f64,
}

/// Boost-vector hill-climb tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
    pub min_boost: f64,
    pub max_boost: f64,
    pub min_step: f64,
    /// Scales ratio deviations into boost nudges. Deviations are score shares
    /// (a few hundredths), so 10 turns a 0.02 miss into a 0.2 nudge on the first attempt.
    pub gain: f64,
    pub vector_deltas: Vec<f64>,
    pub vector_lineup_quota: usize,
    pub min_attempts: usize,
    pub attempts_divisor: usize,
    pub secondary_offset: f64,
    /// Sorted by `min_total_score`; the highest step not above the control total wins.
    pub prime_factor_steps: Vec<PrimeFactorStep>,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            min_boost: 0.5,
            max_boost: 3.5,
            min_step: 0.05,
            gain: 10.0,
            vector_deltas: vec![0.0, 0.05, -0.05, 0.1, -0.1, 0.15, -0.15, 0.25, -0.25],
            vector_lineup_quota: 3,
            min_attempts: 10,
            attempts_divisor: 4,
            secondary_offset: 0.03,
            prime_factor_steps: vec![
                PrimeFactorStep {
                    min_total_score: 0.0,
                    prime_factor: 0.24,
                },
                PrimeFactorStep {
                    min_total_score: 30_000.0,
                    prime_factor: 0.225,
                },
                PrimeFactorStep {
                    min_total_score: 50_000.0,
                    prime_factor: 0.21,
                },
                PrimeFactorStep {
                    min_total_score: 70_000.0,
                    prime_factor: 0.2,
                },
            ],
        }
    }
}

impl BoostConfig {
    pub fn prime_factor_for(&self, total_score: f64) -> f64 {
        self.prime_factor_steps
            .iter()
            .filter(|step| step.min_total_score <= total_score)
            .max_by(|a, b| a.min_total_score.total_cmp(&b.min_total_score))
            .map(|step| step.prime_factor)
            .unwrap_or(1.0 / 6.0)
    }

    pub fn attempts_for(&self, roster_size: usize) -> usize {
        (roster_size / self.attempts_divisor.max(1)).max(self.min_attempts)
    }
}

/// Depletion projector tuning: linear failpoint model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorConfig {
    pub failpoint_slope: f64,
    pub failpoint_intercept: f64,
    pub max_ticks: u32,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            failpoint_slope: 0.0449,
            failpoint_intercept: 34.399,
            max_ticks: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub simulations: usize,
    pub extensions: usize,
    /// Sanity ceiling; a simulation still running here is truncated.
    pub max_ticks: u32,
    pub max_20_hour_sims: usize,
    pub parallel: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            simulations: 5_000,
            extensions: 2,
            max_ticks: 10_000,
            max_20_hour_sims: 100,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub always_estimate: usize,
    pub extra_per_objective: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            always_estimate: 3,
            extra_per_objective: 7,
        }
    }
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), String> {
        let search = &self.search;
        if search.pool_size < 12 || search.pool_size > MAX_POOL_SIZE {
            return Err(format!(
                "search.pool_size must be between 12 and {MAX_POOL_SIZE}, got {}",
                search.pool_size
            ));
        }
        if search.skill_floor > search.skill_ceiling {
            return Err(format!(
                "search.skill_floor {} exceeds search.skill_ceiling {}",
                search.skill_floor, search.skill_ceiling
            ));
        }
        if search.combination_ceiling == 0 {
            return Err("search.combination_ceiling must be positive".to_string());
        }
        if search.enumeration_budget < search.combination_ceiling {
            return Err(format!(
                "search.enumeration_budget {} is below search.combination_ceiling {}",
                search.enumeration_budget, search.combination_ceiling
            ));
        }
        let boost = &self.boost;
        if !(boost.min_boost > 0.0 && boost.min_boost <= boost.max_boost) {
            return Err(format!(
                "boost range [{}, {}] is empty",
                boost.min_boost, boost.max_boost
            ));
        }
        if !(boost.gain.is_finite() && boost.gain > 0.0) {
            return Err(format!("boost.gain must be positive, got {}", boost.gain));
        }
        if boost.vector_deltas.is_empty() {
            return Err("boost.vector_deltas must not be empty".to_string());
        }
        if self.estimator.simulations == 0 {
            return Err("estimator.simulations must be positive".to_string());
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "{e}"),
            Self::Yaml(e) => write!(f, "{e}"),
            Self::Invalid(m) => write!(f, "{m}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load a strategy config from YAML. Keys left out keep their defaults.
pub fn load_strategy_config(path: impl AsRef<Path>) -> Result<StrategyConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: StrategyConfig = serde_yaml::from_str(&raw).map_err(ConfigError::Yaml)?;
    config.validate().map_err(ConfigError::Invalid)?;
    Ok(config)
}

/// Config named by `VOYAGER_STRATEGY_CONFIG`, or defaults when unset.
pub fn strategy_config_from_env() -> Result<StrategyConfig, ConfigError> {
    match std::env::var(STRATEGY_CONFIG_ENV) {
        Ok(path) if !path.trim().is_empty() => load_strategy_config(path.trim()),
        _ => Ok(StrategyConfig::default()),
    }
}
