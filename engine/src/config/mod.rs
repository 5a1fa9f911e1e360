//! Configuration management for the nutrition engine
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: NE__)

use anyhow::Result;
use nutrition_engine_shared::models::MacroRatios;
use nutrition_engine_shared::validation::validate_macro_ratios;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;

use crate::error::EngineError;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub meals: MealConfig,
    #[serde(default)]
    pub macros: MacroRatios,
    #[serde(default)]
    pub satisfaction: SatisfactionConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
}

/// Alert thresholds for biometric trends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub high_glucose_mg_dl: f64,
    pub low_glucose_mg_dl: f64,
    pub low_activity_steps: f64,
    pub poor_sleep_hours: f64,
    pub high_heart_rate_bpm: f64,
    pub heart_rate_variability_bpm: f64,
    pub weight_change_kg: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            high_glucose_mg_dl: 140.0,
            low_glucose_mg_dl: 70.0,
            low_activity_steps: 5000.0,
            poor_sleep_hours: 6.0,
            high_heart_rate_bpm: 100.0,
            heart_rate_variability_bpm: 20.0,
            weight_change_kg: 2.0,
        }
    }
}

/// Trend analysis window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub window_days: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { window_days: 7 }
    }
}

/// Meal slot calorie distribution and portion limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealConfig {
    /// Share of the daily target per meal slot. A config file that lists
    /// any slot replaces the whole default map rather than merging into it.
    #[serde(default)]
    pub distribution: BTreeMap<String, f64>,
    /// Share used for slots missing from `distribution`
    pub fallback_share: f64,
    pub max_portion_g: f64,
}

impl Default for MealConfig {
    fn default() -> Self {
        let distribution = [("breakfast", 0.25), ("lunch", 0.40), ("dinner", 0.35)]
            .into_iter()
            .map(|(slot, share)| (slot.to_string(), share))
            .collect();

        Self {
            distribution,
            fallback_share: 0.33,
            max_portion_g: 400.0,
        }
    }
}

impl MealConfig {
    /// Calorie share for a meal slot
    pub fn share_for(&self, meal_type: &str) -> f64 {
        self.distribution
            .get(meal_type)
            .copied()
            .unwrap_or(self.fallback_share)
    }
}

/// Satisfaction capability settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SatisfactionConfig {
    /// Score used when no trained model is available (1-5 scale)
    pub neutral_score: f64,
}

impl Default for SatisfactionConfig {
    fn default() -> Self {
        Self { neutral_score: 3.0 }
    }
}

/// Budget defaults
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    pub default_daily_usd: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            default_daily_usd: 15.0,
        }
    }
}

impl EngineConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with NE__ prefix
    pub fn load() -> Result<Self> {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let config_file = format!("config/{}.toml", env);

        Self::load_with(config::File::with_name(&config_file).required(false))
    }

    fn load_with<S>(file: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        // Slot shares are seeded after the merge so that file entries replace them
        let mut defaults = EngineConfig::default();
        defaults.meals.distribution.clear();

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&defaults)?)
            .add_source(file)
            // e.g. NE__THRESHOLDS__HIGH_GLUCOSE_MG_DL=150 sets thresholds.high_glucose_mg_dl
            .add_source(config::Environment::with_prefix("NE").separator("__"))
            .build()?;

        let mut loaded: EngineConfig = config.try_deserialize()?;
        if loaded.meals.distribution.is_empty() {
            loaded.meals.distribution = MealConfig::default().distribution;
        }
        loaded.validate()?;
        Ok(loaded)
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }

    /// Reject negative thresholds, shares outside [0, 1] and bad macro splits
    pub fn validate(&self) -> Result<(), EngineError> {
        let t = &self.thresholds;
        let thresholds = [
            ("high_glucose_mg_dl", t.high_glucose_mg_dl),
            ("low_glucose_mg_dl", t.low_glucose_mg_dl),
            ("low_activity_steps", t.low_activity_steps),
            ("poor_sleep_hours", t.poor_sleep_hours),
            ("high_heart_rate_bpm", t.high_heart_rate_bpm),
            ("heart_rate_variability_bpm", t.heart_rate_variability_bpm),
            ("weight_change_kg", t.weight_change_kg),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::Configuration(format!(
                    "thresholds.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        let shares = self
            .meals
            .distribution
            .iter()
            .map(|(slot, share)| (slot.as_str(), *share))
            .chain(std::iter::once(("fallback_share", self.meals.fallback_share)));
        for (slot, share) in shares {
            if !(0.0..=1.0).contains(&share) {
                return Err(EngineError::Configuration(format!(
                    "meal share for {} must be between 0 and 1, got {}",
                    slot, share
                )));
            }
        }

        if self.meals.max_portion_g <= 0.0 {
            return Err(EngineError::Configuration(
                "meals.max_portion_g must be positive".to_string(),
            ));
        }

        if self.analysis.window_days == 0 {
            return Err(EngineError::Configuration(
                "analysis.window_days must be at least 1".to_string(),
            ));
        }

        validate_macro_ratios(self.macros.protein, self.macros.carbs, self.macros.fat)
            .map_err(|msg| EngineError::Configuration(format!("macros: {}", msg)))
    }
}
