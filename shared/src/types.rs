//! Calculation result and response types

use serde::{Deserialize, Serialize};

/// Structured failure returned to callers instead of a crash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl FailureResponse {
    pub fn new(code: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: code.to_string(),
        }
    }
}

/// Multiplicative biometric adjustments applied to base TDEE
///
/// Every factor is 1.0 when there is no data to judge it by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveFactors {
    pub sleep_quality: f64,
    pub glucose_regulation: f64,
    pub activity_consistency: f64,
    pub stress_level: f64,
    pub recovery_status: f64,
}

impl Default for AdaptiveFactors {
    fn default() -> Self {
        Self {
            sleep_quality: 1.0,
            glucose_regulation: 1.0,
            activity_consistency: 1.0,
            stress_level: 1.0,
            recovery_status: 1.0,
        }
    }
}

impl AdaptiveFactors {
    /// Product of all five factors
    pub fn product(&self) -> f64 {
        self.named().iter().map(|(_, v)| v).product()
    }

    /// Factors paired with their snake_case names, in a fixed order
    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("sleep_quality", self.sleep_quality),
            ("glucose_regulation", self.glucose_regulation),
            ("activity_consistency", self.activity_consistency),
            ("stress_level", self.stress_level),
            ("recovery_status", self.recovery_status),
        ]
    }

    pub fn is_neutral(&self) -> bool {
        self.named().iter().all(|(_, v)| *v == 1.0)
    }
}

/// BMR/TDEE breakdown for one profile and sample window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TdeeBreakdown {
    pub bmr: f64,
    pub base_tdee: f64,
    pub adaptive_tdee: f64,
    pub adaptive_factors: AdaptiveFactors,
    pub adaptive_multiplier: f64,
    /// Measured or estimated body fat used for lean-mass formulas
    pub body_fat_pct: f64,
}

/// Calorie targets per goal, clamped to the safety bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalorieRequirements {
    pub goal: CalorieGoal,
    /// Clamped calories for `goal`
    pub target: f64,
    pub maintenance: f64,
    pub weight_loss: f64,
    pub weight_gain: f64,
    pub min_safe_calories: f64,
    pub max_safe_calories: f64,
    pub rate_kg_per_week: f64,
}

impl CalorieRequirements {
    pub fn for_goal(&self, goal: CalorieGoal) -> f64 {
        match goal {
            CalorieGoal::Maintain => self.maintenance,
            CalorieGoal::Lose => self.weight_loss,
            CalorieGoal::Gain => self.weight_gain,
        }
    }
}

/// Weight goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalorieGoal {
    #[default]
    Maintain,
    #[serde(alias = "weight_loss")]
    Lose,
    #[serde(alias = "weight_gain")]
    Gain,
}

/// Overall metabolic rate relative to the static estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetabolicRate {
    Low,
    #[default]
    Normal,
    High,
}

/// Adaptive factors restated as health indicators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthIndicators {
    pub metabolic_flexibility: f64,
    pub sleep_efficiency: f64,
    pub glucose_stability: f64,
    pub activity_consistency: f64,
    pub stress_resilience: f64,
    pub recovery_capacity: f64,
}

impl HealthIndicators {
    pub fn from_factors(factors: &AdaptiveFactors) -> Self {
        Self {
            metabolic_flexibility: factors.product(),
            sleep_efficiency: factors.sleep_quality,
            glucose_stability: factors.glucose_regulation,
            activity_consistency: factors.activity_consistency,
            stress_resilience: factors.stress_level,
            recovery_capacity: factors.recovery_status,
        }
    }
}

/// Summary of which factors currently move the calorie target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetabolicInsights {
    pub metabolic_rate: MetabolicRate,
    pub recommendations: Vec<String>,
    pub adaptations_active: Vec<String>,
    pub health_indicators: HealthIndicators,
    /// Factor names below 1.0
    pub suppressing: Vec<String>,
    /// Factor names above 1.0
    pub boosting: Vec<String>,
}
