//! Health metrics calculations module
//!
//! Provides the baseline energy calculations the engine builds on: BMI,
//! BMR (four formulas), TDEE and body-fat estimation.
//!
//! Level and formula names coming from requests are parsed leniently: an
//! unknown name logs a warning and falls back to the default.

use crate::errors::InputError;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Energy per gram of protein
pub const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
/// Energy per gram of carbohydrate
pub const KCAL_PER_GRAM_CARBS: f64 = 4.0;
/// Energy per gram of fat
pub const KCAL_PER_GRAM_FAT: f64 = 9.0;
/// Approximate energy stored in one kilogram of body mass
pub const KCAL_PER_KG_BODY_MASS: f64 = 7700.0;

/// Lower clamp for estimated body fat
pub const MIN_ESTIMATED_BODY_FAT: f64 = 5.0;
/// Upper clamp for estimated body fat
pub const MAX_ESTIMATED_BODY_FAT: f64 = 50.0;

/// Calories implied by a macro breakdown (4/4/9 kcal per gram)
pub fn calories_from_macros(protein_g: f64, carbs_g: f64, fat_g: f64) -> f64 {
    protein_g * KCAL_PER_GRAM_PROTEIN + carbs_g * KCAL_PER_GRAM_CARBS + fat_g * KCAL_PER_GRAM_FAT
}

// ============================================================================
// User Profile Types
// ============================================================================

/// Biological sex for health calculations
/// Note: This is used for physiological calculations only. Every formula
/// with a sex term treats `Other` with the female coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiologicalSex {
    Male,
    Female,
    Other,
}

impl BiologicalSex {
    pub fn is_male(&self) -> bool {
        matches!(self, BiologicalSex::Male)
    }
}

/// Activity level for TDEE calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    Sedentary,
    /// Light exercise 1-3 days/week
    LightlyActive,
    /// Moderate exercise 3-5 days/week
    #[default]
    ModeratelyActive,
    /// Hard exercise 6-7 days/week
    VeryActive,
    /// Very hard exercise, physical job
    ExtraActive,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        ActivityLevel::Sedentary,
        ActivityLevel::LightlyActive,
        ActivityLevel::ModeratelyActive,
        ActivityLevel::VeryActive,
        ActivityLevel::ExtraActive,
    ];

    /// Get the activity multiplier for TDEE calculation
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtraActive => 1.9,
        }
    }

    /// Machine name, as accepted by [`FromStr`]
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::LightlyActive => "lightly_active",
            ActivityLevel::ModeratelyActive => "moderately_active",
            ActivityLevel::VeryActive => "very_active",
            ActivityLevel::ExtraActive => "extra_active",
        }
    }

    /// Look a level up by its multiplier value (1.2, 1.375, ...)
    pub fn from_multiplier(value: f64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| (level.multiplier() - value).abs() < 1e-9)
    }

    /// Parse a level name, falling back to [`ActivityLevel::default`]
    /// (moderately active) for anything unrecognised.
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_else(|err: InputError| {
            warn!(value, "{}, defaulting to moderately_active", err);
            ActivityLevel::default()
        })
    }

    /// Multiplier lookup with the same fallback as [`ActivityLevel::parse_or_default`]
    pub fn from_multiplier_or_default(value: f64) -> Self {
        Self::from_multiplier(value).unwrap_or_else(|| {
            warn!(value, "Unknown activity multiplier, defaulting to moderately_active");
            ActivityLevel::default()
        })
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityLevel {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "lightly_active" => Ok(ActivityLevel::LightlyActive),
            "moderately_active" => Ok(ActivityLevel::ModeratelyActive),
            "very_active" => Ok(ActivityLevel::VeryActive),
            "extra_active" | "extremely_active" => Ok(ActivityLevel::ExtraActive),
            other => Err(InputError::UnknownValue {
                kind: "activity level",
                value: other.to_string(),
            }),
        }
    }
}

// Accepts a level name or a multiplier; unknown input degrades to the default
// level instead of rejecting the whole profile.
impl<'de> Deserialize<'de> for ActivityLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LevelVisitor;

        impl<'de> de::Visitor<'de> for LevelVisitor {
            type Value = ActivityLevel;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an activity level name or multiplier")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(ActivityLevel::parse_or_default(v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(ActivityLevel::from_multiplier_or_default(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                self.visit_f64(v as f64)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                self.visit_f64(v as f64)
            }
        }

        deserializer.deserialize_any(LevelVisitor)
    }
}

/// Static attributes needed for health calculations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthProfile {
    /// Height in centimeters (stored in SI)
    pub height_cm: f64,
    /// Current weight in kilograms (stored in SI)
    pub weight_kg: f64,
    /// Age in years
    pub age_years: u32,
    /// Biological sex for physiological calculations
    pub sex: BiologicalSex,
    /// Activity level for TDEE
    pub activity_level: ActivityLevel,
}

// ============================================================================
// BMI Calculations
// ============================================================================

/// BMI category classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

/// Calculate BMI from weight and height
///
/// Formula: BMI = weight(kg) / height(m)²
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    if height_cm <= 0.0 {
        return 0.0;
    }
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Classify BMI into category
pub fn classify_bmi(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi <= 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

// ============================================================================
// BMR and TDEE Calculations
// ============================================================================

/// BMR calculation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmrMethod {
    /// Mifflin-St Jeor (most accurate for most people)
    #[default]
    MifflinStJeor,
    /// Harris-Benedict (original, less accurate)
    HarrisBenedict,
    /// Katch-McArdle (requires body fat %, most accurate if available)
    KatchMcArdle,
    /// Cunningham (lean-mass based, suited to athletes)
    Cunningham,
}

impl BmrMethod {
    /// Parse a formula name, falling back to Mifflin-St Jeor
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_else(|err: InputError| {
            warn!(value, "{}, falling back to Mifflin-St Jeor", err);
            BmrMethod::default()
        })
    }
}

impl FromStr for BmrMethod {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "mifflin_st_jeor" | "mifflin" => Ok(BmrMethod::MifflinStJeor),
            "harris_benedict" => Ok(BmrMethod::HarrisBenedict),
            "katch_mcardle" => Ok(BmrMethod::KatchMcArdle),
            "cunningham" => Ok(BmrMethod::Cunningham),
            other => Err(InputError::UnknownValue {
                kind: "BMR formula",
                value: other.to_string(),
            }),
        }
    }
}

/// Calculate Basal Metabolic Rate using Mifflin-St Jeor equation
///
/// Men: BMR = 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) + 5
/// Women: BMR = 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) - 161
pub fn calculate_bmr_mifflin(weight_kg: f64, height_cm: f64, age_years: u32, sex: BiologicalSex) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age_years as f64;
    if sex.is_male() {
        base + 5.0
    } else {
        base - 161.0
    }
}

/// Calculate BMR using Harris-Benedict equation (revised)
///
/// Men: BMR = 88.362 + 13.397 × weight(kg) + 4.799 × height(cm) - 5.677 × age(y)
/// Women: BMR = 447.593 + 9.247 × weight(kg) + 3.098 × height(cm) - 4.330 × age(y)
pub fn calculate_bmr_harris_benedict(weight_kg: f64, height_cm: f64, age_years: u32, sex: BiologicalSex) -> f64 {
    let age = age_years as f64;
    if sex.is_male() {
        88.362 + 13.397 * weight_kg + 4.799 * height_cm - 5.677 * age
    } else {
        447.593 + 9.247 * weight_kg + 3.098 * height_cm - 4.330 * age
    }
}

/// Lean body mass: weight × (1 - body_fat_percent/100)
pub fn lean_body_mass_kg(weight_kg: f64, body_fat_percent: f64) -> f64 {
    weight_kg * (1.0 - body_fat_percent / 100.0)
}

/// Calculate BMR using Katch-McArdle equation
///
/// BMR = 370 + 21.6 × LBM(kg)
pub fn calculate_bmr_katch_mcardle(weight_kg: f64, body_fat_percent: f64) -> f64 {
    370.0 + 21.6 * lean_body_mass_kg(weight_kg, body_fat_percent)
}

/// Calculate BMR using Cunningham equation
///
/// BMR = 500 + 22 × LBM(kg)
pub fn calculate_bmr_cunningham(weight_kg: f64, body_fat_percent: f64) -> f64 {
    500.0 + 22.0 * lean_body_mass_kg(weight_kg, body_fat_percent)
}

/// Calculate BMR with specified method
///
/// Lean-mass methods fall back to Mifflin-St Jeor when no body-fat
/// percentage is known.
pub fn calculate_bmr(profile: &HealthProfile, method: BmrMethod, body_fat_percent: Option<f64>) -> f64 {
    let mifflin = || {
        calculate_bmr_mifflin(profile.weight_kg, profile.height_cm, profile.age_years, profile.sex)
    };

    match (method, body_fat_percent) {
        (BmrMethod::MifflinStJeor, _) => mifflin(),
        (BmrMethod::HarrisBenedict, _) => {
            calculate_bmr_harris_benedict(profile.weight_kg, profile.height_cm, profile.age_years, profile.sex)
        }
        (BmrMethod::KatchMcArdle, Some(bf)) => calculate_bmr_katch_mcardle(profile.weight_kg, bf),
        (BmrMethod::Cunningham, Some(bf)) => calculate_bmr_cunningham(profile.weight_kg, bf),
        (BmrMethod::KatchMcArdle | BmrMethod::Cunningham, None) => mifflin(),
    }
}

/// Calculate Total Daily Energy Expenditure
///
/// TDEE = BMR (Mifflin-St Jeor) × Activity Multiplier
pub fn calculate_tdee(profile: &HealthProfile) -> f64 {
    let bmr = calculate_bmr(profile, BmrMethod::MifflinStJeor, None);
    bmr * profile.activity_level.multiplier()
}

// ============================================================================
// Body Fat Estimation
// ============================================================================

/// Estimate body fat percentage from BMI (Deurenberg)
///
/// This is a rough estimate - actual measurement is more accurate
/// Formula: BF% = 1.20 × BMI + 0.23 × Age - 10.8 × sex - 5.4
/// where sex = 1 for male, 0 otherwise. Clamped to [5, 50].
pub fn estimate_body_fat_deurenberg(bmi: f64, age_years: u32, sex: BiologicalSex) -> f64 {
    let sex_factor = if sex.is_male() { 1.0 } else { 0.0 };
    let bf = 1.20 * bmi + 0.23 * age_years as f64 - 10.8 * sex_factor - 5.4;
    bf.clamp(MIN_ESTIMATED_BODY_FAT, MAX_ESTIMATED_BODY_FAT)
}
