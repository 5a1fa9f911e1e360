//! Satisfaction scoring capability and the feature vectors it consumes

use nutrition_engine_shared::health_metrics::{calculate_tdee, BmrMethod};
use nutrition_engine_shared::models::{DietaryRestriction, MealCandidate, UserProfile};
use serde::{Deserialize, Serialize};

use crate::services::metabolism::MetabolismEngine;

pub const MIN_SATISFACTION: f64 = 1.0;
pub const MAX_SATISFACTION: f64 = 5.0;

/// Defaults for the latest-biometrics features when nothing was measured
const DEFAULT_RECENT_STEPS: f64 = 5000.0;
const DEFAULT_RECENT_HEART_RATE: f64 = 70.0;
const DEFAULT_RECENT_SLEEP_HOURS: f64 = 7.5;
const DEFAULT_RECENT_GLUCOSE: f64 = 90.0;
/// Preparation time assumed for foods without one
const DEFAULT_PREPARATION_MIN: f64 = 10.0;

/// Predicts how much a user will enjoy a food, on a 1-5 scale
///
/// Implementations are read-only during a planning run and shared across
/// threads.
pub trait SatisfactionModel: Send + Sync {
    fn predict_satisfaction(&self, user: &UserFeatures, food: &FoodFeatures) -> f64;
}

/// Constant score used when no trained model is available
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeutralSatisfaction {
    score: f64,
}

impl NeutralSatisfaction {
    pub fn new(score: f64) -> Self {
        Self {
            score: score.clamp(MIN_SATISFACTION, MAX_SATISFACTION),
        }
    }
}

impl Default for NeutralSatisfaction {
    fn default() -> Self {
        Self::new(3.0)
    }
}

impl SatisfactionModel for NeutralSatisfaction {
    fn predict_satisfaction(&self, _user: &UserFeatures, _food: &FoodFeatures) -> f64 {
        self.score
    }
}

/// Clamp any model output into the 1-5 range
pub fn bounded_prediction(model: &dyn SatisfactionModel, user: &UserFeatures, food: &FoodFeatures) -> f64 {
    let raw = model.predict_satisfaction(user, food);
    if raw.is_nan() {
        return MIN_SATISFACTION;
    }
    raw.clamp(MIN_SATISFACTION, MAX_SATISFACTION)
}

// ============================================================================
// Feature extraction
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFeatures {
    pub age: f64,
    pub sex_male: f64,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub bmi: f64,
    pub activity_level: f64,
    pub bmr: f64,
    pub tdee: f64,
    pub daily_budget: f64,
    pub vegetarian: f64,
    pub vegan: f64,
    pub num_allergies: f64,
    pub num_preferred_foods: f64,
    pub recent_steps: f64,
    pub recent_heart_rate: f64,
    pub recent_sleep_hours: f64,
    pub recent_glucose: f64,
}

impl UserFeatures {
    pub fn from_profile(profile: &UserProfile, default_budget: f64) -> Self {
        let restrictions = &profile.dietary_preferences.dietary_restrictions;
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        let latest = profile.latest_biometrics();

        Self {
            age: f64::from(profile.age),
            sex_male: flag(profile.sex.is_male()),
            weight_kg: profile.weight_kg,
            height_cm: profile.height_cm,
            bmi: profile.bmi(),
            activity_level: profile.activity_level.multiplier(),
            bmr: MetabolismEngine::bmr(profile, BmrMethod::MifflinStJeor, None),
            tdee: calculate_tdee(&profile.health_profile()),
            daily_budget: profile.daily_budget.unwrap_or(default_budget),
            vegetarian: flag(restrictions.contains(&DietaryRestriction::Vegetarian)),
            vegan: flag(restrictions.contains(&DietaryRestriction::Vegan)),
            num_allergies: profile.dietary_preferences.allergies.len() as f64,
            num_preferred_foods: profile.preferred_foods.len() as f64,
            recent_steps: latest
                .and_then(|s| s.steps)
                .map_or(DEFAULT_RECENT_STEPS, f64::from),
            recent_heart_rate: latest
                .and_then(|s| s.heart_rate)
                .map_or(DEFAULT_RECENT_HEART_RATE, f64::from),
            recent_sleep_hours: latest
                .and_then(|s| s.sleep_hours)
                .unwrap_or(DEFAULT_RECENT_SLEEP_HOURS),
            recent_glucose: latest
                .and_then(|s| s.glucose_mg_dl)
                .unwrap_or(DEFAULT_RECENT_GLUCOSE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodFeatures {
    pub calories_per_100g: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub cost_per_100g: f64,
    pub preparation_time: f64,
    pub has_dairy: f64,
    pub has_gluten: f64,
    pub category_protein: f64,
    pub category_carbohydrate: f64,
    pub category_vegetable: f64,
}

impl FoodFeatures {
    pub fn from_candidate(candidate: &MealCandidate) -> Self {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        let category = candidate.category.to_lowercase();

        Self {
            calories_per_100g: candidate.calories_per_100g,
            protein_g: candidate.protein_g,
            carbs_g: candidate.carbs_g,
            fat_g: candidate.fat_g,
            cost_per_100g: candidate.cost_per_100g,
            preparation_time: candidate
                .preparation_time_min
                .map_or(DEFAULT_PREPARATION_MIN, f64::from),
            has_dairy: flag(candidate.allergens.contains("dairy")),
            has_gluten: flag(candidate.allergens.contains("gluten")),
            category_protein: flag(category == "protein"),
            category_carbohydrate: flag(category == "carbohydrate"),
            category_vegetable: flag(category == "vegetable"),
        }
    }
}
