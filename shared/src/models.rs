//! Data models for the nutrition engine
//!
//! Inputs (`BiometricSample`, `UserProfile`, `MealCandidate`) are plain
//! serde records; outputs (`Meal`, `NutritionTotals`) carry the macro/calorie
//! helpers every pipeline stage relies on.

use crate::health_metrics::{
    calculate_bmi, calories_from_macros, ActivityLevel, BiologicalSex, HealthProfile,
    KCAL_PER_GRAM_CARBS, KCAL_PER_GRAM_FAT, KCAL_PER_GRAM_PROTEIN,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

/// Days of meal history kept on a profile
pub const MEAL_HISTORY_RETENTION_DAYS: i64 = 90;

/// Days of biometric history kept on a profile
pub const BIOMETRIC_RETENTION_DAYS: i64 = 30;

// ============================================================================
// Biometrics
// ============================================================================

/// One wearable/biometric reading
///
/// Every measurement is optional: `None` means "not measured", never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BiometricSample {
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(max = 200_000))]
    pub steps: Option<u32>,
    /// Average heart rate in bpm
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 299))]
    pub heart_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 24.0))]
    pub sleep_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1.0, max = 1000.0))]
    pub glucose_mg_dl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1.0, max = 500.0))]
    pub weight_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "body_fat_percentage")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub body_fat_pct: Option<f64>,
}

impl BiometricSample {
    /// A sample with no measurements
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            steps: None,
            heart_rate: None,
            sleep_hours: None,
            glucose_mg_dl: None,
            weight_kg: None,
            body_fat_pct: None,
        }
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = Some(steps);
        self
    }

    pub fn with_heart_rate(mut self, bpm: u32) -> Self {
        self.heart_rate = Some(bpm);
        self
    }

    pub fn with_sleep_hours(mut self, hours: f64) -> Self {
        self.sleep_hours = Some(hours);
        self
    }

    pub fn with_glucose(mut self, mg_dl: f64) -> Self {
        self.glucose_mg_dl = Some(mg_dl);
        self
    }

    pub fn with_weight(mut self, kg: f64) -> Self {
        self.weight_kg = Some(kg);
        self
    }

    pub fn with_body_fat(mut self, percent: f64) -> Self {
        self.body_fat_pct = Some(percent);
        self
    }
}

// ============================================================================
// User profile
// ============================================================================

/// Dietary restriction types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryRestriction {
    Vegetarian,
    Vegan,
    Pescatarian,
    Keto,
    Paleo,
    LowCarb,
    LowFat,
    GlutenFree,
    DairyFree,
}

impl DietaryRestriction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DietaryRestriction::Vegetarian => "vegetarian",
            DietaryRestriction::Vegan => "vegan",
            DietaryRestriction::Pescatarian => "pescatarian",
            DietaryRestriction::Keto => "keto",
            DietaryRestriction::Paleo => "paleo",
            DietaryRestriction::LowCarb => "low_carb",
            DietaryRestriction::LowFat => "low_fat",
            DietaryRestriction::GlutenFree => "gluten_free",
            DietaryRestriction::DairyFree => "dairy_free",
        }
    }
}

/// User dietary preferences and restrictions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DietaryPreferences {
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub dislikes: Vec<String>,
    #[serde(default)]
    pub cuisine_preferences: Vec<String>,
    #[serde(default)]
    pub dietary_restrictions: Vec<DietaryRestriction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_preparation_time_min: Option<u32>,
}

/// Historical meal used for personalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealHistoryEntry {
    pub date: NaiveDate,
    pub meal_type: String,
    pub foods: Vec<String>,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    /// 1-5 scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satisfaction_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation_time_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

/// Complete user profile snapshot
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserProfile {
    #[serde(default = "default_user_name")]
    pub name: String,
    #[validate(range(min = 1, max = 120))]
    pub age: u32,
    pub sex: BiologicalSex,
    #[validate(range(min = 20.0, max = 500.0))]
    pub weight_kg: f64,
    #[validate(range(min = 50.0, max = 300.0))]
    pub height_cm: f64,
    #[serde(default)]
    pub activity_level: ActivityLevel,

    /// Daily food budget in USD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0))]
    pub daily_budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_protein_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_carbs_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_fat_g: Option<f64>,

    #[serde(default)]
    pub dietary_preferences: DietaryPreferences,

    #[serde(default)]
    pub meal_history: Vec<MealHistoryEntry>,
    #[serde(default, alias = "biometric_data")]
    pub biometric_history: Vec<BiometricSample>,

    #[serde(default)]
    pub preferred_foods: Vec<String>,
    #[serde(default)]
    pub avoided_foods: Vec<String>,
}

fn default_user_name() -> String {
    "User".to_string()
}

impl UserProfile {
    pub fn new(age: u32, sex: BiologicalSex, weight_kg: f64, height_cm: f64, activity_level: ActivityLevel) -> Self {
        Self {
            name: default_user_name(),
            age,
            sex,
            weight_kg,
            height_cm,
            activity_level,
            daily_budget: None,
            goal_weight_kg: None,
            target_calories: None,
            target_protein_g: None,
            target_carbs_g: None,
            target_fat_g: None,
            dietary_preferences: DietaryPreferences::default(),
            meal_history: Vec::new(),
            biometric_history: Vec::new(),
            preferred_foods: Vec::new(),
            avoided_foods: Vec::new(),
        }
    }

    /// Static attributes for the BMR/TDEE formulas
    pub fn health_profile(&self) -> HealthProfile {
        HealthProfile {
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            age_years: self.age,
            sex: self.sex,
            activity_level: self.activity_level,
        }
    }

    pub fn bmi(&self) -> f64 {
        calculate_bmi(self.weight_kg, self.height_cm)
    }

    /// Most recent biometric sample on the profile
    pub fn latest_biometrics(&self) -> Option<&BiometricSample> {
        self.biometric_history.iter().max_by_key(|s| s.timestamp)
    }

    /// Meals from the last `days` days, counted back from `today`
    pub fn recent_meals(&self, days: i64, today: NaiveDate) -> Vec<&MealHistoryEntry> {
        let cutoff = today - Duration::days(days);
        self.meal_history.iter().filter(|m| m.date >= cutoff).collect()
    }

    /// Record a meal, evicting entries older than the retention window
    pub fn add_meal_history(&mut self, entry: MealHistoryEntry, today: NaiveDate) {
        self.meal_history.push(entry);
        let cutoff = today - Duration::days(MEAL_HISTORY_RETENTION_DAYS);
        self.meal_history.retain(|m| m.date >= cutoff);
    }

    /// Record a biometric sample, evicting samples older than the retention window
    pub fn add_biometric_sample(&mut self, sample: BiometricSample, now: DateTime<Utc>) {
        self.biometric_history.push(sample);
        let cutoff = now - Duration::days(BIOMETRIC_RETENTION_DAYS);
        self.biometric_history.retain(|s| s.timestamp >= cutoff);
    }

    /// Move a food between the preferred and avoided lists based on feedback
    pub fn update_food_preference(&mut self, food_name: &str, liked: bool) {
        let (add_to, remove_from) = if liked {
            (&mut self.preferred_foods, &mut self.avoided_foods)
        } else {
            (&mut self.avoided_foods, &mut self.preferred_foods)
        };

        if !add_to.iter().any(|f| f == food_name) {
            add_to.push(food_name.to_string());
        }
        remove_from.retain(|f| f != food_name);
    }

    /// Daily macro targets
    ///
    /// Explicit per-macro targets win; otherwise each macro gets its share of
    /// `target_calories` (or the plain TDEE) divided by its energy density.
    pub fn macro_targets(&self, ratios: &MacroRatios) -> MacroTargets {
        let calories = self
            .target_calories
            .unwrap_or_else(|| crate::health_metrics::calculate_tdee(&self.health_profile()));
        self.macro_targets_for(calories, ratios)
    }

    /// Macro targets around an externally computed calorie target
    pub fn macro_targets_for(&self, calories: f64, ratios: &MacroRatios) -> MacroTargets {
        MacroTargets {
            calories,
            protein_g: self
                .target_protein_g
                .unwrap_or(calories * ratios.protein / KCAL_PER_GRAM_PROTEIN),
            carbs_g: self
                .target_carbs_g
                .unwrap_or(calories * ratios.carbs / KCAL_PER_GRAM_CARBS),
            fat_g: self.target_fat_g.unwrap_or(calories * ratios.fat / KCAL_PER_GRAM_FAT),
        }
    }
}

/// Share of calories per macro
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroRatios {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Default for MacroRatios {
    fn default() -> Self {
        Self {
            protein: 0.25,
            carbs: 0.45,
            fat: 0.30,
        }
    }
}

/// Daily calorie and macro targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroTargets {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

// ============================================================================
// Foods and meals
// ============================================================================

/// A food eligible for selection into a meal slot (values per 100 g)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MealCandidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[validate(range(min = 0.0))]
    pub calories_per_100g: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub protein_g: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub carbs_g: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub fat_g: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub fiber_g: f64,
    #[serde(default = "default_cost_per_100g")]
    #[validate(range(min = 0.0))]
    pub cost_per_100g: f64,
    #[serde(default)]
    pub allergens: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation_time_min: Option<u32>,
}

fn default_cost_per_100g() -> f64 {
    1.0
}

impl MealCandidate {
    pub fn new(name: &str, category: &str, calories_per_100g: f64) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            category: category.to_string(),
            calories_per_100g,
            protein_g: 0.0,
            carbs_g: 0.0,
            fat_g: 0.0,
            fiber_g: 0.0,
            cost_per_100g: default_cost_per_100g(),
            allergens: BTreeSet::new(),
            cuisine_type: None,
            preparation_time_min: None,
        }
    }

    pub fn with_macros(mut self, protein_g: f64, carbs_g: f64, fat_g: f64) -> Self {
        self.protein_g = protein_g;
        self.carbs_g = carbs_g;
        self.fat_g = fat_g;
        self
    }

    pub fn with_fiber(mut self, fiber_g: f64) -> Self {
        self.fiber_g = fiber_g;
        self
    }

    pub fn with_cost(mut self, cost_per_100g: f64) -> Self {
        self.cost_per_100g = cost_per_100g;
        self
    }

    pub fn with_allergen(mut self, allergen: &str) -> Self {
        self.allergens.insert(allergen.to_string());
        self
    }
}

/// One meal slot of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub meal_type: String,
    pub items: Vec<String>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Meal {
    /// Calories implied by the current macros
    pub fn macro_calories(&self) -> f64 {
        calories_from_macros(self.protein, self.carbs, self.fat)
    }

    /// Copy with `calories` re-derived from the macros
    pub fn with_recomputed_calories(self) -> Self {
        let calories = self.macro_calories();
        Self { calories, ..self }
    }

    /// Copy with every numeric field, calories included, scaled by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            meal_type: self.meal_type.clone(),
            items: self.items.clone(),
            calories: self.calories * factor,
            protein: self.protein * factor,
            carbs: self.carbs * factor,
            fat: self.fat * factor,
        }
    }

    /// Whether `calories` matches the macros within `tolerance` kcal
    pub fn is_macro_consistent(&self, tolerance: f64) -> bool {
        (self.calories - self.macro_calories()).abs() <= tolerance
    }
}

/// Aggregate nutrition over a set of meals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl NutritionTotals {
    pub fn add_meal(&mut self, meal: &Meal) {
        self.calories += meal.calories;
        self.protein += meal.protein;
        self.carbs += meal.carbs;
        self.fat += meal.fat;
    }

    pub fn from_meals(meals: &[Meal]) -> Self {
        meals.iter().fold(Self::default(), |mut totals, meal| {
            totals.add_meal(meal);
            totals
        })
    }
}
