//! Meal optimizer - scores food candidates per meal slot and sizes the
//! winning portion against the slot's calorie share

use crate::config::MealConfig;
use crate::error::{EngineError, EngineResult};
use crate::services::satisfaction::{bounded_prediction, FoodFeatures, SatisfactionModel, UserFeatures};
use nutrition_engine_shared::models::{Meal, MealCandidate, NutritionTotals, UserProfile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

const SATISFACTION_WEIGHT: f64 = 0.4;
const DENSITY_WEIGHT: f64 = 0.3;
const COST_WEIGHT: f64 = 0.2;
const FIT_WEIGHT: f64 = 0.1;

const MAX_NUTRIENT_DENSITY: f64 = 2.0;
const MIN_COST_PER_100G: f64 = 0.1;
const MIN_CALORIES_PER_100G: f64 = 1.0;

/// Slots planned when the caller names none
pub const DEFAULT_MEAL_TYPES: [&str; 3] = ["breakfast", "lunch", "dinner"];

/// Which food won a slot and how much of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSelection {
    pub meal_type: String,
    pub food: String,
    pub score: f64,
    pub target_calories: f64,
    pub portion_g: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedPlan {
    pub meals: Vec<Meal>,
    pub selections: Vec<SlotSelection>,
    pub total_nutrition: NutritionTotals,
    pub total_cost: f64,
}

/// Greedy per-slot food selection
#[derive(Clone)]
pub struct MealOptimizer {
    meals: MealConfig,
    satisfaction: Arc<dyn SatisfactionModel>,
    default_budget: f64,
}

impl MealOptimizer {
    pub fn new(meals: MealConfig, satisfaction: Arc<dyn SatisfactionModel>, default_budget: f64) -> Self {
        Self {
            meals,
            satisfaction,
            default_budget,
        }
    }

    /// Pick one food per slot and size it to the slot's calorie share
    ///
    /// `candidates` must already be filtered; their order decides ties.
    pub fn optimize(
        &self,
        profile: &UserProfile,
        candidates: &[MealCandidate],
        calorie_target: f64,
        meal_types: &[String],
    ) -> EngineResult<OptimizedPlan> {
        if candidates.is_empty() {
            return Err(EngineError::Infeasible("No allowed foods available".to_string()));
        }

        let slots: Vec<String> = if meal_types.is_empty() {
            DEFAULT_MEAL_TYPES.iter().map(|s| s.to_string()).collect()
        } else {
            meal_types.to_vec()
        };

        let user = UserFeatures::from_profile(profile, self.default_budget);
        let foods: Vec<FoodFeatures> = candidates.iter().map(FoodFeatures::from_candidate).collect();

        let mut meals = Vec::with_capacity(slots.len());
        let mut selections = Vec::with_capacity(slots.len());
        let mut total_cost = 0.0;

        for meal_type in &slots {
            let target = calorie_target.max(0.0) * self.meals.share_for(meal_type);

            let mut best: Option<(usize, f64)> = None;
            for (idx, (candidate, features)) in candidates.iter().zip(&foods).enumerate() {
                let score = self.score(&user, candidate, features, meal_type);
                if best.map_or(true, |(_, best_score)| score > best_score) {
                    best = Some((idx, score));
                }
            }
            let Some((idx, score)) = best else {
                return Err(EngineError::Infeasible("No allowed foods available".to_string()));
            };
            let chosen = &candidates[idx];

            let portion_g = (100.0 * target / chosen.calories_per_100g.max(MIN_CALORIES_PER_100G))
                .min(self.meals.max_portion_g);
            let ratio = portion_g / 100.0;
            let cost = chosen.cost_per_100g * ratio;

            debug!(meal_type = %meal_type, food = %chosen.name, score, portion_g, "Selected food for slot");

            meals.push(Meal {
                meal_type: meal_type.clone(),
                items: vec![chosen.name.clone()],
                calories: chosen.calories_per_100g * ratio,
                protein: chosen.protein_g * ratio,
                carbs: chosen.carbs_g * ratio,
                fat: chosen.fat_g * ratio,
            });
            selections.push(SlotSelection {
                meal_type: meal_type.clone(),
                food: chosen.name.clone(),
                score,
                target_calories: target,
                portion_g,
                cost,
            });
            total_cost += cost;
        }

        let total_nutrition = NutritionTotals::from_meals(&meals);
        info!(
            slots = meals.len(),
            calories = total_nutrition.calories,
            total_cost,
            "Meal plan optimized"
        );

        Ok(OptimizedPlan {
            meals,
            selections,
            total_nutrition,
            total_cost,
        })
    }

    /// 0.4 satisfaction + 0.3 nutrient density + 0.2 cost efficiency + 0.1 meal-type fit
    pub fn score(
        &self,
        user: &UserFeatures,
        candidate: &MealCandidate,
        features: &FoodFeatures,
        meal_type: &str,
    ) -> f64 {
        let satisfaction = bounded_prediction(self.satisfaction.as_ref(), user, features);
        SATISFACTION_WEIGHT * satisfaction
            + DENSITY_WEIGHT * nutrient_density(candidate)
            + COST_WEIGHT * cost_efficiency(candidate)
            + FIT_WEIGHT * meal_type_fit(candidate, meal_type)
    }
}

/// `(protein × 4 + fiber × 2) / calories`, capped at 2
pub fn nutrient_density(candidate: &MealCandidate) -> f64 {
    let calories = candidate.calories_per_100g.max(MIN_CALORIES_PER_100G);
    ((candidate.protein_g * 4.0 + candidate.fiber_g * 2.0) / calories).min(MAX_NUTRIENT_DENSITY)
}

pub fn cost_efficiency(candidate: &MealCandidate) -> f64 {
    1.0 / candidate.cost_per_100g.max(MIN_COST_PER_100G)
}

/// Fixed lookup of how well a food suits a meal slot
pub fn meal_type_fit(candidate: &MealCandidate, meal_type: &str) -> f64 {
    let category = candidate.category.to_lowercase();
    let name = candidate.name.to_lowercase();

    match meal_type {
        "breakfast" => {
            if ["oat", "egg", "yogurt", "milk"].iter().any(|w| name.contains(w)) {
                1.0
            } else if matches!(category.as_str(), "dairy" | "fruit") {
                0.8
            } else {
                0.5
            }
        }
        "lunch" => match category.as_str() {
            "protein" | "carbohydrate" | "vegetable" => 1.0,
            _ => 0.7,
        },
        "dinner" => match category.as_str() {
            "protein" | "vegetable" => 1.0,
            "carbohydrate" => 0.8,
            _ => 0.6,
        },
        _ => 0.5,
    }
}
