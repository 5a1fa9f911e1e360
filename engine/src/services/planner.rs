//! Meal plan service - runs the full adaptive pipeline and builds the
//! nutrition insights report
//!
//! Pipeline for one plan:
//! - Adaptive TDEE from profile and biometric samples
//! - Goal target clamped to the safety bounds
//! - Dietary filtering and preference ranking
//! - Per-slot optimization
//! - Trend-driven adaptation
//! - Totals, personalization notes and metabolic insights

use crate::error::{EngineError, EngineResult};
use crate::services::adaptation::AdaptationRuleEngine;
use crate::services::metabolism::MetabolismEngine;
use crate::services::optimizer::{MealOptimizer, SlotSelection};
use crate::services::preferences::PreferenceRanker;
use crate::services::trends::{TrendAnalyzer, TrendReport};
use crate::state::EngineState;
use chrono::{DateTime, NaiveDate, Utc};
use nutrition_engine_shared::health_metrics::{calculate_tdee, classify_bmi, BmiCategory, BmrMethod};
use nutrition_engine_shared::models::{
    BiometricSample, MacroTargets, Meal, MealCandidate, NutritionTotals, UserProfile,
};
use nutrition_engine_shared::types::{CalorieGoal, CalorieRequirements, MetabolicInsights, TdeeBreakdown};
use nutrition_engine_shared::validation::{validate_candidate, validate_profile, validate_sample};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// History window compared against the planned protein
const PERSONALIZATION_HISTORY_DAYS: i64 = 14;
/// Activity multiplier above which a profile counts as highly active
const HIGH_ACTIVITY_MULTIPLIER: f64 = 1.6;
const DEFAULT_MEAL_COUNT: usize = 3;
const DEFAULT_RATE_KG_PER_WEEK: f64 = 0.5;

const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Requests
// ============================================================================

/// Meal plan request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlanRequest {
    pub profile: UserProfile,
    /// Food pool to plan from
    #[serde(default)]
    pub candidates: Vec<MealCandidate>,
    /// Extra samples on top of the profile's own history
    #[serde(default)]
    pub biometrics: Vec<BiometricSample>,
    #[serde(default = "default_meal_count")]
    pub meal_count: usize,
    /// Explicit slots; overrides `meal_count`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_types: Option<Vec<String>>,
    #[serde(default)]
    pub goal: CalorieGoal,
    #[serde(default = "default_rate")]
    pub rate_kg_per_week: f64,
}

/// Nutrition insights request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsRequest {
    pub profile: UserProfile,
    #[serde(default)]
    pub biometrics: Vec<BiometricSample>,
    #[serde(default)]
    pub goal: CalorieGoal,
    #[serde(default = "default_rate")]
    pub rate_kg_per_week: f64,
}

/// Trend analysis request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendsRequest {
    pub samples: Vec<BiometricSample>,
    /// Defaults to the configured analysis window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_days: Option<u32>,
}

fn default_meal_count() -> usize {
    DEFAULT_MEAL_COUNT
}

fn default_rate() -> f64 {
    DEFAULT_RATE_KG_PER_WEEK
}

impl MealPlanRequest {
    pub fn new(profile: UserProfile, candidates: Vec<MealCandidate>) -> Self {
        Self {
            profile,
            candidates,
            biometrics: Vec::new(),
            meal_count: DEFAULT_MEAL_COUNT,
            meal_types: None,
            goal: CalorieGoal::default(),
            rate_kg_per_week: DEFAULT_RATE_KG_PER_WEEK,
        }
    }

    /// Profile history followed by the request's own samples
    pub fn samples(&self) -> Vec<BiometricSample> {
        combined_samples(&self.profile, &self.biometrics)
    }

    pub fn meal_types(&self) -> Vec<String> {
        self.meal_types
            .clone()
            .unwrap_or_else(|| meal_types_for_count(self.meal_count))
    }
}

fn combined_samples(profile: &UserProfile, extra: &[BiometricSample]) -> Vec<BiometricSample> {
    profile
        .biometric_history
        .iter()
        .chain(extra)
        .cloned()
        .collect()
}

// ============================================================================
// Responses
// ============================================================================

/// Successful meal plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanResponse {
    pub success: bool,
    pub plan_id: Uuid,
    pub meals: Vec<Meal>,
    pub selections: Vec<SlotSelection>,
    pub total_nutrition: NutritionTotals,
    pub total_cost: f64,
    pub calorie_requirements: CalorieRequirements,
    pub macro_targets: MacroTargets,
    pub tdee: TdeeBreakdown,
    /// One explanation per applied adaptation
    pub adaptations: Vec<String>,
    pub alerts: Vec<String>,
    pub personalization_notes: String,
    pub metabolic_insights: MetabolicInsights,
    pub engine_version: String,
    pub generated_at: DateTime<Utc>,
}

/// Static profile numbers shown in the insights report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub bmr: f64,
    pub tdee: f64,
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub activity_level: String,
}

/// Nutrition and metabolic analysis for one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionInsightsResponse {
    pub success: bool,
    pub profile: ProfileSummary,
    pub calorie_requirements: CalorieRequirements,
    pub macro_targets: MacroTargets,
    pub metabolic_insights: MetabolicInsights,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biometric_analysis: Option<TrendReport>,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

// ============================================================================
// Service
// ============================================================================

/// Meal plan service for business logic
pub struct MealPlanService;

impl MealPlanService {
    pub fn generate(state: &EngineState, request: &MealPlanRequest) -> EngineResult<MealPlanResponse> {
        Self::generate_at(state, request, Utc::now())
    }

    /// Run the full pipeline with an explicit reference time
    pub fn generate_at(
        state: &EngineState,
        request: &MealPlanRequest,
        now: DateTime<Utc>,
    ) -> EngineResult<MealPlanResponse> {
        validate_plan_request(request)?;

        let config = state.config();
        let profile = &request.profile;
        let samples = request.samples();
        let budget = config.budget.default_daily_usd;

        let tdee = MetabolismEngine::tdee(profile, &samples, true);
        let calorie_requirements = MetabolismEngine::calorie_requirements(
            tdee.bmr,
            tdee.adaptive_tdee,
            request.goal,
            request.rate_kg_per_week,
        );
        let calorie_target = calorie_requirements.target;
        let macro_targets = profile.macro_targets_for(calorie_target, &config.macros);
        debug!(calorie_target, adaptive_tdee = tdee.adaptive_tdee, "Calorie target");

        let pool: Vec<MealCandidate> = PreferenceRanker::rank(profile, &request.candidates, budget)
            .into_iter()
            .map(|ranked| ranked.candidate)
            .collect();

        let optimizer = MealOptimizer::new(config.meals.clone(), Arc::clone(&state.satisfaction), budget);
        let plan = optimizer.optimize(profile, &pool, calorie_target, &request.meal_types())?;

        let report = TrendAnalyzer::new(config.thresholds).analyze_at(
            &samples,
            config.analysis.window_days,
            now,
        );
        let outcome = AdaptationRuleEngine::apply(&plan.meals, &report);

        let total_nutrition = NutritionTotals::from_meals(&outcome.meals);
        let personalization_notes = personalization_notes(profile, &outcome.meals, now.date_naive());
        let metabolic_insights = MetabolismEngine::insights_from_factors(&tdee.adaptive_factors);

        let response = MealPlanResponse {
            success: true,
            plan_id: Uuid::new_v4(),
            meals: outcome.meals,
            selections: plan.selections,
            total_nutrition,
            total_cost: plan.total_cost,
            calorie_requirements,
            macro_targets,
            tdee,
            adaptations: outcome.explanations,
            alerts: report.alerts,
            personalization_notes,
            metabolic_insights,
            engine_version: ENGINE_VERSION.to_string(),
            generated_at: now,
        };

        info!(
            plan_id = %response.plan_id,
            user = %profile.name,
            meals = response.meals.len(),
            calories = response.total_nutrition.calories,
            adaptations = response.adaptations.len(),
            "Meal plan generated"
        );

        Ok(response)
    }

    pub fn insights(state: &EngineState, request: &InsightsRequest) -> EngineResult<NutritionInsightsResponse> {
        Self::insights_at(state, request, Utc::now())
    }

    pub fn insights_at(
        state: &EngineState,
        request: &InsightsRequest,
        now: DateTime<Utc>,
    ) -> EngineResult<NutritionInsightsResponse> {
        validate_profile(&request.profile)?;
        validate_samples(&request.profile, &request.biometrics)?;
        validate_rate(request.rate_kg_per_week)?;

        let config = state.config();
        let profile = &request.profile;
        let samples = combined_samples(profile, &request.biometrics);

        let bmi = profile.bmi();
        let summary = ProfileSummary {
            bmr: MetabolismEngine::bmr(profile, BmrMethod::MifflinStJeor, None),
            tdee: calculate_tdee(&profile.health_profile()),
            bmi,
            bmi_category: classify_bmi(bmi),
            activity_level: profile.activity_level.as_str().to_string(),
        };

        let biometric_analysis = if samples.is_empty() {
            None
        } else {
            Some(TrendAnalyzer::new(config.thresholds).analyze_at(
                &samples,
                config.analysis.window_days,
                now,
            ))
        };

        let response = NutritionInsightsResponse {
            success: true,
            profile: summary,
            calorie_requirements: MetabolismEngine::calorie_needs_by_goal(
                profile,
                request.goal,
                request.rate_kg_per_week,
            ),
            macro_targets: profile.macro_targets(&config.macros),
            metabolic_insights: MetabolismEngine::metabolic_insights(profile, &samples),
            biometric_analysis,
            recommendations: nutrition_recommendations(profile, &samples),
            generated_at: now,
        };

        info!(
            user = %profile.name,
            recommendations = response.recommendations.len(),
            "Nutrition insights generated"
        );

        Ok(response)
    }

    /// Trend report over the requested (or configured) window
    pub fn trends_at(
        state: &EngineState,
        request: &TrendsRequest,
        now: DateTime<Utc>,
    ) -> EngineResult<TrendReport> {
        for sample in &request.samples {
            validate_sample(sample)?;
        }
        let config = state.config();
        let window_days = request.window_days.unwrap_or(config.analysis.window_days);
        Ok(TrendAnalyzer::new(config.thresholds).analyze_at(&request.samples, window_days, now))
    }
}

fn validate_plan_request(request: &MealPlanRequest) -> EngineResult<()> {
    validate_profile(&request.profile)?;
    validate_samples(&request.profile, &request.biometrics)?;
    for candidate in &request.candidates {
        validate_candidate(candidate)?;
    }
    validate_rate(request.rate_kg_per_week)
}

/// Stored history feeds the adaptive factors too, so it is checked with the request samples
fn validate_samples(profile: &UserProfile, extra: &[BiometricSample]) -> EngineResult<()> {
    for sample in profile.biometric_history.iter().chain(extra) {
        validate_sample(sample)?;
    }
    Ok(())
}

fn validate_rate(rate_kg_per_week: f64) -> EngineResult<()> {
    if !rate_kg_per_week.is_finite() || rate_kg_per_week < 0.0 {
        return Err(EngineError::Validation(format!(
            "Weekly rate must be a non-negative number, got {}",
            rate_kg_per_week
        )));
    }
    Ok(())
}

/// Slot names for a daily meal count; unsupported counts get three meals
pub fn meal_types_for_count(count: usize) -> Vec<String> {
    let slots: &[&str] = match count {
        1 => &["lunch"],
        2 => &["breakfast", "dinner"],
        4 => &["breakfast", "morning_snack", "lunch", "dinner"],
        5 => &["breakfast", "morning_snack", "lunch", "afternoon_snack", "dinner"],
        _ => &["breakfast", "lunch", "dinner"],
    };
    slots.iter().map(|s| s.to_string()).collect()
}

/// Short notes on how the plan was tailored
pub fn personalization_notes(profile: &UserProfile, meals: &[Meal], today: NaiveDate) -> String {
    let mut notes = Vec::new();

    let recent = profile.recent_meals(PERSONALIZATION_HISTORY_DAYS, today);
    if !recent.is_empty() && !meals.is_empty() {
        let history_avg = recent.iter().map(|m| m.protein_g).sum::<f64>() / recent.len() as f64;
        let plan_avg = meals.iter().map(|m| m.protein).sum::<f64>() / meals.len() as f64;

        if plan_avg > history_avg * 1.2 {
            notes.push("Increased protein based on recent low intake pattern".to_string());
        } else if plan_avg < history_avg * 0.8 {
            notes.push("Reduced protein to match recent preference trends".to_string());
        }
    }

    if let Some(budget) = profile.daily_budget {
        notes.push(format!("Meal plan optimized for daily budget of ${:.2}", budget));
    }

    let restrictions = &profile.dietary_preferences.dietary_restrictions;
    if !restrictions.is_empty() {
        let names: Vec<&str> = restrictions.iter().map(|r| r.as_str()).collect();
        notes.push(format!("Customized for {} dietary requirements", names.join(", ")));
    }

    if profile.activity_level.multiplier() > HIGH_ACTIVITY_MULTIPLIER {
        notes.push("Higher calorie and protein targets for active lifestyle".to_string());
    }

    if notes.is_empty() {
        "Standard personalized meal plan".to_string()
    } else {
        notes.join("; ")
    }
}

/// Rule-based advice from profile attributes and the latest sample
pub fn nutrition_recommendations(profile: &UserProfile, samples: &[BiometricSample]) -> Vec<String> {
    let mut recommendations: Vec<&str> = Vec::new();

    let bmi = profile.bmi();
    if bmi < 18.5 {
        recommendations.push("Consider increasing caloric intake for healthy weight gain");
    } else if bmi > 25.0 {
        recommendations.push("Focus on nutrient-dense, lower-calorie foods for weight management");
    }

    if profile.activity_level.multiplier() > HIGH_ACTIVITY_MULTIPLIER {
        recommendations.push("Increase protein intake to support high activity levels");
        recommendations.push("Ensure adequate carbohydrate intake for energy");
    }

    if profile.age > 50 {
        recommendations.push("Prioritize calcium and vitamin D rich foods");
        recommendations.push("Focus on high-quality protein sources");
    }

    if let Some(latest) = samples.iter().max_by_key(|s| s.timestamp) {
        if latest.glucose_mg_dl.is_some_and(|g| g > 100.0) {
            recommendations.push("Monitor carbohydrate intake and timing");
        }
        if latest.steps.is_some_and(|s| s < 5000) {
            recommendations.push("Consider smaller, more frequent meals");
        }
        if latest.sleep_hours.is_some_and(|h| h < 7.0) {
            recommendations.push("Focus on foods that support sleep quality");
        }
    }

    recommendations.into_iter().map(String::from).collect()
}
