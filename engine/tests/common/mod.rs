//! Common test utilities for integration tests
//!
//! This module provides a fixed-clock engine, the reference profile and a
//! small food pool shared by the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use fake::faker::name::en::Name;
use fake::Fake;
use nutrition_engine::config::EngineConfig;
use nutrition_engine::error::EngineResult;
use nutrition_engine::services::{
    InsightsRequest, MealPlanRequest, MealPlanResponse, MealPlanService, NutritionInsightsResponse,
};
use nutrition_engine::state::EngineState;
use nutrition_engine_shared::health_metrics::{ActivityLevel, BiologicalSex};
use nutrition_engine_shared::models::{BiometricSample, MealCandidate, UserProfile};
use nutrition_engine_shared::types::CalorieGoal;

/// Engine wrapper with a pinned reference time
pub struct TestEngine {
    pub state: EngineState,
    pub now: DateTime<Utc>,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            state: EngineState::new(config),
            now: Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(),
        }
    }

    pub fn plan(&self, request: &MealPlanRequest) -> EngineResult<MealPlanResponse> {
        MealPlanService::generate_at(&self.state, request, self.now)
    }

    pub fn insights(&self, profile: UserProfile, biometrics: Vec<BiometricSample>) -> EngineResult<NutritionInsightsResponse> {
        let request = InsightsRequest {
            profile,
            biometrics,
            goal: CalorieGoal::Maintain,
            rate_kg_per_week: 0.5,
        };
        MealPlanService::insights_at(&self.state, &request, self.now)
    }

    /// Empty sample taken `days` days before the reference time
    pub fn sample_days_ago(&self, days: i64) -> BiometricSample {
        BiometricSample::at(self.now - Duration::days(days))
    }
}

/// 32-year-old moderately active male, 75 kg, 180 cm
pub fn reference_profile() -> UserProfile {
    let mut profile = UserProfile::new(32, BiologicalSex::Male, 75.0, 180.0, ActivityLevel::ModeratelyActive);
    profile.name = Name().fake();
    profile
}

pub fn food_pool() -> Vec<MealCandidate> {
    vec![
        MealCandidate::new("Oatmeal", "carbohydrate", 389.0)
            .with_macros(16.9, 66.3, 6.9)
            .with_fiber(10.6)
            .with_cost(0.5)
            .with_allergen("gluten"),
        MealCandidate::new("Greek Yogurt", "dairy", 59.0)
            .with_macros(10.0, 3.6, 0.4)
            .with_cost(0.9)
            .with_allergen("dairy"),
        MealCandidate::new("Chicken Breast", "protein", 165.0)
            .with_macros(31.0, 0.0, 3.6)
            .with_cost(1.2),
        MealCandidate::new("Brown Rice", "carbohydrate", 111.0)
            .with_macros(2.6, 23.0, 0.9)
            .with_fiber(1.8)
            .with_cost(0.3),
        MealCandidate::new("Salmon", "protein", 208.0)
            .with_macros(20.0, 0.0, 13.0)
            .with_cost(2.5),
        MealCandidate::new("Broccoli", "vegetable", 34.0)
            .with_macros(2.8, 7.0, 0.4)
            .with_fiber(2.6)
            .with_cost(0.6),
    ]
}
