//! Engine state management
//!
//! This module provides the shared state handed to every planning call.
//!
//! # Design Principles
//!
//! 1. **Build once**: the satisfaction model is constructed at startup
//! 2. **Cheap cloning**: all fields are behind `Arc`
//! 3. **Immutable after creation**: state is read-only during a planning run

use crate::config::EngineConfig;
use crate::services::satisfaction::{NeutralSatisfaction, SatisfactionModel};
use std::sync::Arc;

/// Shared engine state
#[derive(Clone)]
pub struct EngineState {
    /// Engine configuration
    pub config: Arc<EngineConfig>,
    /// Read-only satisfaction capability shared by all runs
    pub satisfaction: Arc<dyn SatisfactionModel>,
}

impl EngineState {
    /// Create state with the neutral satisfaction model from `config`
    pub fn new(config: EngineConfig) -> Self {
        let satisfaction = Arc::new(NeutralSatisfaction::new(config.satisfaction.neutral_score));
        Self::with_model(config, satisfaction)
    }

    /// Create state around an externally provided satisfaction model
    pub fn with_model(config: EngineConfig, satisfaction: Arc<dyn SatisfactionModel>) -> Self {
        Self {
            config: Arc::new(config),
            satisfaction,
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn satisfaction(&self) -> &dyn SatisfactionModel {
        self.satisfaction.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::satisfaction::{FoodFeatures, UserFeatures};
    use nutrition_engine_shared::health_metrics::{ActivityLevel, BiologicalSex};
    use nutrition_engine_shared::models::{MealCandidate, UserProfile};

    #[test]
    fn test_state_clone_shares_config() {
        let state = EngineState::new(EngineConfig::default());
        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.config, &cloned.config));
        assert!(Arc::ptr_eq(&state.satisfaction, &cloned.satisfaction));
    }

    #[test]
    fn test_neutral_score_comes_from_config() {
        let mut config = EngineConfig::default();
        config.satisfaction.neutral_score = 4.0;
        let state = EngineState::new(config);

        let profile = UserProfile::new(40, BiologicalSex::Female, 65.0, 170.0, ActivityLevel::Sedentary);
        let user = UserFeatures::from_profile(&profile, 15.0);
        let food = FoodFeatures::from_candidate(&MealCandidate::new("Apple", "fruit", 52.0));
        assert_eq!(state.satisfaction().predict_satisfaction(&user, &food), 4.0);
    }
}
