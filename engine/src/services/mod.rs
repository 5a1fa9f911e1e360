//! Business logic services
//!
//! Services encapsulate the nutrition pipeline: trend analysis, metabolism,
//! candidate filtering, optimization and adaptation, coordinated by the
//! meal plan service.

pub mod adaptation;
pub mod metabolism;
pub mod optimizer;
pub mod planner;
pub mod preferences;
pub mod satisfaction;
pub mod trends;

pub use adaptation::{AdaptationOutcome, AdaptationRuleEngine};
pub use metabolism::MetabolismEngine;
pub use optimizer::{MealOptimizer, OptimizedPlan, SlotSelection};
pub use planner::{
    InsightsRequest, MealPlanRequest, MealPlanResponse, MealPlanService, NutritionInsightsResponse,
    TrendsRequest,
};
pub use preferences::{DietaryFilter, PreferenceRanker, RankedCandidate};
pub use satisfaction::{FoodFeatures, NeutralSatisfaction, SatisfactionModel, UserFeatures};
pub use trends::{AdaptationReason, TrendAnalyzer, TrendReport};
