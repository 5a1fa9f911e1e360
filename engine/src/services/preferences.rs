//! Dietary filtering and per-run preference ranking of food candidates

use nutrition_engine_shared::models::{DietaryRestriction, MealCandidate, UserProfile};
use serde::{Deserialize, Serialize};
use tracing::debug;

const MEAT_KEYWORDS: &[&str] = &[
    "chicken", "beef", "pork", "turkey", "fish", "salmon", "tuna", "meat",
];
const ANIMAL_KEYWORDS: &[&str] = &[
    "chicken", "beef", "pork", "turkey", "fish", "salmon", "tuna", "meat", "milk", "cheese",
    "yogurt", "egg", "butter", "honey",
];
const GLUTEN_KEYWORDS: &[&str] = &["wheat", "bread", "pasta", "oat", "barley", "rye"];
const DAIRY_KEYWORDS: &[&str] = &["milk", "cheese", "yogurt", "butter", "cream"];

/// Carb ceilings per 100 g
const KETO_MAX_CARBS_G: f64 = 5.0;
const LOW_CARB_MAX_CARBS_G: f64 = 15.0;

/// Allergy, dislike and diet rules applied before optimization
pub struct DietaryFilter;

impl DietaryFilter {
    /// Whether `candidate` passes every allergy, dislike, restriction and
    /// preparation-time rule of `profile`
    pub fn is_allowed(profile: &UserProfile, candidate: &MealCandidate) -> bool {
        let prefs = &profile.dietary_preferences;
        let name = candidate.name.to_lowercase();

        let allergic = prefs.allergies.iter().any(|allergy| {
            let allergy = allergy.to_lowercase();
            candidate.allergens.iter().any(|a| a.to_lowercase() == allergy) || name.contains(&allergy)
        });
        if allergic {
            return false;
        }

        if prefs.dislikes.iter().any(|d| name.contains(&d.to_lowercase())) {
            return false;
        }

        if let (Some(limit), Some(minutes)) =
            (prefs.max_preparation_time_min, candidate.preparation_time_min)
        {
            if minutes > limit {
                return false;
            }
        }

        prefs
            .dietary_restrictions
            .iter()
            .all(|r| Self::meets_restriction(candidate, *r))
    }

    pub fn meets_restriction(candidate: &MealCandidate, restriction: DietaryRestriction) -> bool {
        let name = candidate.name.to_lowercase();
        let excludes = |keywords: &[&str]| !keywords.iter().any(|k| name.contains(k));

        match restriction {
            DietaryRestriction::Vegetarian => excludes(MEAT_KEYWORDS),
            DietaryRestriction::Vegan => excludes(ANIMAL_KEYWORDS),
            DietaryRestriction::GlutenFree => excludes(GLUTEN_KEYWORDS),
            DietaryRestriction::DairyFree => excludes(DAIRY_KEYWORDS),
            DietaryRestriction::Keto => candidate.carbs_g < KETO_MAX_CARBS_G,
            DietaryRestriction::LowCarb => candidate.carbs_g < LOW_CARB_MAX_CARBS_G,
            DietaryRestriction::Pescatarian | DietaryRestriction::Paleo | DietaryRestriction::LowFat => {
                true
            }
        }
    }
}

/// A candidate with its transient preference score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub candidate: MealCandidate,
    pub preference_score: f64,
}

/// Scores and orders allowed candidates for one planning run
pub struct PreferenceRanker;

impl PreferenceRanker {
    /// 1.0 + 0.5 per preferred match - 0.3 per avoided match + 0.2 cuisine
    /// match + 0.1 when affordable, floored at zero
    pub fn preference_score(profile: &UserProfile, candidate: &MealCandidate, default_budget: f64) -> f64 {
        let name = candidate.name.to_lowercase();
        let matches = |foods: &[String]| {
            foods
                .iter()
                .filter(|f| name.contains(&f.to_lowercase()))
                .count() as f64
        };

        let mut score = 1.0;
        score += 0.5 * matches(profile.preferred_foods.as_slice());
        score -= 0.3 * matches(profile.avoided_foods.as_slice());

        if let Some(cuisine) = &candidate.cuisine_type {
            if profile.dietary_preferences.cuisine_preferences.contains(cuisine) {
                score += 0.2;
            }
        }

        let budget = profile.daily_budget.unwrap_or(default_budget);
        if candidate.cost_per_100g <= budget / 10.0 {
            score += 0.1;
        }

        score.max(0.0)
    }

    /// Allowed candidates, highest preference first; ties keep input order
    pub fn rank(profile: &UserProfile, candidates: &[MealCandidate], default_budget: f64) -> Vec<RankedCandidate> {
        let mut ranked: Vec<RankedCandidate> = candidates
            .iter()
            .filter(|c| DietaryFilter::is_allowed(profile, c))
            .map(|c| RankedCandidate {
                preference_score: Self::preference_score(profile, c, default_budget),
                candidate: c.clone(),
            })
            .collect();

        ranked.sort_by(|a, b| b.preference_score.total_cmp(&a.preference_score));

        debug!(
            offered = candidates.len(),
            allowed = ranked.len(),
            "Ranked food candidates"
        );
        ranked
    }
}
