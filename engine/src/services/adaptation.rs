//! Meal adaptation service - rule-based portion and macro adjustments
//! driven by biometric trend alerts

use crate::config::{AnalysisConfig, ThresholdConfig};
use crate::services::trends::{AdaptationReason, MetricTrends, TrendAnalyzer, TrendReport};
use chrono::{DateTime, Utc};
use nutrition_engine_shared::models::{BiometricSample, Meal, UserProfile};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Peak glucose above which carbs get the deeper cut
const SEVERE_GLUCOSE_MG_DL: f64 = 160.0;
/// Net weight change (kg) needed before the weight strategy acts
const WEIGHT_ADJUST_KG: f64 = 1.0;

/// Adapted meals and one explanation per applied strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationOutcome {
    pub meals: Vec<Meal>,
    pub explanations: Vec<String>,
}

/// Maps trend alerts to portion adjustments
#[derive(Debug, Clone)]
pub struct AdaptationRuleEngine {
    analyzer: TrendAnalyzer,
    window_days: u32,
}

impl Default for AdaptationRuleEngine {
    fn default() -> Self {
        Self::new(ThresholdConfig::default(), AnalysisConfig::default().window_days)
    }
}

impl AdaptationRuleEngine {
    pub fn new(thresholds: ThresholdConfig, window_days: u32) -> Self {
        Self {
            analyzer: TrendAnalyzer::new(thresholds),
            window_days,
        }
    }

    /// Analyze `samples` and adapt `meals` to the resulting alerts
    pub fn adapt(
        &self,
        meals: &[Meal],
        profile: &UserProfile,
        samples: &[BiometricSample],
    ) -> AdaptationOutcome {
        self.adapt_at(meals, profile, samples, Utc::now())
    }

    pub fn adapt_at(
        &self,
        meals: &[Meal],
        profile: &UserProfile,
        samples: &[BiometricSample],
        now: DateTime<Utc>,
    ) -> AdaptationOutcome {
        let report = self.analyzer.analyze_at(samples, self.window_days, now);
        debug!(user = %profile.name, tags = report.adaptations_needed.len(), "Adapting meal plan");
        Self::apply(meals, &report)
    }

    /// Apply every tag of `report` in emission order
    ///
    /// Each strategy sees the output of the previous one; a tag repeated in
    /// the report is applied once per occurrence.
    pub fn apply(meals: &[Meal], report: &TrendReport) -> AdaptationOutcome {
        let mut adapted = meals.to_vec();
        let mut explanations = Vec::new();

        for reason in &report.adaptations_needed {
            if let Some((next, explanation)) = Self::strategy(*reason, &adapted, &report.trends) {
                adapted = next;
                explanations.push(explanation);
            }
        }

        if !explanations.is_empty() {
            info!(applied = explanations.len(), "Meal plan adapted");
        }

        AdaptationOutcome {
            meals: adapted,
            explanations,
        }
    }

    /// The adjustment for one tag, or `None` when it has nothing to do
    fn strategy(
        reason: AdaptationReason,
        meals: &[Meal],
        trends: &MetricTrends,
    ) -> Option<(Vec<Meal>, String)> {
        match reason {
            AdaptationReason::HighGlucose => {
                let peak = trends.glucose_summary()?.maximum;
                Some(for_high_glucose(meals, peak))
            }
            AdaptationReason::LowActivity => {
                let avg_steps = trends.activity_summary()?.average_steps;
                Some(for_low_activity(meals, avg_steps))
            }
            AdaptationReason::PoorSleep => {
                let avg_hours = trends.sleep_summary()?.average_hours;
                Some(for_poor_sleep(meals, avg_hours))
            }
            AdaptationReason::HighStress => {
                let avg_bpm = trends.heart_rate_summary()?.average_bpm;
                Some(for_high_stress(meals, avg_bpm))
            }
            AdaptationReason::WeightChange => {
                let change = trends.weight_summary()?.total_change_kg;
                for_weight_change(meals, change)
            }
            AdaptationReason::IllnessRecovery
            | AdaptationReason::ExerciseSession
            | AdaptationReason::MealTiming => None,
        }
    }
}

// ============================================================================
// Strategies
// ============================================================================

fn for_high_glucose(meals: &[Meal], peak_mg_dl: f64) -> (Vec<Meal>, String) {
    let carb_factor = if peak_mg_dl > SEVERE_GLUCOSE_MG_DL { 0.7 } else { 0.8 };

    let adapted = meals
        .iter()
        .map(|meal| {
            Meal {
                carbs: meal.carbs * carb_factor,
                protein: meal.protein * 1.1,
                ..meal.clone()
            }
            .with_recomputed_calories()
        })
        .collect();

    let percent = ((1.0 - carb_factor) * 100.0).round() as u32;
    (
        adapted,
        format!(
            "Reduced carbohydrate intake by {}% due to glucose reading of {:.1} mg/dL",
            percent, peak_mg_dl
        ),
    )
}

fn for_low_activity(meals: &[Meal], avg_steps: f64) -> (Vec<Meal>, String) {
    let adapted = meals.iter().map(|meal| meal.scaled(0.85)).collect();
    (
        adapted,
        format!(
            "Reduced portion sizes by 15% due to low activity level ({:.0} avg steps/day)",
            avg_steps
        ),
    )
}

fn for_poor_sleep(meals: &[Meal], avg_hours: f64) -> (Vec<Meal>, String) {
    let adapted = meals
        .iter()
        .map(|meal| {
            Meal {
                protein: meal.protein * 1.15,
                carbs: meal.carbs * 0.95,
                ..meal.clone()
            }
            .with_recomputed_calories()
        })
        .collect();
    (
        adapted,
        format!(
            "Increased protein by 15% to support recovery from insufficient sleep ({:.1} avg hrs/night)",
            avg_hours
        ),
    )
}

fn for_high_stress(meals: &[Meal], avg_bpm: f64) -> (Vec<Meal>, String) {
    let adapted = meals.iter().map(|meal| meal.scaled(0.95)).collect();
    (
        adapted,
        format!(
            "Adjusted meal composition for stress management (elevated heart rate: {:.1} bpm)",
            avg_bpm
        ),
    )
}

/// Gain trims portions; loss raises protein and calories without
/// re-deriving calories from the macros
fn for_weight_change(meals: &[Meal], change_kg: f64) -> Option<(Vec<Meal>, String)> {
    if change_kg > WEIGHT_ADJUST_KG {
        let adapted = meals.iter().map(|meal| meal.scaled(0.9)).collect();
        Some((
            adapted,
            format!("Reduced portions by 10% due to weight gain of {:.1} kg", change_kg),
        ))
    } else if change_kg < -WEIGHT_ADJUST_KG {
        let adapted = meals
            .iter()
            .map(|meal| Meal {
                protein: meal.protein * 1.1,
                calories: meal.calories * 1.05,
                carbs: meal.carbs * 1.02,
                fat: meal.fat * 1.02,
                ..meal.clone()
            })
            .collect();
        Some((
            adapted,
            format!(
                "Increased portions by 5% due to weight loss of {:.1} kg",
                change_kg.abs()
            ),
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use nutrition_engine_shared::health_metrics::{ActivityLevel, BiologicalSex};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> BiometricSample {
        BiometricSample::at(now() - Duration::days(days))
    }

    fn profile() -> UserProfile {
        UserProfile::new(32, BiologicalSex::Male, 75.0, 180.0, ActivityLevel::ModeratelyActive)
    }

    fn meal(meal_type: &str, protein: f64, carbs: f64, fat: f64) -> Meal {
        Meal {
            meal_type: meal_type.to_string(),
            items: vec!["Food".to_string()],
            calories: 0.0,
            protein,
            carbs,
            fat,
        }
        .with_recomputed_calories()
    }

    fn plan() -> Vec<Meal> {
        vec![
            meal("breakfast", 20.0, 60.0, 10.0),
            meal("lunch", 35.0, 80.0, 20.0),
            meal("dinner", 40.0, 50.0, 25.0),
        ]
    }

    fn engine() -> AdaptationRuleEngine {
        AdaptationRuleEngine::new(ThresholdConfig::default(), 7)
    }

    #[test]
    fn test_no_samples_is_pass_through() {
        let meals = plan();
        let outcome = engine().adapt_at(&meals, &profile(), &[], now());
        assert_eq!(outcome.meals, meals);
        assert!(outcome.explanations.is_empty());
    }

    #[test]
    fn test_glucose_explanation_percent_is_rounded() {
        // (1.0 - 0.8) * 100.0 is 19.999..., truncation would print 19%
        assert!(((1.0f64 - 0.8) * 100.0) < 20.0);

        let samples = vec![days_ago(2).with_glucose(100.0), days_ago(1).with_glucose(150.0)];
        let outcome = engine().adapt_at(&plan(), &profile(), &samples, now());
        assert!(outcome.explanations[0].starts_with("Reduced carbohydrate intake by 20% "));
    }

    #[test]
    fn test_higher_glucose_peak_cuts_more_carbs() {
        let meals = plan();
        let moderate = vec![days_ago(2).with_glucose(100.0), days_ago(1).with_glucose(150.0)];
        let severe = vec![days_ago(2).with_glucose(100.0), days_ago(1).with_glucose(170.0)];

        let a = engine().adapt_at(&meals, &profile(), &moderate, now());
        let b = engine().adapt_at(&meals, &profile(), &severe, now());

        assert!((a.meals[0].carbs - 60.0 * 0.8).abs() < 1e-9);
        assert!((b.meals[0].carbs - 60.0 * 0.7).abs() < 1e-9);
        assert!(b.meals[0].carbs < a.meals[0].carbs);
        assert!((a.meals[0].protein - 22.0).abs() < 1e-9);
        assert_eq!(
            a.explanations,
            vec!["Reduced carbohydrate intake by 20% due to glucose reading of 150.0 mg/dL".to_string()]
        );
        assert_eq!(
            b.explanations[0],
            "Reduced carbohydrate intake by 30% due to glucose reading of 170.0 mg/dL"
        );
        assert!(a.meals.iter().all(|m| m.is_macro_consistent(1e-6)));
    }

    #[test]
    fn test_low_activity_scales_everything() {
        let meals = plan();
        let samples: Vec<BiometricSample> = (1..=3).map(|d| days_ago(d).with_steps(3200)).collect();
        let outcome = engine().adapt_at(&meals, &profile(), &samples, now());

        assert!((outcome.meals[1].calories - meals[1].calories * 0.85).abs() < 1e-9);
        assert!((outcome.meals[1].fat - 17.0).abs() < 1e-9);
        assert_eq!(
            outcome.explanations,
            vec!["Reduced portion sizes by 15% due to low activity level (3200 avg steps/day)".to_string()]
        );
    }

    #[test]
    fn test_poor_sleep_rebalances_macros() {
        let meals = plan();
        let samples = vec![days_ago(2).with_sleep_hours(5.0), days_ago(1).with_sleep_hours(5.0)];
        let outcome = engine().adapt_at(&meals, &profile(), &samples, now());

        assert!((outcome.meals[2].protein - 46.0).abs() < 1e-9);
        assert!((outcome.meals[2].carbs - 47.5).abs() < 1e-9);
        assert!(outcome.meals.iter().all(|m| m.is_macro_consistent(1e-6)));
        assert_eq!(
            outcome.explanations[0],
            "Increased protein by 15% to support recovery from insufficient sleep (5.0 avg hrs/night)"
        );
    }

    #[test]
    fn test_duplicate_stress_tags_compound() {
        let meals = plan();
        let samples = vec![days_ago(2).with_heart_rate(60), days_ago(1).with_heart_rate(150)];
        let outcome = engine().adapt_at(&meals, &profile(), &samples, now());

        assert_eq!(outcome.explanations.len(), 2);
        let expected = meals[0].calories * 0.95 * 0.95;
        assert!((outcome.meals[0].calories - expected).abs() < 1e-9);
    }

    #[test]
    fn test_weight_loss_keeps_scaled_calories() {
        let meals = plan();
        let samples = vec![days_ago(5).with_weight(80.0), days_ago(1).with_weight(77.5)];
        let outcome = engine().adapt_at(&meals, &profile(), &samples, now());

        let adapted = &outcome.meals[0];
        assert!((adapted.calories - meals[0].calories * 1.05).abs() < 1e-9);
        assert!((adapted.protein - 22.0).abs() < 1e-9);
        assert!(!adapted.is_macro_consistent(0.5));
        assert_eq!(
            outcome.explanations,
            vec!["Increased portions by 5% due to weight loss of 2.5 kg".to_string()]
        );
    }

    #[test]
    fn test_weight_gain_trims_portions() {
        let meals = plan();
        let samples = vec![days_ago(5).with_weight(80.0), days_ago(1).with_weight(83.0)];
        let outcome = engine().adapt_at(&meals, &profile(), &samples, now());
        assert!((outcome.meals[0].calories - meals[0].calories * 0.9).abs() < 1e-9);
        assert_eq!(
            outcome.explanations,
            vec!["Reduced portions by 10% due to weight gain of 3.0 kg".to_string()]
        );
    }

    #[test]
    fn test_reserved_tags_are_no_ops() {
        let meals = plan();
        let report = TrendReport {
            trends: MetricTrends::default(),
            alerts: Vec::new(),
            adaptations_needed: vec![
                AdaptationReason::IllnessRecovery,
                AdaptationReason::ExerciseSession,
                AdaptationReason::MealTiming,
            ],
            analysis_window_days: 7,
            data_points: 0,
        };
        let outcome = AdaptationRuleEngine::apply(&meals, &report);
        assert_eq!(outcome.meals, meals);
        assert!(outcome.explanations.is_empty());
    }

    #[test]
    fn test_input_meals_are_not_mutated() {
        let meals = plan();
        let snapshot = meals.clone();
        let samples = vec![days_ago(1).with_glucose(200.0).with_steps(1000)];
        let outcome = engine().adapt_at(&meals, &profile(), &samples, now());
        assert_eq!(meals, snapshot);
        assert_ne!(outcome.meals, meals);
        assert_eq!(outcome.meals.len(), meals.len());
        assert_eq!(outcome.meals[0].items, meals[0].items);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: every adaptation except weight loss keeps calories equal to 4/4/9 macros
        #[test]
        fn prop_adaptations_keep_macro_consistency(
            protein in 0.0f64..80.0,
            carbs in 0.0f64..150.0,
            fat in 0.0f64..60.0,
            glucose in 60.0f64..250.0,
            steps in 0u32..15000,
            sleep in 3.0f64..10.0,
            hr in 50u32..130,
        ) {
            let meals = vec![meal("lunch", protein, carbs, fat)];
            let samples = vec![days_ago(1)
                .with_glucose(glucose)
                .with_steps(steps)
                .with_sleep_hours(sleep)
                .with_heart_rate(hr)];
            let outcome = engine().adapt_at(&meals, &profile(), &samples, now());
            for adapted in &outcome.meals {
                prop_assert!(adapted.is_macro_consistent(1e-6));
            }
        }

        /// Property: without biometric data adaptation changes nothing
        #[test]
        fn prop_no_data_is_identity(protein in 0.0f64..80.0, carbs in 0.0f64..150.0, fat in 0.0f64..60.0) {
            let meals = vec![meal("dinner", protein, carbs, fat)];
            let outcome = engine().adapt_at(&meals, &profile(), &[], now());
            prop_assert_eq!(outcome.meals, meals);
            prop_assert!(outcome.explanations.is_empty());
        }
    }
}
