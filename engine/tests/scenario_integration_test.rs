//! Integration tests for the reference scenarios across analyzer,
//! metabolism and adaptation

mod common;

use nutrition_engine::services::trends::GlucoseStatus;
use nutrition_engine::services::{AdaptationReason, AdaptationRuleEngine, MetabolismEngine, TrendAnalyzer};
use nutrition_engine_shared::health_metrics::BmrMethod;
use nutrition_engine_shared::models::Meal;

fn lunch() -> Meal {
    Meal {
        meal_type: "lunch".to_string(),
        items: vec!["Brown Rice".to_string(), "Chicken Breast".to_string()],
        calories: 0.0,
        protein: 35.0,
        carbs: 60.0,
        fat: 10.0,
    }
    .with_recomputed_calories()
}

#[test]
fn test_reference_profile_metabolism() {
    let profile = common::reference_profile();
    let tdee = MetabolismEngine::tdee(&profile, &[], true);

    assert_eq!(tdee.bmr, 1720.0);
    assert!((tdee.base_tdee - 2666.0).abs() < 1e-6);
    assert_eq!(tdee.adaptive_tdee, tdee.base_tdee);
    assert!(tdee.adaptive_factors.is_neutral());

    let mut older = profile.clone();
    older.age = 35;
    let bmr = MetabolismEngine::bmr(&older, BmrMethod::MifflinStJeor, None);
    assert_eq!(bmr, 1705.0);
    assert!((MetabolismEngine::tdee(&older, &[], true).base_tdee - 2642.75).abs() < 1e-6);
}

#[test]
fn test_glucose_scenario_alerts() {
    let engine = common::TestEngine::new();
    let samples = vec![
        engine.sample_days_ago(6).with_glucose(95.0),
        engine.sample_days_ago(1).with_glucose(165.0),
    ];

    let report = TrendAnalyzer::default().analyze_at(&samples, 7, engine.now);

    assert_eq!(report.adaptations_needed, vec![AdaptationReason::HighGlucose]);
    let glucose = report.trends.glucose_summary().expect("glucose was measured");
    assert_eq!(glucose.average, 130.0);
    assert_eq!(glucose.maximum, 165.0);
    assert_eq!(glucose.status, GlucoseStatus::High);
}

#[test]
fn test_adapt_without_samples_is_a_no_op() {
    let meals = vec![lunch()];
    let outcome = AdaptationRuleEngine::default().adapt(&meals, &common::reference_profile(), &[]);

    assert_eq!(outcome.meals, meals);
    assert!(outcome.explanations.is_empty());
}

#[test]
fn test_higher_glucose_peak_cuts_more_carbs() {
    let engine = common::TestEngine::new();
    let profile = common::reference_profile();
    let rules = AdaptationRuleEngine::default();
    let meals = vec![lunch()];

    let adapt_with_peak = |peak: f64| {
        let samples = vec![
            engine.sample_days_ago(2).with_glucose(110.0),
            engine.sample_days_ago(1).with_glucose(peak),
        ];
        rules.adapt_at(&meals, &profile, &samples, engine.now)
    };

    let moderate = adapt_with_peak(150.0);
    let severe = adapt_with_peak(170.0);

    assert!((moderate.meals[0].carbs - 48.0).abs() < 1e-9);
    assert!((severe.meals[0].carbs - 42.0).abs() < 1e-9);
    assert!(severe.meals[0].carbs < moderate.meals[0].carbs);
    assert!(moderate.meals[0].is_macro_consistent(1e-9));
    assert!(severe.meals[0].is_macro_consistent(1e-9));
}

#[test]
fn test_male_female_bmr_difference() {
    let male = common::reference_profile();
    let mut female = male.clone();
    female.sex = nutrition_engine_shared::health_metrics::BiologicalSex::Female;

    let diff = MetabolismEngine::bmr(&male, BmrMethod::MifflinStJeor, None)
        - MetabolismEngine::bmr(&female, BmrMethod::MifflinStJeor, None);
    assert!((diff - 166.0).abs() < 1e-9);
}
