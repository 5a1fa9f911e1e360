//! Nutrition Engine WASM Module
//!
//! This crate provides WebAssembly bindings for the pure metabolic and
//! statistical calculators so they can run in the browser.

use nutrition_engine_shared::health_metrics::{
    calculate_bmr as shared_bmr, calculate_bmi as shared_bmi, calculate_tdee as shared_tdee,
    estimate_body_fat_deurenberg, ActivityLevel, BiologicalSex, BmrMethod, HealthProfile,
};
use nutrition_engine_shared::statistics::{
    linear_slope, max_value, mean, min_value, population_std_dev, TrendDirection,
};
use wasm_bindgen::prelude::*;

fn profile(weight_kg: f64, height_cm: f64, age_years: u32, is_male: bool, activity: ActivityLevel) -> HealthProfile {
    HealthProfile {
        height_cm,
        weight_kg,
        age_years,
        sex: if is_male { BiologicalSex::Male } else { BiologicalSex::Female },
        activity_level: activity,
    }
}

/// Calculate BMR with a named formula
///
/// Unknown names fall back to Mifflin-St Jeor, as do the lean-mass formulas
/// when `body_fat_pct` is missing.
#[wasm_bindgen]
pub fn calculate_bmr(
    formula: &str,
    weight_kg: f64,
    height_cm: f64,
    age_years: u32,
    is_male: bool,
    body_fat_pct: Option<f64>,
) -> f64 {
    let method = BmrMethod::parse_or_default(formula);
    let p = profile(weight_kg, height_cm, age_years, is_male, ActivityLevel::default());
    shared_bmr(&p, method, body_fat_pct)
}

/// Calculate TDEE (Mifflin-St Jeor BMR × activity multiplier)
///
/// `activity_level` is a level name such as `moderately_active`; unknown
/// names use the moderately active multiplier.
#[wasm_bindgen]
pub fn calculate_tdee(
    weight_kg: f64,
    height_cm: f64,
    age_years: u32,
    is_male: bool,
    activity_level: &str,
) -> f64 {
    let activity = ActivityLevel::parse_or_default(activity_level);
    shared_tdee(&profile(weight_kg, height_cm, age_years, is_male, activity))
}

/// Calculate BMI from weight (kg) and height (cm)
#[wasm_bindgen]
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    shared_bmi(weight_kg, height_cm)
}

/// Deurenberg body-fat estimate (%)
#[wasm_bindgen]
pub fn estimate_body_fat(weight_kg: f64, height_cm: f64, age_years: u32, is_male: bool) -> f64 {
    let sex = if is_male { BiologicalSex::Male } else { BiologicalSex::Female };
    estimate_body_fat_deurenberg(shared_bmi(weight_kg, height_cm), age_years, sex)
}

/// `increasing`, `decreasing` or `stable`
#[wasm_bindgen]
pub fn trend_direction(values: &[f64]) -> String {
    TrendDirection::of(values).as_str().to_string()
}

/// Summary statistics of a series as a JSON string
#[wasm_bindgen]
pub fn summarize_series(values: &[f64]) -> String {
    serde_json::json!({
        "count": values.len(),
        "mean": mean(values),
        "min": min_value(values),
        "max": max_value(values),
        "std_dev": population_std_dev(values),
        "slope": linear_slope(values),
        "trend": TrendDirection::of(values).as_str(),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmr_by_formula_name() {
        assert_eq!(calculate_bmr("mifflin_st_jeor", 75.0, 180.0, 32, true, None), 1720.0);
        assert_eq!(calculate_bmr("no_such_formula", 75.0, 180.0, 32, true, None), 1720.0);

        let katch = calculate_bmr("katch_mcardle", 80.0, 180.0, 30, true, Some(20.0));
        assert!((katch - (370.0 + 21.6 * 64.0)).abs() < 1e-9);
    }

    #[test]
    fn test_tdee_by_activity_name() {
        let tdee = calculate_tdee(75.0, 180.0, 32, true, "moderately_active");
        assert!((tdee - 2666.0).abs() < 1e-6);
        assert_eq!(calculate_tdee(75.0, 180.0, 32, true, "couch"), tdee);
    }

    #[test]
    fn test_bmi() {
        let bmi = calculate_bmi(70.0, 175.0);
        assert!((bmi - 22.86).abs() < 0.1);
        assert_eq!(calculate_bmi(70.0, 0.0), 0.0);
    }

    #[test]
    fn test_body_fat_estimate() {
        let male = estimate_body_fat(75.0, 180.0, 32, true);
        let female = estimate_body_fat(75.0, 180.0, 32, false);
        assert!((female - male - 10.8).abs() < 1e-9);
    }

    #[test]
    fn test_trend_direction() {
        assert_eq!(trend_direction(&[90.0, 100.0, 110.0]), "increasing");
        assert_eq!(trend_direction(&[8.0, 7.0, 6.0]), "decreasing");
        assert_eq!(trend_direction(&[5.0]), "stable");
    }

    #[test]
    fn test_summarize_series() {
        let summary: serde_json::Value = serde_json::from_str(&summarize_series(&[95.0, 165.0])).unwrap();
        assert_eq!(summary["count"], 2);
        assert_eq!(summary["mean"], 130.0);
        assert_eq!(summary["trend"], "increasing");

        let empty: serde_json::Value = serde_json::from_str(&summarize_series(&[])).unwrap();
        assert!(empty["mean"].is_null());
    }
}
