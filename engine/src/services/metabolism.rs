//! Metabolism service - BMR/TDEE with biometric adaptive factors, goal-based
//! calorie targets and metabolic insights

use nutrition_engine_shared::health_metrics::{
    calculate_bmr, estimate_body_fat_deurenberg, BmrMethod, KCAL_PER_KG_BODY_MASS,
};
use nutrition_engine_shared::models::{BiometricSample, UserProfile};
use nutrition_engine_shared::statistics::{mean, population_std_dev};
use nutrition_engine_shared::types::{
    AdaptiveFactors, CalorieGoal, CalorieRequirements, HealthIndicators, MetabolicInsights,
    MetabolicRate, TdeeBreakdown,
};
use tracing::debug;

/// Absolute floor for any calorie target
const MIN_DAILY_CALORIES: f64 = 1200.0;
/// Targets never drop below this multiple of BMR
const MIN_BMR_MULTIPLE: f64 = 1.1;
/// Targets never exceed this multiple of the base calories
const MAX_BASE_MULTIPLE: f64 = 1.5;

const SLEEP_WINDOW: usize = 7;
const GLUCOSE_WINDOW: usize = 5;
const ACTIVITY_WINDOW: usize = 7;
const STRESS_WINDOW: usize = 5;
const RECOVERY_WINDOW: usize = 3;
/// Minimum readings before activity or stress factors are judged
const MIN_FACTOR_READINGS: usize = 3;

/// Metabolism service
pub struct MetabolismEngine;

impl MetabolismEngine {
    /// BMR with the given formula; lean-mass formulas fall back to
    /// Mifflin-St Jeor without a body-fat value
    pub fn bmr(profile: &UserProfile, formula: BmrMethod, body_fat_pct: Option<f64>) -> f64 {
        calculate_bmr(&profile.health_profile(), formula, body_fat_pct)
    }

    /// BMR for a formula given by name; unknown names use Mifflin-St Jeor
    pub fn bmr_by_name(profile: &UserProfile, formula: &str, body_fat_pct: Option<f64>) -> f64 {
        Self::bmr(profile, BmrMethod::parse_or_default(formula), body_fat_pct)
    }

    /// Most recent measured body fat, otherwise the Deurenberg estimate
    pub fn estimate_body_fat(profile: &UserProfile, samples: &[BiometricSample]) -> f64 {
        samples
            .iter()
            .filter(|s| s.body_fat_pct.is_some())
            .max_by_key(|s| s.timestamp)
            .and_then(|s| s.body_fat_pct)
            .unwrap_or_else(|| estimate_body_fat_deurenberg(profile.bmi(), profile.age, profile.sex))
    }

    /// TDEE breakdown using Mifflin-St Jeor
    pub fn tdee(profile: &UserProfile, samples: &[BiometricSample], adaptive: bool) -> TdeeBreakdown {
        Self::tdee_with_formula(profile, samples, adaptive, BmrMethod::default())
    }

    /// TDEE breakdown with an explicit BMR formula
    ///
    /// `adaptive_tdee == base_tdee` when `adaptive` is off or there are no samples.
    pub fn tdee_with_formula(
        profile: &UserProfile,
        samples: &[BiometricSample],
        adaptive: bool,
        formula: BmrMethod,
    ) -> TdeeBreakdown {
        let body_fat_pct = Self::estimate_body_fat(profile, samples);
        let bmr = Self::bmr(profile, formula, Some(body_fat_pct));
        let base_tdee = bmr * profile.activity_level.multiplier();

        let adaptive_factors = if adaptive {
            Self::adaptive_factors(samples)
        } else {
            AdaptiveFactors::default()
        };
        let adaptive_multiplier = adaptive_factors.product();

        debug!(bmr, base_tdee, adaptive_multiplier, "TDEE calculated");

        TdeeBreakdown {
            bmr,
            base_tdee,
            adaptive_tdee: base_tdee * adaptive_multiplier,
            adaptive_factors,
            adaptive_multiplier,
            body_fat_pct,
        }
    }

    /// The five adaptive factors from the most recent samples
    pub fn adaptive_factors(samples: &[BiometricSample]) -> AdaptiveFactors {
        if samples.is_empty() {
            return AdaptiveFactors::default();
        }

        let mut newest_first: Vec<&BiometricSample> = samples.iter().collect();
        newest_first.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let factors = AdaptiveFactors {
            sleep_quality: sleep_factor(&newest_first),
            glucose_regulation: glucose_factor(&newest_first),
            activity_consistency: activity_factor(&newest_first),
            stress_level: stress_factor(&newest_first),
            recovery_status: recovery_factor(&newest_first),
        };
        debug!(?factors, "Adaptive factors");
        factors
    }

    /// Goal-based targets from the non-adaptive TDEE
    pub fn calorie_needs_by_goal(
        profile: &UserProfile,
        goal: CalorieGoal,
        rate_kg_per_week: f64,
    ) -> CalorieRequirements {
        let tdee = Self::tdee(profile, &[], false);
        Self::calorie_requirements(tdee.bmr, tdee.base_tdee, goal, rate_kg_per_week)
    }

    /// Goal-based targets around `base_calories`, clamped to
    /// `[max(1.1 × BMR, 1200), max(1.5 × base, min)]`
    pub fn calorie_requirements(
        bmr: f64,
        base_calories: f64,
        goal: CalorieGoal,
        rate_kg_per_week: f64,
    ) -> CalorieRequirements {
        let delta = (rate_kg_per_week * KCAL_PER_KG_BODY_MASS / 7.0).abs();

        let min_safe_calories = (bmr * MIN_BMR_MULTIPLE).max(MIN_DAILY_CALORIES);
        let max_safe_calories = (base_calories * MAX_BASE_MULTIPLE).max(min_safe_calories);
        let clamp = |calories: f64| calories.clamp(min_safe_calories, max_safe_calories);

        let mut requirements = CalorieRequirements {
            goal,
            target: 0.0,
            maintenance: clamp(base_calories),
            weight_loss: clamp(base_calories - delta),
            weight_gain: clamp(base_calories + delta),
            min_safe_calories,
            max_safe_calories,
            rate_kg_per_week,
        };
        requirements.target = requirements.for_goal(goal);
        requirements
    }

    /// Which factors are currently moving the calorie target, and why
    pub fn metabolic_insights(profile: &UserProfile, samples: &[BiometricSample]) -> MetabolicInsights {
        let tdee = Self::tdee(profile, samples, true);
        Self::insights_from_factors(&tdee.adaptive_factors)
    }

    pub fn insights_from_factors(factors: &AdaptiveFactors) -> MetabolicInsights {
        let mut recommendations = Vec::new();
        let mut adaptations_active = Vec::new();

        let checks = [
            (
                factors.sleep_quality < 0.95,
                "Improve sleep quality and duration",
                "Sleep-adjusted metabolism",
            ),
            (
                factors.glucose_regulation < 0.95,
                "Focus on blood sugar stability",
                "Glucose-regulated adjustments",
            ),
            (
                factors.activity_consistency < 0.98,
                "Maintain consistent daily activity",
                "Activity-based adjustments",
            ),
            (
                factors.stress_level < 0.98,
                "Implement stress management techniques",
                "Stress-response adjustments",
            ),
        ];
        for (triggered, recommendation, adaptation) in checks {
            if triggered {
                recommendations.push(recommendation.to_string());
                adaptations_active.push(adaptation.to_string());
            }
        }

        let multiplier = factors.product();
        let metabolic_rate = if multiplier > 1.05 {
            MetabolicRate::High
        } else if multiplier < 0.95 {
            MetabolicRate::Low
        } else {
            MetabolicRate::Normal
        };

        let named = factors.named();
        let suppressing = named
            .iter()
            .filter(|(_, v)| *v < 1.0)
            .map(|(name, _)| name.to_string())
            .collect();
        let boosting = named
            .iter()
            .filter(|(_, v)| *v > 1.0)
            .map(|(name, _)| name.to_string())
            .collect();

        MetabolicInsights {
            metabolic_rate,
            recommendations,
            adaptations_active,
            health_indicators: HealthIndicators::from_factors(factors),
            suppressing,
            boosting,
        }
    }
}

// ============================================================================
// Factor calculations (samples are newest first)
// ============================================================================

fn recent_values<F>(samples: &[&BiometricSample], window: usize, field: F) -> Vec<f64>
where
    F: Fn(&BiometricSample) -> Option<f64>,
{
    samples.iter().take(window).filter_map(|s| field(*s)).collect()
}

fn sleep_factor(samples: &[&BiometricSample]) -> f64 {
    let hours = recent_values(samples, SLEEP_WINDOW, |s| s.sleep_hours);
    let Some(avg) = mean(&hours) else {
        return 1.0;
    };

    if (7.0..=9.0).contains(&avg) {
        1.0
    } else if avg < 6.0 {
        0.95 - (6.0 - avg) * 0.02
    } else if avg > 10.0 {
        0.98
    } else {
        1.0
    }
}

fn glucose_factor(samples: &[&BiometricSample]) -> f64 {
    let readings = recent_values(samples, GLUCOSE_WINDOW, |s| s.glucose_mg_dl);
    let Some(avg) = mean(&readings) else {
        return 1.0;
    };

    if avg > 140.0 {
        0.92
    } else if avg > 120.0 {
        0.96
    } else if (70.0..=100.0).contains(&avg) {
        1.02
    } else {
        1.0
    }
}

fn activity_factor(samples: &[&BiometricSample]) -> f64 {
    let steps = recent_values(samples, ACTIVITY_WINDOW, |s| s.steps.map(f64::from));
    if steps.len() < MIN_FACTOR_READINGS {
        return 1.0;
    }
    let (Some(avg), Some(std_dev)) = (mean(&steps), population_std_dev(&steps)) else {
        return 1.0;
    };

    let variability = if avg > 0.0 { std_dev / avg } else { 0.0 };

    if avg > 10000.0 && variability < 0.3 {
        1.05
    } else if avg > 8000.0 && variability < 0.4 {
        1.02
    } else if avg < 3000.0 {
        0.95
    } else {
        1.0
    }
}

fn stress_factor(samples: &[&BiometricSample]) -> f64 {
    let readings = recent_values(samples, STRESS_WINDOW, |s| s.heart_rate.map(f64::from));
    if readings.len() < MIN_FACTOR_READINGS {
        return 1.0;
    }
    let (Some(avg), Some(std_dev)) = (mean(&readings), population_std_dev(&readings)) else {
        return 1.0;
    };

    if avg > 80.0 || std_dev > 15.0 {
        0.96
    } else if (60.0..=70.0).contains(&avg) && std_dev < 10.0 {
        1.02
    } else {
        1.0
    }
}

/// Per sample: share of the measured indicators (sleep 7-9 h, heart rate
/// 60-75 bpm, steps >= 5000) that are in range
fn recovery_factor(samples: &[&BiometricSample]) -> f64 {
    let scores: Vec<f64> = samples
        .iter()
        .take(RECOVERY_WINDOW)
        .filter_map(|s| {
            let indicators = [
                s.sleep_hours.map(|h| (7.0..=9.0).contains(&h)),
                s.heart_rate.map(|hr| (60..=75).contains(&hr)),
                s.steps.map(|steps| steps >= 5000),
            ];
            let measured: Vec<bool> = indicators.into_iter().flatten().collect();
            if measured.is_empty() {
                return None;
            }
            let hits = measured.iter().filter(|in_range| **in_range).count();
            Some(hits as f64 / measured.len() as f64)
        })
        .collect();

    let Some(avg) = mean(&scores) else {
        return 1.0;
    };

    if avg > 0.8 {
        1.03
    } else if avg > 0.6 {
        1.01
    } else if avg < 0.3 {
        0.94
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use nutrition_engine_shared::health_metrics::{ActivityLevel, BiologicalSex};
    use proptest::prelude::*;
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> BiometricSample {
        BiometricSample::at(now() - Duration::days(days))
    }

    fn profile(age: u32) -> UserProfile {
        UserProfile::new(age, BiologicalSex::Male, 75.0, 180.0, ActivityLevel::ModeratelyActive)
    }

    // ========================================================================
    // BMR / TDEE
    // ========================================================================

    #[test]
    fn test_reference_profile_without_biometrics() {
        let tdee = MetabolismEngine::tdee(&profile(35), &[], true);
        assert!((tdee.bmr - 1705.0).abs() < 1e-9);
        assert!((tdee.base_tdee - 2642.75).abs() < 1e-9);
        assert_eq!(tdee.adaptive_tdee, tdee.base_tdee);
        assert!(tdee.adaptive_factors.is_neutral());

        let tdee = MetabolismEngine::tdee(&profile(32), &[], true);
        assert!((tdee.bmr - 1720.0).abs() < 1e-9);
        assert!((tdee.base_tdee - 2666.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_formula_name_falls_back() {
        let p = profile(32);
        assert_eq!(
            MetabolismEngine::bmr_by_name(&p, "pseudo-science", None),
            MetabolismEngine::bmr(&p, BmrMethod::MifflinStJeor, None)
        );
        let katch = MetabolismEngine::bmr_by_name(&p, "katch-mcardle", Some(20.0));
        assert!((katch - (370.0 + 21.6 * 60.0)).abs() < 1e-9);
    }

    #[test]
    fn test_body_fat_prefers_latest_measurement() {
        let p = profile(32);
        let samples = vec![
            days_ago(5).with_body_fat(22.0),
            days_ago(1).with_body_fat(18.0),
            days_ago(0).with_steps(4000),
        ];
        assert_eq!(MetabolismEngine::estimate_body_fat(&p, &samples), 18.0);

        let estimated = MetabolismEngine::estimate_body_fat(&p, &[]);
        let bmi = 75.0 / (1.8 * 1.8);
        assert!((estimated - (1.2 * bmi + 0.23 * 32.0 - 16.2)).abs() < 1e-9);
    }

    #[test]
    fn test_tdee_with_lean_mass_formula_uses_body_fat() {
        let samples = vec![days_ago(1).with_body_fat(20.0)];
        let tdee = MetabolismEngine::tdee_with_formula(&profile(32), &samples, false, BmrMethod::Cunningham);
        assert!((tdee.bmr - (500.0 + 22.0 * 60.0)).abs() < 1e-9);
    }

    // ========================================================================
    // Adaptive factors
    // ========================================================================

    #[rstest]
    #[case(8.0, 1.0)]
    #[case(5.0, 0.93)]
    #[case(6.5, 1.0)]
    #[case(11.0, 0.98)]
    fn test_sleep_factor(#[case] hours: f64, #[case] expected: f64) {
        let samples = vec![days_ago(1).with_sleep_hours(hours)];
        let factors = MetabolismEngine::adaptive_factors(&samples);
        assert!((factors.sleep_quality - expected).abs() < 1e-9);
    }

    #[rstest]
    #[case(150.0, 0.92)]
    #[case(130.0, 0.96)]
    #[case(90.0, 1.02)]
    #[case(110.0, 1.0)]
    fn test_glucose_factor(#[case] glucose: f64, #[case] expected: f64) {
        let samples = vec![days_ago(1).with_glucose(glucose)];
        assert_eq!(MetabolismEngine::adaptive_factors(&samples).glucose_regulation, expected);
    }

    #[test]
    fn test_glucose_factor_uses_most_recent_readings() {
        // Five recent normal readings outweigh an old spike
        let mut samples: Vec<BiometricSample> =
            (1..=5).map(|d| days_ago(d).with_glucose(90.0)).collect();
        samples.push(days_ago(6).with_glucose(300.0));
        assert_eq!(MetabolismEngine::adaptive_factors(&samples).glucose_regulation, 1.02);
    }

    #[test]
    fn test_activity_factor_needs_three_readings() {
        let two = vec![days_ago(2).with_steps(12000), days_ago(1).with_steps(12000)];
        assert_eq!(MetabolismEngine::adaptive_factors(&two).activity_consistency, 1.0);

        let three: Vec<BiometricSample> = (1..=3).map(|d| days_ago(d).with_steps(12000)).collect();
        assert_eq!(MetabolismEngine::adaptive_factors(&three).activity_consistency, 1.05);

        let sedentary: Vec<BiometricSample> = (1..=3).map(|d| days_ago(d).with_steps(2000)).collect();
        assert_eq!(MetabolismEngine::adaptive_factors(&sedentary).activity_consistency, 0.95);
    }

    #[test]
    fn test_stress_factor() {
        let stressed: Vec<BiometricSample> = (1..=3).map(|d| days_ago(d).with_heart_rate(85)).collect();
        assert_eq!(MetabolismEngine::adaptive_factors(&stressed).stress_level, 0.96);

        let calm: Vec<BiometricSample> = (1..=3).map(|d| days_ago(d).with_heart_rate(65)).collect();
        assert_eq!(MetabolismEngine::adaptive_factors(&calm).stress_level, 1.02);
    }

    #[test]
    fn test_recovery_factor() {
        let recovered: Vec<BiometricSample> = (1..=3)
            .map(|d| days_ago(d).with_sleep_hours(8.0).with_heart_rate(65).with_steps(7000))
            .collect();
        assert_eq!(MetabolismEngine::adaptive_factors(&recovered).recovery_status, 1.03);

        let depleted: Vec<BiometricSample> = (1..=3)
            .map(|d| days_ago(d).with_sleep_hours(4.0).with_heart_rate(95).with_steps(1000))
            .collect();
        assert_eq!(MetabolismEngine::adaptive_factors(&depleted).recovery_status, 0.94);
    }

    #[test]
    fn test_adaptive_tdee_applies_product() {
        let samples: Vec<BiometricSample> = (1..=3).map(|d| days_ago(d).with_glucose(150.0)).collect();
        let tdee = MetabolismEngine::tdee(&profile(32), &samples, true);
        assert!((tdee.adaptive_tdee - tdee.base_tdee * 0.92).abs() < 1e-9);

        let static_tdee = MetabolismEngine::tdee(&profile(32), &samples, false);
        assert_eq!(static_tdee.adaptive_tdee, static_tdee.base_tdee);
    }

    // ========================================================================
    // Goals and insights
    // ========================================================================

    #[test]
    fn test_calorie_needs_by_goal() {
        let needs = MetabolismEngine::calorie_needs_by_goal(&profile(32), CalorieGoal::Lose, 0.5);
        assert!((needs.maintenance - 2666.0).abs() < 1e-9);
        assert!((needs.weight_loss - 2116.0).abs() < 1e-9);
        assert!((needs.weight_gain - 3216.0).abs() < 1e-9);
        assert_eq!(needs.target, needs.weight_loss);
        assert!((needs.min_safe_calories - 1892.0).abs() < 1e-9);
    }

    #[test]
    fn test_insights_list_suppressing_and_boosting() {
        let samples: Vec<BiometricSample> = (1..=3)
            .map(|d| days_ago(d).with_glucose(150.0).with_sleep_hours(4.0).with_heart_rate(90))
            .collect();
        let insights = MetabolismEngine::metabolic_insights(&profile(32), &samples);

        assert_eq!(insights.metabolic_rate, MetabolicRate::Low);
        assert!(insights.suppressing.contains(&"glucose_regulation".to_string()));
        assert!(insights.suppressing.contains(&"sleep_quality".to_string()));
        assert!(insights.boosting.is_empty());
        assert!(insights
            .recommendations
            .contains(&"Focus on blood sugar stability".to_string()));
        assert!(insights
            .adaptations_active
            .contains(&"Stress-response adjustments".to_string()));
    }

    #[test]
    fn test_insights_without_data_are_normal() {
        let insights = MetabolismEngine::metabolic_insights(&profile(32), &[]);
        assert_eq!(insights.metabolic_rate, MetabolicRate::Normal);
        assert!(insights.recommendations.is_empty());
        assert_eq!(insights.health_indicators.metabolic_flexibility, 1.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: goal targets stay ordered and inside the safety bounds
        #[test]
        fn prop_goal_bounds(
            weight in 60.0f64..120.0,
            height in 160.0f64..200.0,
            age in 20u32..60,
            male in any::<bool>(),
            rate in 0.1f64..1.0,
        ) {
            let sex = if male { BiologicalSex::Male } else { BiologicalSex::Female };
            let p = UserProfile::new(age, sex, weight, height, ActivityLevel::Sedentary);
            let needs = MetabolismEngine::calorie_needs_by_goal(&p, CalorieGoal::Maintain, rate);

            prop_assert!(needs.min_safe_calories <= needs.maintenance);
            prop_assert!(needs.maintenance <= needs.max_safe_calories);
            prop_assert!(needs.weight_loss < needs.maintenance);
            prop_assert!(needs.maintenance < needs.weight_gain);
        }

        /// Property: every adaptive factor stays in a narrow band
        #[test]
        fn prop_factors_bounded(
            glucose in 40.0f64..300.0,
            steps in 0u32..30000,
            sleep in 3.0f64..12.0,
            hr in 40u32..140,
        ) {
            let samples: Vec<BiometricSample> = (1..=4)
                .map(|d| days_ago(d).with_glucose(glucose).with_steps(steps).with_sleep_hours(sleep).with_heart_rate(hr))
                .collect();
            let factors = MetabolismEngine::adaptive_factors(&samples);
            for (_, value) in factors.named() {
                prop_assert!((0.85..=1.05).contains(&value));
            }
        }
    }
}
