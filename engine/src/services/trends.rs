//! Biometric trend analysis - turns raw samples into per-metric summaries,
//! alerts and adaptation triggers

use crate::config::ThresholdConfig;
use chrono::{DateTime, Duration, Utc};
use nutrition_engine_shared::models::BiometricSample;
use nutrition_engine_shared::statistics::{
    max_value, mean, min_value, population_std_dev, TrendDirection,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Target nightly sleep used for the sleep debt figure
const SLEEP_TARGET_HOURS: f64 = 7.5;
/// Cumulative sleep debt above which an informational alert is raised
const SLEEP_DEBT_ALERT_HOURS: f64 = 5.0;
/// Step consistency below which an informational alert is raised
const MIN_ACTIVITY_CONSISTENCY: f64 = 0.5;

/// Why a meal plan needs adjusting
///
/// The last three variants are reserved; the analyzer never produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationReason {
    HighGlucose,
    LowActivity,
    PoorSleep,
    HighStress,
    WeightChange,
    IllnessRecovery,
    ExerciseSession,
    MealTiming,
}

impl AdaptationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdaptationReason::HighGlucose => "high_glucose",
            AdaptationReason::LowActivity => "low_activity",
            AdaptationReason::PoorSleep => "poor_sleep",
            AdaptationReason::HighStress => "high_stress",
            AdaptationReason::WeightChange => "weight_change",
            AdaptationReason::IllnessRecovery => "illness_recovery",
            AdaptationReason::ExerciseSession => "exercise_session",
            AdaptationReason::MealTiming => "meal_timing",
        }
    }
}

// ============================================================================
// Status classifications
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlucoseStatus {
    Low,
    Normal,
    Elevated,
    High,
}

impl GlucoseStatus {
    pub fn classify(avg_mg_dl: f64) -> Self {
        if avg_mg_dl < 70.0 {
            GlucoseStatus::Low
        } else if avg_mg_dl <= 100.0 {
            GlucoseStatus::Normal
        } else if avg_mg_dl <= 125.0 {
            GlucoseStatus::Elevated
        } else {
            GlucoseStatus::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Sedentary,
    Low,
    Moderate,
    High,
}

impl ActivityStatus {
    pub fn classify(avg_steps: f64) -> Self {
        if avg_steps < 3000.0 {
            ActivityStatus::Sedentary
        } else if avg_steps <= 7000.0 {
            ActivityStatus::Low
        } else if avg_steps <= 12000.0 {
            ActivityStatus::Moderate
        } else {
            ActivityStatus::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepStatus {
    Insufficient,
    Borderline,
    Adequate,
    Excessive,
}

impl SleepStatus {
    pub fn classify(avg_hours: f64) -> Self {
        if avg_hours < 6.0 {
            SleepStatus::Insufficient
        } else if avg_hours <= 7.0 {
            SleepStatus::Borderline
        } else if avg_hours <= 9.0 {
            SleepStatus::Adequate
        } else {
            SleepStatus::Excessive
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartRateStatus {
    Low,
    Normal,
    Elevated,
    High,
}

impl HeartRateStatus {
    pub fn classify(avg_bpm: f64) -> Self {
        if avg_bpm < 60.0 {
            HeartRateStatus::Low
        } else if avg_bpm <= 80.0 {
            HeartRateStatus::Normal
        } else if avg_bpm <= 100.0 {
            HeartRateStatus::Elevated
        } else {
            HeartRateStatus::High
        }
    }
}

// ============================================================================
// Trend records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseSummary {
    pub average: f64,
    pub maximum: f64,
    pub trend: TrendDirection,
    pub status: GlucoseStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub average_steps: f64,
    pub minimum_steps: f64,
    /// 1 - stdev / max(avg, 1)
    pub consistency_score: f64,
    pub trend: TrendDirection,
    pub status: ActivityStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSummary {
    pub average_hours: f64,
    pub minimum_hours: f64,
    pub sleep_debt: f64,
    pub trend: TrendDirection,
    pub status: SleepStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSummary {
    pub average_bpm: f64,
    pub variability: f64,
    pub trend: TrendDirection,
    pub status: HeartRateStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSummary {
    /// Last minus first reading in time order
    pub total_change_kg: f64,
    pub trend: TrendDirection,
    pub rate_per_day: f64,
}

/// Outcome of one metric's analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "summary", rename_all = "snake_case")]
pub enum TrendData<S> {
    NoData,
    InsufficientData,
    Measured(S),
}

impl<S> TrendData<S> {
    pub fn summary(&self) -> Option<&S> {
        match self {
            TrendData::Measured(summary) => Some(summary),
            TrendData::NoData | TrendData::InsufficientData => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTrend<S> {
    pub data: TrendData<S>,
    pub alerts: Vec<String>,
    pub adaptations: Vec<AdaptationReason>,
}

impl<S> MetricTrend<S> {
    fn empty(data: TrendData<S>) -> Self {
        Self {
            data,
            alerts: Vec::new(),
            adaptations: Vec::new(),
        }
    }
}

/// Per-metric trends; every field is `None` when the window held no samples
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricTrends {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glucose: Option<MetricTrend<GlucoseSummary>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<MetricTrend<ActivitySummary>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep: Option<MetricTrend<SleepSummary>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<MetricTrend<HeartRateSummary>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<MetricTrend<WeightSummary>>,
}

impl MetricTrends {
    pub fn is_empty(&self) -> bool {
        self.glucose.is_none()
            && self.activity.is_none()
            && self.sleep.is_none()
            && self.heart_rate.is_none()
            && self.weight.is_none()
    }

    pub fn glucose_summary(&self) -> Option<&GlucoseSummary> {
        self.glucose.as_ref().and_then(|t| t.data.summary())
    }

    pub fn activity_summary(&self) -> Option<&ActivitySummary> {
        self.activity.as_ref().and_then(|t| t.data.summary())
    }

    pub fn sleep_summary(&self) -> Option<&SleepSummary> {
        self.sleep.as_ref().and_then(|t| t.data.summary())
    }

    pub fn heart_rate_summary(&self) -> Option<&HeartRateSummary> {
        self.heart_rate.as_ref().and_then(|t| t.data.summary())
    }

    pub fn weight_summary(&self) -> Option<&WeightSummary> {
        self.weight.as_ref().and_then(|t| t.data.summary())
    }
}

/// Result of a trend analysis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub trends: MetricTrends,
    pub alerts: Vec<String>,
    /// In emission order: glucose, activity, sleep, heart rate, weight
    pub adaptations_needed: Vec<AdaptationReason>,
    pub analysis_window_days: u32,
    pub data_points: usize,
}

impl TrendReport {
    fn empty(window_days: u32) -> Self {
        Self {
            trends: MetricTrends::default(),
            alerts: Vec::new(),
            adaptations_needed: Vec::new(),
            analysis_window_days: window_days,
            data_points: 0,
        }
    }

    fn absorb<S>(&mut self, trend: &MetricTrend<S>) {
        self.alerts.extend(trend.alerts.iter().cloned());
        self.adaptations_needed.extend(trend.adaptations.iter().copied());
    }
}

// ============================================================================
// Analyzer
// ============================================================================

/// Statistical summarization of a biometric time series
#[derive(Debug, Clone, Default)]
pub struct TrendAnalyzer {
    thresholds: ThresholdConfig,
}

impl TrendAnalyzer {
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self { thresholds }
    }

    /// Analyze samples from the last `window_days` days
    pub fn analyze(&self, samples: &[BiometricSample], window_days: u32) -> TrendReport {
        self.analyze_at(samples, window_days, Utc::now())
    }

    /// Analyze samples with an explicit reference time
    pub fn analyze_at(
        &self,
        samples: &[BiometricSample],
        window_days: u32,
        now: DateTime<Utc>,
    ) -> TrendReport {
        let mut sorted: Vec<&BiometricSample> = samples.iter().collect();
        sorted.sort_by_key(|s| s.timestamp);

        let cutoff = now - Duration::days(i64::from(window_days));
        let recent: Vec<&BiometricSample> =
            sorted.into_iter().filter(|s| s.timestamp >= cutoff).collect();

        if recent.is_empty() {
            debug!(window_days, "No biometric samples in analysis window");
            return TrendReport::empty(window_days);
        }

        let mut report = TrendReport::empty(window_days);
        report.data_points = recent.len();

        let glucose = self.analyze_glucose(&recent);
        report.absorb(&glucose);
        let activity = self.analyze_activity(&recent);
        report.absorb(&activity);
        let sleep = self.analyze_sleep(&recent);
        report.absorb(&sleep);
        let heart_rate = self.analyze_heart_rate(&recent);
        report.absorb(&heart_rate);
        let weight = self.analyze_weight(&recent);
        report.absorb(&weight);

        report.trends = MetricTrends {
            glucose: Some(glucose),
            activity: Some(activity),
            sleep: Some(sleep),
            heart_rate: Some(heart_rate),
            weight: Some(weight),
        };

        info!(
            data_points = report.data_points,
            alerts = report.alerts.len(),
            adaptations = report.adaptations_needed.len(),
            "Biometric trend analysis complete"
        );

        report
    }

    fn analyze_glucose(&self, data: &[&BiometricSample]) -> MetricTrend<GlucoseSummary> {
        let values: Vec<f64> = data.iter().filter_map(|s| s.glucose_mg_dl).collect();
        let (Some(average), Some(maximum)) = (mean(&values), max_value(&values)) else {
            return MetricTrend::empty(TrendData::NoData);
        };

        let mut trend = MetricTrend::empty(TrendData::Measured(GlucoseSummary {
            average,
            maximum,
            trend: TrendDirection::of(&values),
            status: GlucoseStatus::classify(average),
        }));

        if maximum > self.thresholds.high_glucose_mg_dl {
            trend
                .alerts
                .push(format!("High glucose reading detected: {:.1} mg/dL", maximum));
            trend.adaptations.push(AdaptationReason::HighGlucose);
        }
        if average < self.thresholds.low_glucose_mg_dl {
            trend
                .alerts
                .push(format!("Low average glucose: {:.1} mg/dL", average));
        }

        debug!(average, maximum, "Glucose trend");
        trend
    }

    fn analyze_activity(&self, data: &[&BiometricSample]) -> MetricTrend<ActivitySummary> {
        let values: Vec<f64> = data.iter().filter_map(|s| s.steps).map(f64::from).collect();
        let (Some(average), Some(minimum), Some(std_dev)) =
            (mean(&values), min_value(&values), population_std_dev(&values))
        else {
            return MetricTrend::empty(TrendData::NoData);
        };

        let consistency = 1.0 - std_dev / average.max(1.0);

        let mut trend = MetricTrend::empty(TrendData::Measured(ActivitySummary {
            average_steps: average,
            minimum_steps: minimum,
            consistency_score: consistency,
            trend: TrendDirection::of(&values),
            status: ActivityStatus::classify(average),
        }));

        if average < self.thresholds.low_activity_steps {
            trend
                .alerts
                .push(format!("Low activity detected: {:.0} avg steps/day", average));
            trend.adaptations.push(AdaptationReason::LowActivity);
        }
        if consistency < MIN_ACTIVITY_CONSISTENCY {
            trend
                .alerts
                .push("Inconsistent activity patterns detected".to_string());
        }

        debug!(average, consistency, "Activity trend");
        trend
    }

    fn analyze_sleep(&self, data: &[&BiometricSample]) -> MetricTrend<SleepSummary> {
        let values: Vec<f64> = data.iter().filter_map(|s| s.sleep_hours).collect();
        let (Some(average), Some(minimum)) = (mean(&values), min_value(&values)) else {
            return MetricTrend::empty(TrendData::NoData);
        };

        let sleep_debt = (SLEEP_TARGET_HOURS - average).max(0.0) * values.len() as f64;

        let mut trend = MetricTrend::empty(TrendData::Measured(SleepSummary {
            average_hours: average,
            minimum_hours: minimum,
            sleep_debt,
            trend: TrendDirection::of(&values),
            status: SleepStatus::classify(average),
        }));

        if average < self.thresholds.poor_sleep_hours {
            trend
                .alerts
                .push(format!("Insufficient sleep: {:.1} avg hours/night", average));
            trend.adaptations.push(AdaptationReason::PoorSleep);
        }
        if sleep_debt > SLEEP_DEBT_ALERT_HOURS {
            trend
                .alerts
                .push(format!("Significant sleep debt: {:.1} hours", sleep_debt));
        }

        debug!(average, sleep_debt, "Sleep trend");
        trend
    }

    /// Average and variability each add their own `HighStress` tag
    fn analyze_heart_rate(&self, data: &[&BiometricSample]) -> MetricTrend<HeartRateSummary> {
        let values: Vec<f64> = data
            .iter()
            .filter_map(|s| s.heart_rate)
            .map(f64::from)
            .collect();
        let (Some(average), Some(variability)) = (mean(&values), population_std_dev(&values)) else {
            return MetricTrend::empty(TrendData::NoData);
        };

        let mut trend = MetricTrend::empty(TrendData::Measured(HeartRateSummary {
            average_bpm: average,
            variability,
            trend: TrendDirection::of(&values),
            status: HeartRateStatus::classify(average),
        }));

        if average > self.thresholds.high_heart_rate_bpm {
            trend
                .alerts
                .push(format!("Elevated heart rate: {:.1} avg bpm", average));
            trend.adaptations.push(AdaptationReason::HighStress);
        }
        if variability > self.thresholds.heart_rate_variability_bpm {
            trend
                .alerts
                .push("High heart rate variability detected (possible stress)".to_string());
            trend.adaptations.push(AdaptationReason::HighStress);
        }

        debug!(average, variability, "Heart rate trend");
        trend
    }

    fn analyze_weight(&self, data: &[&BiometricSample]) -> MetricTrend<WeightSummary> {
        let values: Vec<f64> = data.iter().filter_map(|s| s.weight_kg).collect();
        let (Some(first), Some(last)) = (values.first(), values.last()) else {
            return MetricTrend::empty(TrendData::InsufficientData);
        };
        if values.len() < 2 {
            return MetricTrend::empty(TrendData::InsufficientData);
        }

        let change = last - first;

        let mut trend = MetricTrend::empty(TrendData::Measured(WeightSummary {
            total_change_kg: change,
            trend: TrendDirection::of(&values),
            rate_per_day: change / values.len().max(1) as f64,
        }));

        if change.abs() > self.thresholds.weight_change_kg {
            let direction = if change > 0.0 { "gained" } else { "lost" };
            trend.alerts.push(format!(
                "Significant weight change: {} {:.1} kg",
                direction,
                change.abs()
            ));
            trend.adaptations.push(AdaptationReason::WeightChange);
        }

        debug!(change, "Weight trend");
        trend
    }
}
