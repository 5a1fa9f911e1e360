//! Input validation functions
//!
//! Range checks for profiles, biometric samples and food candidates.
//! Uses both custom validators and the `validator` crate for derive macros;
//! the custom functions additionally reject NaN and infinite values.

use crate::models::{BiometricSample, MealCandidate, UserProfile};
use validator::Validate;

/// Validate body weight (in kg)
pub fn validate_weight(weight_kg: f64) -> Result<(), String> {
    if weight_kg.is_nan() || weight_kg.is_infinite() {
        return Err("Weight must be a valid number".to_string());
    }
    if weight_kg < 20.0 {
        return Err("Weight must be at least 20 kg".to_string());
    }
    if weight_kg > 500.0 {
        return Err("Weight must be at most 500 kg".to_string());
    }
    Ok(())
}

/// Validate height (in cm)
/// Valid range: 50-300 cm
pub fn validate_height_cm(height_cm: f64) -> Result<(), String> {
    if height_cm.is_nan() || height_cm.is_infinite() {
        return Err("Height must be a valid number".to_string());
    }
    if height_cm < 50.0 {
        return Err("Height must be at least 50 cm".to_string());
    }
    if height_cm > 300.0 {
        return Err("Height must be at most 300 cm".to_string());
    }
    Ok(())
}

/// Validate age in years
pub fn validate_age(age: u32) -> Result<(), String> {
    if age == 0 {
        return Err("Age must be at least 1 year".to_string());
    }
    if age > 120 {
        return Err("Age must be at most 120 years".to_string());
    }
    Ok(())
}

/// Validate a non-negative amount (calories, grams, cost)
pub fn validate_non_negative(value: f64) -> Result<(), String> {
    if value.is_nan() || value.is_infinite() {
        return Err("Value must be a valid number".to_string());
    }
    if value < 0.0 {
        return Err("Value cannot be negative".to_string());
    }
    Ok(())
}

/// Validate percentage value (0-100)
pub fn validate_percentage(value: f64) -> Result<(), String> {
    if value.is_nan() || value.is_infinite() {
        return Err("Percentage must be a valid number".to_string());
    }
    if !(0.0..=100.0).contains(&value) {
        return Err("Percentage must be between 0 and 100".to_string());
    }
    Ok(())
}

/// Validate a glucose reading (mg/dL)
pub fn validate_glucose(mg_dl: f64) -> Result<(), String> {
    if mg_dl.is_nan() || mg_dl.is_infinite() {
        return Err("Glucose must be a valid number".to_string());
    }
    if mg_dl <= 0.0 {
        return Err("Glucose must be positive".to_string());
    }
    if mg_dl > 1000.0 {
        return Err("Glucose reading unreasonably high".to_string());
    }
    Ok(())
}

/// Validate hours of sleep for one night
pub fn validate_sleep_hours(hours: f64) -> Result<(), String> {
    if hours.is_nan() || hours.is_infinite() {
        return Err("Sleep duration must be a valid number".to_string());
    }
    if !(0.0..=24.0).contains(&hours) {
        return Err("Sleep duration must be between 0 and 24 hours".to_string());
    }
    Ok(())
}

/// Validate a macro split; shares must be non-negative and sum to 1
pub fn validate_macro_ratios(protein: f64, carbs: f64, fat: f64) -> Result<(), String> {
    if [protein, carbs, fat].iter().any(|r| !r.is_finite() || *r < 0.0) {
        return Err("Macro ratios must be non-negative numbers".to_string());
    }
    if ((protein + carbs + fat) - 1.0).abs() > 0.01 {
        return Err("Macro ratios must add up to 1.0".to_string());
    }
    Ok(())
}

// ============================================================================
// Record Validation
// ============================================================================

/// Validate a complete profile, collecting every failing field
pub fn validate_profile(profile: &UserProfile) -> Result<(), Vec<ValidationError>> {
    let mut errors = derive_errors(profile.validate());

    push_err(&mut errors, "weight_kg", validate_weight(profile.weight_kg));
    push_err(&mut errors, "height_cm", validate_height_cm(profile.height_cm));
    push_err(&mut errors, "age", validate_age(profile.age));
    if let Some(budget) = profile.daily_budget {
        push_err(&mut errors, "daily_budget", validate_non_negative(budget));
    }
    if let Some(calories) = profile.target_calories {
        push_err(&mut errors, "target_calories", validate_non_negative(calories));
    }

    finish(errors)
}

/// Validate a single biometric sample
pub fn validate_sample(sample: &BiometricSample) -> Result<(), Vec<ValidationError>> {
    let mut errors = derive_errors(sample.validate());

    if let Some(hours) = sample.sleep_hours {
        push_err(&mut errors, "sleep_hours", validate_sleep_hours(hours));
    }
    if let Some(glucose) = sample.glucose_mg_dl {
        push_err(&mut errors, "glucose_mg_dl", validate_glucose(glucose));
    }
    if let Some(fat) = sample.body_fat_pct {
        push_err(&mut errors, "body_fat_pct", validate_percentage(fat));
    }

    finish(errors)
}

/// Validate a food candidate's per-100 g values
pub fn validate_candidate(candidate: &MealCandidate) -> Result<(), Vec<ValidationError>> {
    let mut errors = derive_errors(candidate.validate());

    for (field, value) in [
        ("calories_per_100g", candidate.calories_per_100g),
        ("protein_g", candidate.protein_g),
        ("carbs_g", candidate.carbs_g),
        ("fat_g", candidate.fat_g),
        ("cost_per_100g", candidate.cost_per_100g),
    ] {
        push_err(&mut errors, field, validate_non_negative(value));
    }

    finish(errors)
}

fn derive_errors(result: Result<(), validator::ValidationErrors>) -> Vec<ValidationError> {
    let Err(errors) = result else {
        return Vec::new();
    };

    let mut out: Vec<ValidationError> = errors
        .field_errors()
        .into_iter()
        .map(|(field, _)| ValidationError::new(&field.to_string(), "value out of range"))
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

fn push_err(errors: &mut Vec<ValidationError>, field: &str, result: Result<(), String>) {
    if let Err(message) = result {
        // The derive already flagged this field; keep the more specific message
        errors.retain(|e| e.field != field);
        errors.push(ValidationError::new(field, &message));
    }
}

fn finish(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// ============================================================================
// User-Friendly Field Labels
// ============================================================================

/// Map technical field names to user-friendly display labels
pub fn get_field_display_label(field_name: &str) -> &str {
    match field_name {
        "weight" | "weight_kg" => "Current Weight",
        "height" | "height_cm" => "Height",
        "age" => "Age",
        "sex" => "Biological Sex",
        "activity_level" => "Activity Level",
        "daily_budget" => "Daily Budget",
        "target_calories" => "Daily Calorie Target",
        "steps" => "Steps",
        "heart_rate" => "Heart Rate",
        "sleep_hours" => "Sleep Duration",
        "glucose_mg_dl" => "Blood Glucose",
        "body_fat_pct" => "Body Fat",
        "name" => "Name",
        "calories_per_100g" => "Calories per 100 g",
        "cost_per_100g" => "Cost per 100 g",
        _ => field_name,
    }
}

/// Validation error with field context
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub display_label: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
            display_label: get_field_display_label(field).to_string(),
        }
    }

    /// Format as user-friendly error message
    pub fn user_message(&self) -> String {
        format!("{}: {}", self.display_label, self.message)
    }
}

/// Join a list of field errors into one message
pub fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::user_message)
        .collect::<Vec<_>>()
        .join("; ")
}
