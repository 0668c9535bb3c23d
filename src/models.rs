use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlowIntensity {
    Light,
    #[default]
    Normal,
    Heavy,
    VeryHeavy,
}

impl FlowIntensity {
    /// Lenient parse of third-party flow labels. Unknown labels fall back
    /// to `Normal`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "light" | "spotting" => Self::Light,
            "heavy" => Self::Heavy,
            "very heavy" | "very_heavy" | "veryheavy" => Self::VeryHeavy,
            _ => Self::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SymptomCategory {
    #[default]
    Physical,
    Emotional,
    Behavioral,
}

impl SymptomCategory {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "emotional" | "mood" => Self::Emotional,
            "behavioral" | "behavioural" => Self::Behavioral,
            _ => Self::Physical,
        }
    }
}

/// Symptom severity as recorded: either a 1-10 numeric scale or a textual
/// label from a third-party export. `score()` gives the normalized value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Severity {
    Scale(i64),
    Text(String),
}

impl Severity {
    /// Normalize to an integer in [1, 10]. Textual labels map to fixed
    /// midpoints; unrecognized text scores 5; numbers clamp to the scale.
    pub fn score(&self) -> u8 {
        match self {
            Severity::Scale(n) => (*n).clamp(1, 10) as u8,
            Severity::Text(label) => match label.trim().to_lowercase().as_str() {
                "mild" | "light" => 3,
                "moderate" | "medium" => 6,
                "severe" | "heavy" | "intense" => 9,
                _ => 5,
            },
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Scale(5)
    }
}

/// One observed menstrual cycle. Never mutated by the prediction logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleRecord {
    pub id: Uuid,
    pub start_date: NaiveDate,
    /// Days between this start and the next; computed from consecutive
    /// starts when absent.
    pub cycle_length_days: Option<i64>,
    #[serde(default = "default_period_length")]
    pub period_length_days: i64,
    #[serde(default)]
    pub flow_intensity: FlowIntensity,
    #[serde(default)]
    pub notes: String,
}

pub(crate) fn default_period_length() -> i64 {
    5
}

impl CycleRecord {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_date,
            cycle_length_days: None,
            period_length_days: default_period_length(),
            flow_intensity: FlowIntensity::Normal,
            notes: String::new(),
        }
    }
}

/// One symptom observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomRecord {
    pub date: NaiveDate,
    pub name: String,
    #[serde(default)]
    pub category: SymptomCategory,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub notes: String,
}

/// One mood observation. All numeric fields default to 5 when the source
/// data omits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodRecord {
    pub date: NaiveDate,
    pub mood: String,
    #[serde(default = "default_level")]
    pub energy_level: u8,
    #[serde(default = "default_level")]
    pub stress_level: u8,
    #[serde(default = "default_level")]
    pub sleep_quality: u8,
    #[serde(default)]
    pub notes: String,
}

pub(crate) fn default_level() -> u8 {
    5
}

/// Next-period forecast for a single cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodForecast {
    pub next_period_date: NaiveDate,
    pub days_until_next_period: i64,
    pub current_cycle_day: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FertileWindow {
    pub ovulation_date: NaiveDate,
    pub fertile_window_start: NaiveDate,
    pub fertile_window_end: NaiveDate,
}

/// Full derived prediction for the current cycle. Deterministic given the
/// last period start, the cycle length, and the injected `today`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CyclePrediction {
    pub next_period_date: NaiveDate,
    pub ovulation_date: NaiveDate,
    pub fertile_window_start: NaiveDate,
    pub fertile_window_end: NaiveDate,
    pub current_cycle_day: i64,
    pub days_until_next_period: i64,
    pub confidence_percent: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptionProbability {
    pub monthly_percent: f64,
    pub cumulative_6_month_percent: u8,
    pub cumulative_12_month_percent: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Trimester {
    First,
    Second,
    Third,
}

/// Due-date math derived from one of the three dating methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PregnancyEstimate {
    pub due_date: NaiveDate,
    pub conception_date_estimate: NaiveDate,
    pub weeks_pregnant: i64,
    pub days_extra: i64,
    pub trimester: Trimester,
    pub days_until_due: i64,
    pub viability_date: NaiveDate,
    pub full_term_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Regularity {
    Regular,
    SlightlyIrregular,
    ModeratelyIrregular,
    HighlyIrregular,
}

impl std::fmt::Display for Regularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Regularity::Regular => "Regular",
            Regularity::SlightlyIrregular => "Slightly Irregular",
            Regularity::ModeratelyIrregular => "Moderately Irregular",
            Regularity::HighlyIrregular => "Highly Irregular",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegularityAnalysis {
    pub average_cycle_length_days: i64,
    pub standard_deviation_days: f64,
    pub classification: Regularity,
    pub recommendation: String,
}

/// Aggregate history stats for a stats view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSummary {
    pub total_cycles: usize,
    pub avg_cycle_length: Option<f64>,
    pub avg_period_length: Option<f64>,
    pub shortest_cycle: Option<i64>,
    pub longest_cycle: Option<i64>,
    pub last_period_start: Option<NaiveDate>,
}

/// Canonical output of the import normalizer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ImportBundle {
    pub cycles: Vec<CycleRecord>,
    pub symptoms: Vec<SymptomRecord>,
    pub moods: Vec<MoodRecord>,
}
