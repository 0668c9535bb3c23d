//! Cycle prediction, regularity analysis, and third-party export
//! normalization.
//!
//! Three independent pieces, all pure computation over in-memory records:
//!
//! - [`cycle`] — fertility and pregnancy date math from a last period start
//!   and an average cycle length.
//! - [`analysis`] — cycle-length variance over a logged history, classified
//!   into regularity tiers plus a 0-100 score.
//! - [`import`] — heuristic normalization of heterogeneous third-party
//!   export payloads into a canonical record bundle.
//!
//! Storage, file reading, and the wall clock belong to callers: every
//! prediction entry point takes `today` as a parameter, and the normalizer
//! consumes already-decoded [`serde_json::Value`] payloads.

pub mod analysis;
pub mod cycle;
pub mod import;
pub mod models;

pub use analysis::{analyze_regularity, cycle_summary, regularity_score, AnalysisError};
pub use cycle::{
    calculate_due_date, estimate_conception_probability, is_within_fertile_window,
    ovulation_window, predict, predict_next_period, CycleError, DueDateMethod,
};
pub use import::{normalize, normalize_rows, parse_payload, ImportError};
pub use models::{
    ConceptionProbability, CyclePrediction, CycleRecord, CycleSummary, FertileWindow,
    FlowIntensity, ImportBundle, MoodRecord, PeriodForecast, PregnancyEstimate, Regularity,
    RegularityAnalysis, Severity, SymptomCategory, SymptomRecord, Trimester,
};
