use crate::models::{CycleRecord, CycleSummary, Regularity, RegularityAnalysis};

/// Minimum history needed to derive even one cycle length.
pub const MIN_RECORDS: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("need at least {MIN_RECORDS} logged cycles to analyze regularity, got {found}")]
    InsufficientData { found: usize },
}

/// Classify cycle regularity from a history of period start dates.
///
/// Records are sorted internally; callers may pass history in any order.
/// Standard deviation is the population form (divide by N) so results are
/// stable for short histories.
pub fn analyze_regularity(records: &[CycleRecord]) -> Result<RegularityAnalysis, AnalysisError> {
    if records.len() < MIN_RECORDS {
        return Err(AnalysisError::InsufficientData {
            found: records.len(),
        });
    }

    let mut sorted: Vec<&CycleRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.start_date);

    let cycle_lengths: Vec<f64> = sorted
        .windows(2)
        .map(|w| (w[1].start_date - w[0].start_date).num_days() as f64)
        .collect();

    let average = mean(&cycle_lengths);
    let std_dev = population_std_deviation(&cycle_lengths, average);

    let classification = if std_dev > 7.0 {
        Regularity::HighlyIrregular
    } else if std_dev > 4.0 {
        Regularity::ModeratelyIrregular
    } else if std_dev > 2.0 {
        Regularity::SlightlyIrregular
    } else {
        Regularity::Regular
    };

    let recommendation = if std_dev > 7.0 {
        "Consult healthcare provider"
    } else {
        "Continue monitoring"
    };

    Ok(RegularityAnalysis {
        average_cycle_length_days: average.round() as i64,
        standard_deviation_days: std_dev,
        classification,
        recommendation: recommendation.to_string(),
    })
}

/// Coarser 0-100 regularity score used by wellness-style summaries.
/// Distinct from the classification tiers on purpose: the UI label and the
/// numeric score serve different callers.
pub fn regularity_score(std_dev_days: f64) -> f64 {
    (100.0 - std_dev_days * 10.0).clamp(0.0, 100.0)
}

/// Aggregate stats over a cycle history for a stats view.
pub fn cycle_summary(records: &[CycleRecord]) -> CycleSummary {
    let mut sorted: Vec<&CycleRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.start_date);

    if sorted.is_empty() {
        return CycleSummary {
            total_cycles: 0,
            avg_cycle_length: None,
            avg_period_length: None,
            shortest_cycle: None,
            longest_cycle: None,
            last_period_start: None,
        };
    }

    let cycle_lengths: Vec<i64> = sorted
        .windows(2)
        .map(|w| (w[1].start_date - w[0].start_date).num_days())
        .collect();

    let period_lengths: Vec<f64> = sorted.iter().map(|r| r.period_length_days as f64).collect();

    CycleSummary {
        total_cycles: sorted.len(),
        avg_cycle_length: if cycle_lengths.is_empty() {
            None
        } else {
            let lengths: Vec<f64> = cycle_lengths.iter().map(|&l| l as f64).collect();
            Some(mean(&lengths))
        },
        avg_period_length: Some(mean(&period_lengths)),
        shortest_cycle: cycle_lengths.iter().copied().min(),
        longest_cycle: cycle_lengths.iter().copied().max(),
        last_period_start: sorted.last().map(|r| r.start_date),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std_deviation(values: &[f64], avg: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
