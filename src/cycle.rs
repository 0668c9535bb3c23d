use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{
    ConceptionProbability, CyclePrediction, FertileWindow, PeriodForecast, PregnancyEstimate,
    Trimester,
};

/// Luteal phase assumed fixed regardless of total cycle length. A known
/// medical simplification shared by all the calculators below; changing it
/// would silently shift every derived date.
pub const LUTEAL_PHASE_DAYS: i64 = 14;

/// Sperm survives up to 5 days before ovulation.
pub const SPERM_SURVIVAL_DAYS: i64 = 5;
/// The egg survives about 1 day after ovulation.
pub const EGG_SURVIVAL_DAYS: i64 = 1;

/// Naegele's rule: 280 days from the last menstrual period.
pub const GESTATION_FROM_LMP_DAYS: i64 = 280;
/// 266 days from conception.
pub const GESTATION_FROM_CONCEPTION_DAYS: i64 = 266;
/// 24 weeks from conception.
pub const VIABILITY_DAYS: i64 = 168;
/// 37 weeks from conception.
pub const FULL_TERM_DAYS: i64 = 259;

/// Cycle lengths outside this range are rejected rather than computed with.
pub const MIN_CYCLE_LENGTH_DAYS: i64 = 10;
pub const MAX_CYCLE_LENGTH_DAYS: i64 = 90;

#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("cycle length {0} days is outside the supported range {MIN_CYCLE_LENGTH_DAYS}-{MAX_CYCLE_LENGTH_DAYS}")]
    CycleLengthOutOfRange(i64),
    #[error("gestational age {0} weeks is not usable for dating")]
    GestationalAgeOutOfRange(f64),
}

fn check_cycle_length(cycle_length_days: i64) -> Result<(), CycleError> {
    if (MIN_CYCLE_LENGTH_DAYS..=MAX_CYCLE_LENGTH_DAYS).contains(&cycle_length_days) {
        Ok(())
    } else {
        Err(CycleError::CycleLengthOutOfRange(cycle_length_days))
    }
}

/// Forecast the next period start from the last one.
///
/// `today` is injected so predictions are reproducible in tests; callers
/// pass `chrono::Local::now().date_naive()` or equivalent.
pub fn predict_next_period(
    last_period: NaiveDate,
    cycle_length_days: i64,
    today: NaiveDate,
) -> Result<PeriodForecast, CycleError> {
    check_cycle_length(cycle_length_days)?;

    let next_period_date = last_period + Duration::days(cycle_length_days);
    let current_cycle_day = (today - last_period).num_days() + 1;
    let days_until_next_period = (next_period_date - today).num_days().max(0);

    Ok(PeriodForecast {
        next_period_date,
        days_until_next_period,
        current_cycle_day,
    })
}

/// Estimate ovulation and the fertile window for one cycle.
///
/// Ovulation falls `LUTEAL_PHASE_DAYS` before the next period. The window
/// spans sperm survival before ovulation through egg survival after it.
pub fn ovulation_window(
    last_period: NaiveDate,
    cycle_length_days: i64,
) -> Result<FertileWindow, CycleError> {
    check_cycle_length(cycle_length_days)?;

    let ovulation_date = last_period + Duration::days(cycle_length_days - LUTEAL_PHASE_DAYS);

    Ok(FertileWindow {
        ovulation_date,
        fertile_window_start: ovulation_date - Duration::days(SPERM_SURVIVAL_DAYS),
        fertile_window_end: ovulation_date + Duration::days(EGG_SURVIVAL_DAYS),
    })
}

/// Inclusive range check against a fertile window.
pub fn is_within_fertile_window(
    date: NaiveDate,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> bool {
    date >= window_start && date <= window_end
}

/// Per-cycle conception chance by age bracket, adjusted down the longer the
/// couple has been trying, with absolute floors. Cumulative figures use
/// independent-trials compounding.
pub fn estimate_conception_probability(age_years: u32, months_trying: u32) -> ConceptionProbability {
    let base: f64 = match age_years {
        0..=24 => 25.0,
        25..=29 => 20.0,
        30..=34 => 15.0,
        35..=39 => 10.0,
        _ => 5.0,
    };

    let mut monthly = base;
    if months_trying > 6 {
        monthly = (monthly * 0.8).max(5.0);
    }
    if months_trying > 12 {
        monthly = (monthly * 0.6).max(3.0);
    }

    let cumulative = |months: i32| -> u8 {
        let p = 1.0 - (1.0 - monthly / 100.0).powi(months);
        (p * 100.0).round() as u8
    };

    ConceptionProbability {
        monthly_percent: monthly,
        cumulative_6_month_percent: cumulative(6),
        cumulative_12_month_percent: cumulative(12),
    }
}

/// How the pregnancy is dated. Exactly one method applies at a time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DueDateMethod {
    LastPeriod {
        last_period: NaiveDate,
        cycle_length_days: i64,
    },
    Conception {
        conception_date: NaiveDate,
    },
    Ultrasound {
        scan_date: NaiveDate,
        gestational_age_weeks: f64,
    },
}

/// Compute the due date and derived milestones for the selected method.
pub fn calculate_due_date(
    method: DueDateMethod,
    today: NaiveDate,
) -> Result<PregnancyEstimate, CycleError> {
    let (due_date, conception) = match method {
        DueDateMethod::LastPeriod {
            last_period,
            cycle_length_days,
        } => {
            check_cycle_length(cycle_length_days)?;
            let due = last_period + Duration::days(GESTATION_FROM_LMP_DAYS);
            let conception =
                last_period + Duration::days(cycle_length_days - LUTEAL_PHASE_DAYS);
            (due, conception)
        }
        DueDateMethod::Conception { conception_date } => (
            conception_date + Duration::days(GESTATION_FROM_CONCEPTION_DAYS),
            conception_date,
        ),
        DueDateMethod::Ultrasound {
            scan_date,
            gestational_age_weeks,
        } => {
            if !(gestational_age_weeks > 0.0 && gestational_age_weeks < 43.0) {
                return Err(CycleError::GestationalAgeOutOfRange(gestational_age_weeks));
            }
            let remaining =
                (GESTATION_FROM_LMP_DAYS as f64 - gestational_age_weeks * 7.0).round() as i64;
            let due = scan_date + Duration::days(remaining);
            (due, due - Duration::days(GESTATION_FROM_CONCEPTION_DAYS))
        }
    };

    let days_since_conception = (today - conception).num_days();
    let weeks_pregnant = days_since_conception.div_euclid(7);
    let days_extra = days_since_conception.rem_euclid(7);

    let trimester = if weeks_pregnant < 13 {
        Trimester::First
    } else if weeks_pregnant < 27 {
        Trimester::Second
    } else {
        Trimester::Third
    };

    Ok(PregnancyEstimate {
        due_date,
        conception_date_estimate: conception,
        weeks_pregnant,
        days_extra,
        trimester,
        days_until_due: (due_date - today).num_days(),
        viability_date: conception + Duration::days(VIABILITY_DAYS),
        full_term_date: conception + Duration::days(FULL_TERM_DAYS),
    })
}

/// Assemble the full prediction record for the current cycle.
pub fn predict(
    last_period: NaiveDate,
    cycle_length_days: i64,
    today: NaiveDate,
) -> Result<CyclePrediction, CycleError> {
    let forecast = predict_next_period(last_period, cycle_length_days, today)?;
    let window = ovulation_window(last_period, cycle_length_days)?;

    Ok(CyclePrediction {
        next_period_date: forecast.next_period_date,
        ovulation_date: window.ovulation_date,
        fertile_window_start: window.fertile_window_start,
        fertile_window_end: window.fertile_window_end,
        current_cycle_day: forecast.current_cycle_day,
        days_until_next_period: forecast.days_until_next_period,
        confidence_percent: confidence_percent(cycle_length_days),
    })
}

/// Prediction confidence from how far the cycle length sits outside the
/// typical 21-35 day band. Clamped to 10-95 percent.
fn confidence_percent(cycle_length_days: i64) -> u8 {
    let deviation = if cycle_length_days < 21 {
        21 - cycle_length_days
    } else if cycle_length_days > 35 {
        cycle_length_days - 35
    } else {
        0
    };
    (90 - deviation * 4).clamp(10, 95) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn next_period_simple() {
        let f = predict_next_period(d("2024-01-01"), 28, d("2024-01-10")).unwrap();
        assert_eq!(f.next_period_date, d("2024-01-29"));
        assert_eq!(f.current_cycle_day, 10);
        assert_eq!(f.days_until_next_period, 19);
    }

    #[test]
    fn days_until_never_negative() {
        let f = predict_next_period(d("2024-01-01"), 28, d("2024-02-15")).unwrap();
        assert_eq!(f.days_until_next_period, 0);
        assert_eq!(f.current_cycle_day, 46);
    }

    #[test]
    fn rejects_implausible_cycle_length() {
        assert!(predict_next_period(d("2024-01-01"), 9, d("2024-01-10")).is_err());
        assert!(predict_next_period(d("2024-01-01"), 91, d("2024-01-10")).is_err());
        assert!(ovulation_window(d("2024-01-01"), 200).is_err());
    }

    #[test]
    fn fertile_window_is_six_days_with_ovulation_inside() {
        for len in 21..=35 {
            let w = ovulation_window(d("2024-03-05"), len).unwrap();
            assert_eq!(
                (w.fertile_window_end - w.fertile_window_start).num_days(),
                6
            );
            assert!(w.ovulation_date > w.fertile_window_start);
            assert!(w.ovulation_date < w.fertile_window_end);
        }
    }

    #[test]
    fn ovulation_for_28_day_cycle() {
        let w = ovulation_window(d("2024-01-01"), 28).unwrap();
        assert_eq!(w.ovulation_date, d("2024-01-15"));
        assert_eq!(w.fertile_window_start, d("2024-01-10"));
        assert_eq!(w.fertile_window_end, d("2024-01-16"));
    }

    #[test]
    fn fertile_window_check_is_inclusive() {
        let w = ovulation_window(d("2024-01-01"), 28).unwrap();
        assert!(is_within_fertile_window(
            w.fertile_window_start,
            w.fertile_window_start,
            w.fertile_window_end
        ));
        assert!(is_within_fertile_window(
            w.fertile_window_end,
            w.fertile_window_start,
            w.fertile_window_end
        ));
        assert!(!is_within_fertile_window(
            w.fertile_window_end + Duration::days(1),
            w.fertile_window_start,
            w.fertile_window_end
        ));
    }

    #[test]
    fn conception_probability_reference_value() {
        // Base 20% monthly compounds to 74% over six months.
        let p = estimate_conception_probability(27, 0);
        assert_eq!(p.monthly_percent, 20.0);
        assert_eq!(p.cumulative_6_month_percent, 74);
    }

    #[test]
    fn conception_probability_age_brackets() {
        let by_age: Vec<f64> = [24, 25, 30, 35, 40, 55]
            .iter()
            .map(|&age| estimate_conception_probability(age, 0).monthly_percent)
            .collect();
        assert_eq!(by_age, vec![25.0, 20.0, 15.0, 10.0, 5.0, 5.0]);
    }

    #[test]
    fn conception_probability_drops_with_months_trying() {
        let fresh = estimate_conception_probability(27, 0).monthly_percent;
        let seven = estimate_conception_probability(27, 7).monthly_percent;
        let thirteen = estimate_conception_probability(27, 13).monthly_percent;
        assert!(seven < fresh);
        assert!(thirteen < seven);
        // Both adjustments apply in sequence past twelve months.
        assert_eq!(seven, 16.0);
        assert_eq!(thirteen, 16.0 * 0.6);
    }

    #[test]
    fn conception_probability_floors() {
        let p = estimate_conception_probability(45, 13);
        assert_eq!(p.monthly_percent, 3.0);
    }

    #[test]
    fn due_date_from_lmp() {
        let e = calculate_due_date(
            DueDateMethod::LastPeriod {
                last_period: d("2024-01-01"),
                cycle_length_days: 28,
            },
            d("2024-03-01"),
        )
        .unwrap();
        assert_eq!(e.due_date, d("2024-10-07"));
        assert_eq!(e.conception_date_estimate, d("2024-01-15"));
        assert_eq!(e.viability_date, d("2024-07-01"));
        assert_eq!(e.full_term_date, d("2024-09-30"));
    }

    #[test]
    fn due_date_from_conception() {
        let e = calculate_due_date(
            DueDateMethod::Conception {
                conception_date: d("2024-01-15"),
            },
            d("2024-01-15"),
        )
        .unwrap();
        assert_eq!(e.due_date, d("2024-10-07"));
        assert_eq!(e.weeks_pregnant, 0);
        assert_eq!(e.days_extra, 0);
        assert_eq!(e.trimester, Trimester::First);
        assert_eq!(e.days_until_due, 266);
    }

    #[test]
    fn due_date_from_ultrasound() {
        // Scan at exactly 12 weeks: 280 - 84 = 196 days remain.
        let e = calculate_due_date(
            DueDateMethod::Ultrasound {
                scan_date: d("2024-03-25"),
                gestational_age_weeks: 12.0,
            },
            d("2024-03-25"),
        )
        .unwrap();
        assert_eq!(e.due_date, d("2024-03-25") + Duration::days(196));
        assert_eq!(e.conception_date_estimate, e.due_date - Duration::days(266));
    }

    #[test]
    fn ultrasound_rejects_bad_gestational_age() {
        let bad = calculate_due_date(
            DueDateMethod::Ultrasound {
                scan_date: d("2024-03-25"),
                gestational_age_weeks: -1.0,
            },
            d("2024-03-25"),
        );
        assert!(bad.is_err());
    }

    #[test]
    fn trimester_boundaries() {
        let conception = d("2024-01-15");
        let at_weeks = |weeks: i64| {
            calculate_due_date(
                DueDateMethod::Conception {
                    conception_date: conception,
                },
                conception + Duration::days(weeks * 7),
            )
            .unwrap()
            .trimester
        };
        assert_eq!(at_weeks(12), Trimester::First);
        assert_eq!(at_weeks(13), Trimester::Second);
        assert_eq!(at_weeks(26), Trimester::Second);
        assert_eq!(at_weeks(27), Trimester::Third);
    }

    #[test]
    fn full_prediction_confidence_band() {
        let typical = predict(d("2024-01-01"), 28, d("2024-01-10")).unwrap();
        assert_eq!(typical.confidence_percent, 90);

        let long = predict(d("2024-01-01"), 40, d("2024-01-10")).unwrap();
        assert!(long.confidence_percent < typical.confidence_percent);

        let extreme = predict(d("2024-01-01"), 90, d("2024-01-10")).unwrap();
        assert_eq!(extreme.confidence_percent, 10);
    }
}
