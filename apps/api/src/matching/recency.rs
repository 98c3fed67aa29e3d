use chrono::{Datelike, NaiveDate};

/// Default half-life for experience recency decay, in months.
pub const DEFAULT_HALF_LIFE_MONTHS: f64 = 18.0;

/// Computes recency with exponential half-life decay, measured at `as_of`.
/// Returns 1.0 for current roles (end_date = None) and for roles ending after `as_of`.
pub fn compute_recency_score(
    end_date: Option<NaiveDate>,
    as_of: NaiveDate,
    half_life_months: f64,
) -> f64 {
    let end_date = match end_date {
        Some(d) => d,
        None => return 1.0, // current position
    };
    let months_since = months_between(end_date, as_of);
    if months_since <= 0.0 || half_life_months <= 0.0 {
        return 1.0;
    }
    (0.5_f64)
        .powf(months_since / half_life_months)
        .clamp(0.0, 1.0)
}

fn months_between(start: NaiveDate, end: NaiveDate) -> f64 {
    let years = end.year() - start.year();
    let months = end.month() as i32 - start.month() as i32;
    let total = years * 12 + months;
    let day_frac = (end.day() as f64 - start.day() as f64) / 30.0;
    (total as f64 + day_frac).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_current_role_is_one() {
        assert_eq!(compute_recency_score(None, date(2026, 1, 1), 18.0), 1.0);
    }

    #[test]
    fn test_one_half_life_halves_the_score() {
        let score = compute_recency_score(Some(date(2024, 7, 1)), date(2026, 1, 1), 18.0);
        assert!((score - 0.5).abs() < 1e-9, "Score was {score}");
    }

    #[test]
    fn test_very_old_role_low_score() {
        let score = compute_recency_score(Some(date(2010, 1, 1)), date(2026, 1, 1), 18.0);
        assert!(score < 0.01, "Score was {score}");
    }

    #[test]
    fn test_future_end_date_is_one() {
        assert_eq!(
            compute_recency_score(Some(date(2027, 1, 1)), date(2026, 1, 1), 18.0),
            1.0
        );
    }

    #[test]
    fn test_same_inputs_same_score() {
        let a = compute_recency_score(Some(date(2022, 3, 15)), date(2026, 10, 1), 18.0);
        let b = compute_recency_score(Some(date(2022, 3, 15)), date(2026, 10, 1), 18.0);
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
