//! Due evaluation for a single tracker.
//!
//! A tracker is due once `now` is strictly after
//! `last_performed_at + interval + grace`, where the grace depends on the
//! unit: 6 hours for days, 12 hours for months, 24 hours for years. Month
//! and year steps use calendar arithmetic and clamp to the last day of the
//! target month.

use std::fmt;

use chrono::{DateTime, Duration, Months, Utc};

use cubby_core::error::AppError;
use cubby_core::result::AppResult;
use cubby_entity::tracker::IntervalUnit;

/// Derived state of a tracker relative to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DueStatus {
    /// The interval and its grace have elapsed.
    Due,
    /// Still within the interval or its grace.
    Ok,
    /// No entry has been recorded yet, so there is nothing to measure from.
    Unknown,
}

impl fmt::Display for DueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Due => write!(f, "due"),
            Self::Ok => write!(f, "ok"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Grace added on top of the interval before a tracker counts as due.
pub fn grace(unit: IntervalUnit) -> Duration {
    match unit {
        IntervalUnit::Day => Duration::hours(6),
        IntervalUnit::Month => Duration::hours(12),
        IntervalUnit::Year => Duration::hours(24),
    }
}

/// The instant after which a tracker last performed at `last_performed_at`
/// becomes due.
pub fn threshold(
    last_performed_at: DateTime<Utc>,
    interval: i32,
    unit: IntervalUnit,
) -> AppResult<DateTime<Utc>> {
    if interval <= 0 {
        return Err(AppError::validation(format!(
            "Interval must be positive, got {interval}"
        )));
    }

    let count = interval as u32;
    let stepped = match unit {
        IntervalUnit::Day => last_performed_at.checked_add_signed(Duration::days(i64::from(count))),
        IntervalUnit::Month => last_performed_at.checked_add_months(Months::new(count)),
        IntervalUnit::Year => count
            .checked_mul(12)
            .and_then(|months| last_performed_at.checked_add_months(Months::new(months))),
    };

    stepped
        .and_then(|t| t.checked_add_signed(grace(unit)))
        .ok_or_else(|| {
            AppError::validation(format!(
                "Interval of {interval} {unit} from {last_performed_at} is out of range"
            ))
        })
}

/// Evaluate whether a tracker is due at `now`.
///
/// Returns [`DueStatus::Due`] or [`DueStatus::Ok`]. Fails only for a
/// non-positive interval or a threshold outside the representable range.
pub fn evaluate(
    last_performed_at: DateTime<Utc>,
    interval: i32,
    unit: IntervalUnit,
    now: DateTime<Utc>,
) -> AppResult<DueStatus> {
    let threshold = threshold(last_performed_at, interval, unit)?;
    if now > threshold {
        Ok(DueStatus::Due)
    } else {
        Ok(DueStatus::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_boundary_for_every_unit() {
        let last = at(2024, 3, 10, 8);
        let cases = [
            (IntervalUnit::Day, 14, at(2024, 3, 24, 14)),
            (IntervalUnit::Month, 2, at(2024, 5, 10, 20)),
            (IntervalUnit::Year, 1, at(2025, 3, 11, 8)),
        ];

        for (unit, interval, expected) in cases {
            let t = threshold(last, interval, unit).unwrap();
            assert_eq!(t, expected, "threshold for {interval} {unit}");

            let before = t - Duration::nanoseconds(1);
            let after = t + Duration::nanoseconds(1);
            assert_eq!(evaluate(last, interval, unit, before).unwrap(), DueStatus::Ok);
            assert_eq!(evaluate(last, interval, unit, t).unwrap(), DueStatus::Ok);
            assert_eq!(evaluate(last, interval, unit, after).unwrap(), DueStatus::Due);
        }
    }

    #[test]
    fn test_month_end_clamps() {
        let t = threshold(at(2023, 1, 31, 0), 1, IntervalUnit::Month).unwrap();
        assert_eq!(t, at(2023, 2, 28, 12));

        let t = threshold(at(2024, 1, 31, 0), 1, IntervalUnit::Month).unwrap();
        assert_eq!(t, at(2024, 2, 29, 12));
    }

    #[test]
    fn test_leap_day_plus_one_year() {
        let t = threshold(at(2024, 2, 29, 0), 1, IntervalUnit::Year).unwrap();
        assert_eq!(t, at(2025, 3, 1, 0));
    }

    #[test]
    fn test_bedsheet_fifteen_days_later_is_due() {
        let now = Utc::now();
        let last = now - Duration::days(15);
        assert_eq!(evaluate(last, 14, IntervalUnit::Day, now).unwrap(), DueStatus::Due);
        assert_eq!(evaluate(last, 30, IntervalUnit::Day, now).unwrap(), DueStatus::Ok);
    }

    #[test]
    fn test_non_positive_interval_is_rejected() {
        let now = Utc::now();
        assert!(evaluate(now, 0, IntervalUnit::Day, now).is_err());
        assert!(evaluate(now, -3, IntervalUnit::Month, now).is_err());
    }

    #[test]
    fn test_out_of_range_interval_is_rejected() {
        let now = Utc::now();
        assert!(threshold(now, i32::MAX, IntervalUnit::Year).is_err());
    }
}
