//! Threshold projection from a current value and weekly growth rate.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

const MILLIS_PER_WEEK: f64 = 7.0 * 86_400_000.0;

/// Projection of one entity toward one threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub entity_id: String,
    pub current_value: f64,
    pub rate_per_week: f64,
    pub threshold: f64,
    /// Absent for flat or declining trends and for thresholds already reached.
    pub weeks_to_threshold: Option<f64>,
    pub projected_date: Option<DateTime<Utc>>,
    pub reached: bool,
}

/// Weeks until `threshold` is crossed, only for a positive rate and a
/// threshold still above the current value.
pub fn weeks_to_threshold(current_value: f64, rate_per_week: f64, threshold: f64) -> Option<f64> {
    if rate_per_week <= 0.0 || !rate_per_week.is_finite() {
        return None;
    }
    if threshold <= current_value {
        return None;
    }
    Some((threshold - current_value) / rate_per_week)
}

/// `now + weeks`, or `None` when the instant is not representable.
pub fn date_after_weeks(now: DateTime<Utc>, weeks: f64) -> Option<DateTime<Utc>> {
    if !weeks.is_finite() || weeks < 0.0 {
        return None;
    }
    let millis = weeks * MILLIS_PER_WEEK;
    if millis >= i64::MAX as f64 {
        return None;
    }
    let delta = Duration::try_milliseconds(millis.round() as i64)?;
    now.checked_add_signed(delta)
}

/// Project `current_value` toward each threshold independently.
pub fn project(
    entity_id: &str,
    current_value: f64,
    rate_per_week: f64,
    thresholds: &[f64],
    now: DateTime<Utc>,
) -> Vec<Projection> {
    thresholds
        .iter()
        .map(|&threshold| {
            let weeks = weeks_to_threshold(current_value, rate_per_week, threshold);
            Projection {
                entity_id: entity_id.to_string(),
                current_value,
                rate_per_week,
                threshold,
                weeks_to_threshold: weeks,
                projected_date: weeks.and_then(|w| date_after_weeks(now, w)),
                reached: current_value >= threshold,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_weeks_to_full_at_five_per_week() {
        assert_eq!(weeks_to_threshold(85.0, 5.0, 100.0), Some(3.0));
        assert_eq!(weeks_to_threshold(85.0, 5.0, 90.0), Some(1.0));
    }

    #[test]
    fn test_flat_or_declining_never_projects() {
        for rate in [0.0, -0.5, -10.0] {
            let projections = project("p1", 40.0, rate, &[50.0, 90.0, 100.0], now());
            for p in projections {
                assert!(p.weeks_to_threshold.is_none(), "rate {} projected", rate);
                assert!(p.projected_date.is_none());
            }
        }
    }

    #[test]
    fn test_projected_date_adds_weeks() {
        let projections = project("p1", 85.0, 5.0, &[100.0], now());
        assert_eq!(projections[0].projected_date, Some(now() + Duration::weeks(3)));
        assert!(!projections[0].reached);
    }

    #[test]
    fn test_monotonic_in_threshold() {
        let thresholds = [41.0, 55.5, 70.0, 90.0, 100.0, 250.0];
        for rate in [0.01, 0.7, 3.0, 12.5] {
            let projections = project("p1", 40.0, rate, &thresholds, now());
            for pair in projections.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                assert!(a.weeks_to_threshold.unwrap() <= b.weeks_to_threshold.unwrap());
                assert!(a.projected_date.unwrap() <= b.projected_date.unwrap());
            }
        }
    }

    #[test]
    fn test_reached_threshold_has_no_future_date() {
        let projections = project("p1", 95.0, 2.0, &[90.0, 100.0], now());
        assert!(projections[0].reached);
        assert!(projections[0].weeks_to_threshold.is_none());
        assert!(!projections[1].reached);
        assert_eq!(projections[1].weeks_to_threshold, Some(2.5));
    }

    #[test]
    fn test_unrepresentable_date_is_absent() {
        let weeks = weeks_to_threshold(0.0, 1e-300, 100.0).unwrap();
        assert!(weeks.is_finite());
        assert!(date_after_weeks(now(), weeks).is_none());
        assert!(date_after_weeks(now(), f64::INFINITY).is_none());
    }
}
