//! Anomaly detection for the most recent sample of a series.
//!
//! The latest sample is scored against the samples that precede it in the
//! window. A point cannot exceed 2 standard deviations of a window that
//! contains it when the window has 5 points (Samuelson's bound), so the
//! baseline excludes the point under test.

use serde::Serialize;

use crate::util;

use super::series::Series;

/// Minimum samples (baseline plus latest) before any check is made.
pub const MIN_ANOMALY_SAMPLES: usize = 5;

/// Deviation from the baseline mean, in standard deviations, that flags.
pub const STD_DEV_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReading {
    pub current_value: f64,
    pub mean: f64,
    pub std_dev: f64,
}

/// Flag the latest sample if it deviates from the baseline mean by more than
/// `STD_DEV_MULTIPLIER` sample standard deviations.
///
/// Returns `None` for short series and for zero-variance baselines.
pub fn detect_anomaly(series: &Series) -> Option<AnomalyReading> {
    if series.len() < MIN_ANOMALY_SAMPLES {
        return None;
    }

    let values = series.values();
    let (latest, baseline) = values.split_last()?;

    let mean = util::mean(baseline)?;
    let std_dev = util::sample_std_dev(baseline)?;
    if std_dev == 0.0 {
        return None;
    }

    if (latest - mean).abs() > STD_DEV_MULTIPLIER * std_dev {
        Some(AnomalyReading {
            current_value: *latest,
            mean,
            std_dev,
        })
    } else {
        None
    }
}
