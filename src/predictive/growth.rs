//! Growth estimation: least-squares slope over a series, per week.

use serde::Serialize;

use crate::util;

use super::series::Series;

/// Weekly growth for one entity. Recomputed on every query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthEstimate {
    pub entity_id: String,
    /// Value units per week, rounded to 2 decimals. Negative means decline.
    pub rate_per_week: f64,
    pub data_points_count: usize,
}

/// Estimate weekly growth for a series.
///
/// Returns `None` with fewer than 2 samples. A degenerate series (every
/// sample at the same instant) yields `Some` with a rate of `0.0`.
pub fn estimate_growth(series: &Series) -> Option<GrowthEstimate> {
    if series.len() < 2 {
        return None;
    }

    let daily = ols_slope(&series.elapsed_days(), &series.values());

    Some(GrowthEstimate {
        entity_id: series.entity_id().to_string(),
        rate_per_week: util::round_to(daily * 7.0, 2),
        data_points_count: series.len(),
    })
}

/// `Σ((x-x̄)(y-ȳ)) / Σ((x-x̄)²)`, or 0 when every x is identical.
fn ols_slope(xs: &[f64], ys: &[f64]) -> f64 {
    let (x_mean, y_mean) = match (util::mean(xs), util::mean(ys)) {
        (Some(x), Some(y)) => (x, y),
        _ => return 0.0,
    };

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}
