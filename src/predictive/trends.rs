//! Per-entity trend report for drill-down views.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::EngineError;
use crate::store::SampleStore;
use crate::types::InsightsConfig;
use crate::util;

use super::growth::estimate_growth;
use super::projection::project;
use super::series::Series;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdForecast {
    pub threshold: f64,
    /// Rounded to 1 decimal
    pub weeks: Option<f64>,
    pub projected_date: Option<DateTime<Utc>>,
    pub reached: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub entity_id: String,
    pub has_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub current_value: Option<f64>,
    /// `None` with fewer than 2 samples
    pub growth_rate_per_week: Option<f64>,
    pub forecasts: Vec<ThresholdForecast>,
    pub data_points_count: usize,
    pub analysis_period_days: u32,
}

/// Build a trend report from an already fetched series.
pub fn analyze_trend(
    series: &Series,
    thresholds: &[f64],
    analysis_period_days: u32,
    now: DateTime<Utc>,
) -> TrendReport {
    let latest = match series.latest() {
        Some(s) => s.value,
        None => {
            return TrendReport {
                entity_id: series.entity_id().to_string(),
                has_data: false,
                message: Some("Insufficient historical data".to_string()),
                current_value: None,
                growth_rate_per_week: None,
                forecasts: Vec::new(),
                data_points_count: 0,
                analysis_period_days,
            }
        }
    };

    let growth = estimate_growth(series);
    let rate = growth.as_ref().map(|g| g.rate_per_week);

    let forecasts = project(
        series.entity_id(),
        latest,
        rate.unwrap_or(0.0),
        thresholds,
        now,
    )
    .into_iter()
    .map(|p| ThresholdForecast {
        threshold: p.threshold,
        weeks: p.weeks_to_threshold.map(|w| util::round_to(w, 1)),
        projected_date: p.projected_date,
        reached: p.reached,
    })
    .collect();

    TrendReport {
        entity_id: series.entity_id().to_string(),
        has_data: true,
        message: None,
        current_value: Some(util::round_to(latest, 2)),
        growth_rate_per_week: rate,
        forecasts,
        data_points_count: series.len(),
        analysis_period_days,
    }
}

/// Fetch an entity's lookback window and report its trend.
pub fn trend_for_entity(
    store: &dyn SampleStore,
    entity_id: &str,
    config: &InsightsConfig,
    now: DateTime<Utc>,
) -> Result<TrendReport, EngineError> {
    let samples = store.fetch_samples(entity_id, config.lookback_start(now))?;
    let series = Series::new(entity_id, samples)?;
    Ok(analyze_trend(
        &series,
        &config.projection_thresholds,
        config.trend_period_days,
        now,
    ))
}
