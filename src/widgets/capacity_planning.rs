//! Capacity planning widget: short and long growth windows, rack space and
//! a six month forecast.

use serde::Serialize;

use crate::error::EngineError;
use crate::metrics::capacity::{
    forecast_capacity, growth_metrics, rack_utilization, sites_near_capacity, CapacityForecast,
    GrowthMetrics, SiteRackUtilization,
};

use super::WidgetContext;

const SHORT_PERIOD_DAYS: u32 = 30;
const FORECAST_MONTHS: u32 = 6;
const TOP_SITES: usize = 10;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CapacitySnapshot {
    growth_30_days: GrowthMetrics,
    growth_historical: GrowthMetrics,
    rack_utilization: Vec<SiteRackUtilization>,
    sites_near_capacity: Vec<SiteRackUtilization>,
    forecast_6_months: CapacityForecast,
    capacity_threshold: f64,
}

pub fn snapshot(ctx: &WidgetContext) -> Result<serde_json::Value, EngineError> {
    let inventory = ctx.inventory;
    let short = growth_metrics(inventory, SHORT_PERIOD_DAYS, ctx.now);
    let historical = growth_metrics(inventory, ctx.config.historical_period_days, ctx.now);

    let mut racks = rack_utilization(&inventory.racks, &inventory.devices);
    let near = sites_near_capacity(&racks, ctx.config.capacity_warning_threshold);
    racks.truncate(TOP_SITES);

    let snapshot = CapacitySnapshot {
        growth_30_days: short,
        growth_historical: historical,
        rack_utilization: racks,
        sites_near_capacity: near,
        forecast_6_months: forecast_capacity(&short, FORECAST_MONTHS),
        capacity_threshold: ctx.config.capacity_warning_threshold,
    };
    Ok(serde_json::to_value(snapshot)?)
}
