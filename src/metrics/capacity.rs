//! Capacity planning: inventory growth, rack space by site, and a linear
//! forecast of object counts.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::types::{DeviceRecord, Inventory, RackRecord};
use crate::util;

/// Average weeks in a calendar month.
pub const WEEKS_PER_MONTH: f64 = 4.33;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthFigures {
    pub total: usize,
    /// Created within the period
    pub new: usize,
    pub per_week: f64,
    /// Share of the total created within the period, percent
    pub growth_rate: f64,
}

impl GrowthFigures {
    fn count<I>(created: I, days: u32, cutoff: DateTime<Utc>) -> Self
    where
        I: Iterator<Item = Option<DateTime<Utc>>>,
    {
        let mut total = 0;
        let mut new = 0;
        for ts in created {
            total += 1;
            if ts.is_some_and(|ts| ts >= cutoff) {
                new += 1;
            }
        }
        let weeks = f64::from(days) / 7.0;
        let per_week = if weeks > 0.0 { new as f64 / weeks } else { 0.0 };
        GrowthFigures {
            total,
            new,
            per_week: util::round_to(per_week, 2),
            growth_rate: util::round_to(util::percent(new as f64, total as f64), 2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthMetrics {
    pub period_days: u32,
    pub devices: GrowthFigures,
    pub prefixes: GrowthFigures,
    pub circuits: GrowthFigures,
}

/// Objects created in the last `days` days. Records without a creation
/// time count toward totals only.
pub fn growth_metrics(inventory: &Inventory, days: u32, now: DateTime<Utc>) -> GrowthMetrics {
    let cutoff = util::saturating_sub(now, Duration::days(i64::from(days)));
    GrowthMetrics {
        period_days: days,
        devices: GrowthFigures::count(inventory.devices.iter().map(|d| d.created), days, cutoff),
        prefixes: GrowthFigures::count(inventory.prefixes.iter().map(|p| p.created), days, cutoff),
        circuits: GrowthFigures::count(inventory.circuits.iter().map(|c| c.created), days, cutoff),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRackUtilization {
    pub site: String,
    pub total_racks: usize,
    pub total_u_space: f64,
    pub used_u_space: f64,
    pub available_u_space: f64,
    /// 1 decimal
    pub utilization: f64,
}

/// Rack space per site, most utilized first.
///
/// Racks without a height count toward `total_racks` but contribute no
/// space. Used space is the summed height of devices mounted in a rack.
pub fn rack_utilization(racks: &[RackRecord], devices: &[DeviceRecord]) -> Vec<SiteRackUtilization> {
    let mut mounted: HashMap<&str, f64> = HashMap::new();
    for device in devices {
        if let (Some(rack), Some(height)) = (device.rack_id.as_deref(), device.u_height) {
            *mounted.entry(rack).or_insert(0.0) += height;
        }
    }

    let mut rows: Vec<SiteRackUtilization> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for rack in racks {
        let site = rack
            .site
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("No Site");
        let i = *index.entry(site).or_insert_with(|| {
            rows.push(SiteRackUtilization {
                site: site.to_string(),
                total_racks: 0,
                total_u_space: 0.0,
                used_u_space: 0.0,
                available_u_space: 0.0,
                utilization: 0.0,
            });
            rows.len() - 1
        });
        let row = &mut rows[i];
        row.total_racks += 1;
        if let Some(height) = rack.u_height.filter(|h| *h > 0) {
            row.total_u_space += f64::from(height);
            row.used_u_space += mounted.get(rack.id.as_str()).copied().unwrap_or(0.0);
        }
    }

    for row in &mut rows {
        row.available_u_space = row.total_u_space - row.used_u_space;
        row.utilization = util::round_to(util::percent(row.used_u_space, row.total_u_space), 1);
    }
    rows.sort_by(|a, b| b.utilization.total_cmp(&a.utilization));
    rows
}

pub fn sites_near_capacity(rows: &[SiteRackUtilization], threshold: f64) -> Vec<SiteRackUtilization> {
    rows.iter()
        .filter(|r| r.utilization >= threshold)
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastFigures {
    pub current: usize,
    pub forecasted: i64,
    pub growth: i64,
}

impl ForecastFigures {
    fn project(figures: &GrowthFigures, weeks: f64) -> Self {
        let growth = figures.per_week * weeks;
        // Whole objects only; partial growth is dropped.
        ForecastFigures {
            current: figures.total,
            forecasted: (figures.total as f64 + growth) as i64,
            growth: growth as i64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityForecast {
    pub months: u32,
    pub devices: ForecastFigures,
    pub prefixes: ForecastFigures,
    pub circuits: ForecastFigures,
}

/// Extend the current weekly creation rate linearly over `months`.
pub fn forecast_capacity(growth: &GrowthMetrics, months: u32) -> CapacityForecast {
    let weeks = f64::from(months) * WEEKS_PER_MONTH;
    CapacityForecast {
        months,
        devices: ForecastFigures::project(&growth.devices, weeks),
        prefixes: ForecastFigures::project(&growth.prefixes, weeks),
        circuits: ForecastFigures::project(&growth.circuits, weeks),
    }
}
