//! Predictive maintenance widget: ranked alerts over active prefixes, plus
//! stale-device alerts from the inventory.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::EngineError;
use crate::predictive::alerts::{
    evaluate_alerts, stale_device_alerts, Alert, EvaluationOptions, Severity,
};

use super::WidgetContext;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveSnapshot {
    pub total_alerts: usize,
    pub high_priority_count: usize,
    pub medium_priority_count: usize,
    pub low_priority_count: usize,
    pub high_priority_alerts: Vec<Alert>,
    pub medium_priority_alerts: Vec<Alert>,
    pub low_priority_alerts: Vec<Alert>,
    pub alert_types: BTreeMap<String, usize>,
    pub skipped_entities: usize,
    pub truncated: bool,
    pub trend_period_days: u32,
    pub forecast_horizon_days: u32,
}

fn top(alerts: &[Alert], severity: Severity, limit: usize) -> Vec<Alert> {
    alerts
        .iter()
        .filter(|a| a.severity == severity)
        .take(limit)
        .cloned()
        .collect()
}

pub fn build_snapshot(ctx: &WidgetContext) -> Result<PredictiveSnapshot, EngineError> {
    let entities = ctx.inventory.tracked_prefixes();
    let mut report = evaluate_alerts(
        ctx.store,
        &entities,
        ctx.config,
        &EvaluationOptions::at(ctx.now),
    )?;
    report.merge(stale_device_alerts(
        &ctx.inventory.devices,
        ctx.config,
        ctx.now,
    ));

    let mut alert_types = BTreeMap::new();
    for alert in &report.alerts {
        *alert_types.entry(alert.kind.name().to_string()).or_insert(0) += 1;
    }

    Ok(PredictiveSnapshot {
        total_alerts: report.alerts.len(),
        high_priority_count: report.count_by_severity(Severity::High),
        medium_priority_count: report.count_by_severity(Severity::Medium),
        low_priority_count: report.count_by_severity(Severity::Low),
        high_priority_alerts: top(&report.alerts, Severity::High, 10),
        medium_priority_alerts: top(&report.alerts, Severity::Medium, 10),
        low_priority_alerts: top(&report.alerts, Severity::Low, 5),
        alert_types,
        skipped_entities: report.skipped_count(),
        truncated: report.truncated,
        trend_period_days: ctx.config.trend_period_days,
        forecast_horizon_days: ctx.config.forecast_horizon_days,
    })
}

pub fn snapshot(ctx: &WidgetContext) -> Result<serde_json::Value, EngineError> {
    Ok(serde_json::to_value(build_snapshot(ctx)?)?)
}
