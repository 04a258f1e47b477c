//! IPAM utilization widget.

use serde::Serialize;

use crate::error::EngineError;
use crate::metrics::utilization::{utilization_summary, PrefixUtilization};

use super::WidgetContext;

const TOP_PREFIXES: usize = 20;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusCounts {
    healthy: usize,
    warning: usize,
    critical: usize,
    total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IpamSnapshot {
    summary: StatusCounts,
    top_prefixes: Vec<PrefixUtilization>,
    warning_threshold: f64,
    critical_threshold: f64,
}

pub fn snapshot(ctx: &WidgetContext) -> Result<serde_json::Value, EngineError> {
    let mut summary = utilization_summary(
        &ctx.inventory.prefixes,
        None,
        ctx.config.ipam_warning_threshold,
        ctx.config.ipam_critical_threshold,
        ctx.now,
    );
    summary.prefixes.truncate(TOP_PREFIXES);

    let snapshot = IpamSnapshot {
        summary: StatusCounts {
            healthy: summary.healthy_count,
            warning: summary.warning_count,
            critical: summary.critical_count,
            total: summary.total_prefixes,
        },
        top_prefixes: summary.prefixes,
        warning_threshold: summary.warning_threshold,
        critical_threshold: summary.critical_threshold,
    };
    Ok(serde_json::to_value(snapshot)?)
}
