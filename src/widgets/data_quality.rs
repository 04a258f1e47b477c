//! Data quality and compliance widget.

use serde::Serialize;

use crate::error::EngineError;
use crate::metrics::quality::{
    quality_report, recommendations, QualityIssues, QualityStatus, Recommendation,
};

use super::WidgetContext;

const TOP_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QualitySnapshot {
    quality_score: f64,
    status: QualityStatus,
    min_score: f64,
    total_devices: usize,
    compliant_devices: usize,
    non_compliant_devices: usize,
    total_issues: usize,
    issues: QualityIssues,
    recommendations: Vec<Recommendation>,
}

pub fn snapshot(ctx: &WidgetContext) -> Result<serde_json::Value, EngineError> {
    let report = quality_report(
        &ctx.inventory.devices,
        &ctx.config.required_fields,
        &ctx.config.naming_conventions,
    );

    let mut issues = report.issues;
    issues.missing_fields.truncate(10);
    issues.naming_violations.truncate(10);
    issues.duplicate_serials.truncate(5);
    issues.duplicate_macs.truncate(5);
    issues.missing_primary_ip.truncate(10);
    issues.no_interfaces.truncate(10);

    let mut recs = recommendations(&ctx.inventory.devices);
    recs.truncate(TOP_RECOMMENDATIONS);

    let snapshot = QualitySnapshot {
        quality_score: report.score,
        status: QualityStatus::from_score(report.score, ctx.config.min_quality_score),
        min_score: ctx.config.min_quality_score,
        total_devices: report.total_devices,
        compliant_devices: report.compliant_devices,
        non_compliant_devices: report.non_compliant_devices,
        total_issues: report.total_issues,
        issues,
        recommendations: recs,
    };
    Ok(serde_json::to_value(snapshot)?)
}
