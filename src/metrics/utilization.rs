//! Prefix utilization and status bands.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::PrefixRecord;
use crate::util;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UtilizationStatus {
    Healthy,
    Warning,
    Danger,
    Critical,
}

impl UtilizationStatus {
    /// Fixed bands: 95+ critical, 90+ danger, 75+ warning.
    pub fn from_percent(utilization: f64) -> Self {
        if utilization >= 95.0 {
            UtilizationStatus::Critical
        } else if utilization >= 90.0 {
            UtilizationStatus::Danger
        } else if utilization >= 75.0 {
            UtilizationStatus::Warning
        } else {
            UtilizationStatus::Healthy
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefixUtilization {
    pub prefix_id: String,
    pub prefix: String,
    pub site: String,
    pub vrf: String,
    pub role: String,
    pub total_ips: u64,
    pub used_ips: u64,
    pub available_ips: u64,
    pub utilization: f64,
    pub status: UtilizationStatus,
    pub description: String,
}

pub fn prefix_utilization(prefix: &PrefixRecord) -> PrefixUtilization {
    let utilization = util::percent(prefix.used_ips as f64, prefix.total_ips as f64);

    PrefixUtilization {
        prefix_id: prefix.id.clone(),
        prefix: prefix.prefix.clone(),
        site: prefix.site.clone().unwrap_or_else(|| "No Site".to_string()),
        vrf: prefix.vrf.clone().unwrap_or_else(|| "Global".to_string()),
        role: prefix.role.clone().unwrap_or_else(|| "No Role".to_string()),
        total_ips: prefix.total_ips,
        used_ips: prefix.used_ips,
        available_ips: prefix.total_ips.saturating_sub(prefix.used_ips),
        utilization: util::round_to(utilization, 2),
        status: UtilizationStatus::from_percent(utilization),
        description: prefix.description.clone().unwrap_or_default(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationSummary {
    pub total_prefixes: usize,
    pub warning_count: usize,
    pub critical_count: usize,
    pub healthy_count: usize,
    /// Highest utilization first
    pub prefixes: Vec<PrefixUtilization>,
    pub warning_threshold: f64,
    pub critical_threshold: f64,
    pub calculated_at: DateTime<Utc>,
}

/// Summarize active prefixes, optionally restricted to one site.
pub fn utilization_summary(
    prefixes: &[PrefixRecord],
    site: Option<&str>,
    warning_threshold: f64,
    critical_threshold: f64,
    now: DateTime<Utc>,
) -> UtilizationSummary {
    let mut rows: Vec<PrefixUtilization> = prefixes
        .iter()
        .filter(|p| p.is_active())
        .filter(|p| site.is_none() || p.site.as_deref() == site)
        .map(prefix_utilization)
        .collect();

    let (mut warning_count, mut critical_count, mut healthy_count) = (0, 0, 0);
    for row in &rows {
        if row.utilization >= critical_threshold {
            critical_count += 1;
        } else if row.utilization >= warning_threshold {
            warning_count += 1;
        } else {
            healthy_count += 1;
        }
    }

    rows.sort_by(|a, b| b.utilization.total_cmp(&a.utilization));

    UtilizationSummary {
        total_prefixes: rows.len(),
        warning_count,
        critical_count,
        healthy_count,
        prefixes: rows,
        warning_threshold,
        critical_threshold,
        calculated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix(id: &str, site: Option<&str>, total: u64, used: u64) -> PrefixRecord {
        PrefixRecord {
            id: id.to_string(),
            prefix: format!("10.{}.0.0/24", id.len()),
            site: site.map(str::to_string),
            vrf: None,
            role: None,
            status: "active".to_string(),
            total_ips: total,
            used_ips: used,
            description: None,
            created: None,
        }
    }

    #[test]
    fn test_status_bands() {
        assert_eq!(UtilizationStatus::from_percent(96.0), UtilizationStatus::Critical);
        assert_eq!(UtilizationStatus::from_percent(90.0), UtilizationStatus::Danger);
        assert_eq!(UtilizationStatus::from_percent(75.0), UtilizationStatus::Warning);
        assert_eq!(UtilizationStatus::from_percent(74.99), UtilizationStatus::Healthy);
    }

    #[test]
    fn test_prefix_utilization_defaults() {
        let util = prefix_utilization(&prefix("p1", None, 254, 127));
        assert_eq!(util.utilization, 50.0);
        assert_eq!(util.available_ips, 127);
        assert_eq!(util.site, "No Site");
        assert_eq!(util.vrf, "Global");
        assert_eq!(util.status, UtilizationStatus::Healthy);
    }

    #[test]
    fn test_empty_prefix_is_zero_percent() {
        let util = prefix_utilization(&prefix("p1", None, 0, 0));
        assert_eq!(util.utilization, 0.0);
    }

    #[test]
    fn test_summary_counts_sorts_and_filters() {
        let mut retired = prefix("p4", Some("ams"), 100, 99);
        retired.status = "deprecated".to_string();
        let prefixes = vec![
            prefix("p1", Some("ams"), 100, 50),
            prefix("p2", Some("ams"), 100, 95),
            prefix("p3", Some("fra"), 100, 80),
            retired,
        ];

        let all = utilization_summary(&prefixes, None, 75.0, 90.0, Utc::now());
        assert_eq!(all.total_prefixes, 3);
        assert_eq!(all.critical_count, 1);
        assert_eq!(all.warning_count, 1);
        assert_eq!(all.healthy_count, 1);
        let order: Vec<&str> = all.prefixes.iter().map(|p| p.prefix_id.as_str()).collect();
        assert_eq!(order, vec!["p2", "p3", "p1"]);

        let ams = utilization_summary(&prefixes, Some("ams"), 75.0, 90.0, Utc::now());
        assert_eq!(ams.total_prefixes, 2);
    }
}
