//! Device health scoring.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::types::{DeviceRecord, DeviceStatus};
use crate::util;

const HEALTHY_SCORE: i32 = 80;
const WARNING_SCORE: i32 = 60;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceHealth {
    pub device_id: String,
    pub device_name: String,
    pub score: i32,
    pub issues: Vec<String>,
    pub is_healthy: bool,
}

/// Score a device out of 100, deducting for each missing attribute.
pub fn device_health(device: &DeviceRecord) -> DeviceHealth {
    let checks: [(bool, i32, &str); 8] = [
        (!device.has_primary_ip(), 20, "Missing primary IP address"),
        (device.field("site").is_none(), 15, "No site assigned"),
        (device.field("role").is_none(), 15, "No device role assigned"),
        (device.interfaces.is_empty(), 15, "No interfaces configured"),
        (device.field("serial").is_none(), 10, "Missing serial number"),
        (device.field("asset_tag").is_none(), 10, "Missing asset tag"),
        (device.field("platform").is_none(), 10, "No platform specified"),
        (device.status == DeviceStatus::Offline, 5, "Device is offline"),
    ];

    let mut score = 100;
    let mut issues = Vec::new();
    for (failed, penalty, issue) in checks {
        if failed {
            score -= penalty;
            issues.push(issue.to_string());
        }
    }
    let score = score.max(0);

    DeviceHealth {
        device_id: device.id.clone(),
        device_name: device.name.clone(),
        score,
        issues,
        is_healthy: score >= HEALTHY_SCORE,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonIssues {
    pub no_primary_ip: usize,
    pub no_interfaces: usize,
    pub no_site: usize,
    pub no_role: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub total_devices: usize,
    pub healthy_count: usize,
    pub warning_count: usize,
    pub critical_count: usize,
    /// Percent of active devices scoring healthy; 100 with no devices
    pub overall_health: f64,
    pub critical_devices: Vec<DeviceHealth>,
    pub warning_devices: Vec<DeviceHealth>,
    pub stale_devices_count: usize,
    pub common_issues: CommonIssues,
}

/// Summarize active devices. Lists keep the first `list_limit` of each band.
pub fn health_summary(
    devices: &[DeviceRecord],
    stale_window: Duration,
    list_limit: usize,
    now: DateTime<Utc>,
) -> HealthSummary {
    let active: Vec<&DeviceRecord> = devices
        .iter()
        .filter(|d| d.status == DeviceStatus::Active)
        .collect();

    let mut healthy_count = 0;
    let mut warning = Vec::new();
    let mut critical = Vec::new();
    let mut common = CommonIssues::default();

    for device in &active {
        let health = device_health(device);
        if health.score >= HEALTHY_SCORE {
            healthy_count += 1;
        } else if health.score >= WARNING_SCORE {
            warning.push(health);
        } else {
            critical.push(health);
        }

        if !device.has_primary_ip() {
            common.no_primary_ip += 1;
        }
        if device.interfaces.is_empty() {
            common.no_interfaces += 1;
        }
        if device.field("site").is_none() {
            common.no_site += 1;
        }
        if device.field("role").is_none() {
            common.no_role += 1;
        }
    }

    let cutoff = util::saturating_sub(now, stale_window);
    let stale_devices_count = active.iter().filter(|d| d.last_updated < cutoff).count();

    let total_devices = active.len();
    let overall_health = if total_devices > 0 {
        util::round_to(util::percent(healthy_count as f64, total_devices as f64), 1)
    } else {
        100.0
    };
    let warning_count = warning.len();
    let critical_count = critical.len();
    warning.truncate(list_limit);
    critical.truncate(list_limit);

    HealthSummary {
        total_devices,
        healthy_count,
        warning_count,
        critical_count,
        overall_health,
        critical_devices: critical,
        warning_devices: warning,
        stale_devices_count,
        common_issues: common,
    }
}
