//! Alert aggregation across tracked entities.
//!
//! Runs growth estimation, exhaustion projection and anomaly detection for
//! every entity the caller supplies, adds staleness alerts, and returns one
//! ranked list. Inventory devices that stopped updating get their own
//! low-severity pass, merged into the same list. A single entity's failure is skipped and reported; only an
//! unreachable sample store fails the whole call.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::EngineError;
use crate::store::SampleStore;
use crate::types::{DeviceRecord, DeviceStatus, InsightsConfig, TrackedEntity};
use crate::util;

use super::anomaly::detect_anomaly;
use super::growth::estimate_growth;
use super::projection::date_after_weeks;
use super::series::Series;

/// Utilization at which an entity is exhausted.
pub const EXHAUSTION_THRESHOLD: f64 = 100.0;

/// Exhaustion projected sooner than this many weeks is `high`.
pub const HIGH_SEVERITY_WEEKS: f64 = 4.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn rank(self) -> u8 {
        match self {
            Severity::High => 0,
            Severity::Medium => 1,
            Severity::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

/// Kind-specific alert metrics. Values are display-rounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertKind {
    #[serde(rename_all = "camelCase")]
    Exhaustion {
        current_value: f64,
        growth_rate: f64,
        weeks_remaining: f64,
        estimated_exhaustion: Option<DateTime<Utc>>,
        data_points_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    Anomaly {
        current_value: f64,
        mean_value: f64,
        std_deviation: f64,
    },
    #[serde(rename_all = "camelCase")]
    Staleness {
        days_since_update: i64,
        last_observed: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    StaleDeviceData {
        days_since_update: i64,
        last_updated: DateTime<Utc>,
    },
}

impl AlertKind {
    pub fn name(&self) -> &'static str {
        match self {
            AlertKind::Exhaustion { .. } => "exhaustion",
            AlertKind::Anomaly { .. } => "anomaly",
            AlertKind::Staleness { .. } => "staleness",
            AlertKind::StaleDeviceData { .. } => "stale_device_data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(flatten)]
    pub kind: AlertKind,
    pub severity: Severity,
    pub entity_id: String,
    pub entity_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    pub message: String,
    pub recommendation: String,
    /// Stable per entity and kind, for consumer-side dedup.
    pub fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedEntity {
    pub entity_id: String,
    pub reason: String,
}

/// Ranked alerts plus diagnostics about the batch that produced them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertReport {
    pub alerts: Vec<Alert>,
    pub evaluated_count: usize,
    pub skipped: Vec<SkippedEntity>,
    /// True when the deadline stopped evaluation before every entity ran.
    pub truncated: bool,
    pub generated_at: DateTime<Utc>,
}

impl AlertReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.alerts.iter().filter(|a| a.severity == severity).count()
    }

    /// Append alerts found outside the sample store and re-rank. Existing
    /// alerts keep their place within each severity tier.
    pub fn merge(&mut self, alerts: Vec<Alert>) {
        self.alerts.extend(alerts);
        self.alerts.sort_by_key(|a| a.severity.rank());
    }
}

/// Evaluation instant plus an optional wall-clock deadline.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationOptions {
    pub now: DateTime<Utc>,
    pub deadline: Option<Instant>,
}

impl EvaluationOptions {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[derive(Default)]
struct EntityFindings {
    exhaustion: Option<Alert>,
    anomaly: Option<Alert>,
    staleness: Option<Alert>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Evaluate every entity and return ranked alerts.
///
/// Ordering is a stable sort by severity over discovery order: exhaustion
/// alerts, then anomalies, then staleness, each in caller entity order.
pub fn evaluate_alerts(
    store: &dyn SampleStore,
    entities: &[TrackedEntity],
    config: &InsightsConfig,
    options: &EvaluationOptions,
) -> Result<AlertReport, EngineError> {
    config.validate()?;

    let mut exhaustion = Vec::new();
    let mut anomalies = Vec::new();
    let mut stale = Vec::new();
    let mut skipped = Vec::new();
    let mut evaluated_count = 0usize;
    let mut truncated = false;

    for entity in entities {
        if options.expired() {
            log::warn!(
                "insights: deadline reached after {} of {} entities",
                evaluated_count + skipped.len(),
                entities.len()
            );
            truncated = true;
            break;
        }

        match evaluate_entity(store, entity, config, options.now) {
            Ok(findings) => {
                evaluated_count += 1;
                exhaustion.extend(findings.exhaustion);
                anomalies.extend(findings.anomaly);
                stale.extend(findings.staleness);
            }
            Err(e) if e.is_fatal() => {
                log::error!("insights: aborting evaluation at {}: {}", entity.id, e);
                return Err(e);
            }
            Err(e) => {
                log::warn!("insights: skipping {}: {}", entity.id, e);
                skipped.push(SkippedEntity {
                    entity_id: entity.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let mut alerts = exhaustion;
    alerts.append(&mut anomalies);
    alerts.append(&mut stale);
    alerts.sort_by_key(|a| a.severity.rank());

    log::info!(
        "insights: {} alerts from {} entities ({} skipped{})",
        alerts.len(),
        evaluated_count,
        skipped.len(),
        if truncated { ", truncated" } else { "" }
    );

    Ok(AlertReport {
        alerts,
        evaluated_count,
        skipped,
        truncated,
        generated_at: options.now,
    })
}

fn evaluate_entity(
    store: &dyn SampleStore,
    entity: &TrackedEntity,
    config: &InsightsConfig,
    now: DateTime<Utc>,
) -> Result<EntityFindings, EngineError> {
    let samples = store.fetch_samples(&entity.id, config.lookback_start(now))?;
    let series = Series::new(&entity.id, samples)?;

    let mut findings = EntityFindings {
        exhaustion: exhaustion_alert(entity, &series, config, now),
        anomaly: anomaly_alert(entity, &series),
        staleness: None,
    };

    if let Some(last) = store.last_observed(&entity.id)? {
        findings.staleness = staleness_alert(entity, last, config, now);
    }

    Ok(findings)
}

fn exhaustion_alert(
    entity: &TrackedEntity,
    series: &Series,
    config: &InsightsConfig,
    now: DateTime<Utc>,
) -> Option<Alert> {
    let growth = estimate_growth(series)?;
    let rate = growth.rate_per_week;
    if rate < config.growth_rate_threshold || rate <= 0.0 {
        return None;
    }

    let current = series.latest()?.value;
    // Already at or past exhaustion while still growing counts as zero weeks.
    let weeks = ((EXHAUSTION_THRESHOLD - current) / rate).max(0.0);
    if weeks >= config.forecast_horizon_weeks() {
        return None;
    }

    let severity = if weeks < HIGH_SEVERITY_WEEKS {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(Alert {
        kind: AlertKind::Exhaustion {
            current_value: util::round_to(current, 1),
            growth_rate: rate,
            weeks_remaining: util::round_to(weeks, 1),
            estimated_exhaustion: date_after_weeks(now, weeks),
            data_points_count: growth.data_points_count,
        },
        severity,
        entity_id: entity.id.clone(),
        entity_label: entity.label.clone(),
        site: entity.site.clone(),
        message: format!(
            "{} projected to exhaust in {:.1} weeks",
            entity.label, weeks
        ),
        recommendation: "Consider expanding capacity, e.g. enlarging the prefix or implementing IPv6"
            .to_string(),
        fingerprint: fingerprint(&["exhaustion", &entity.id]),
    })
}

fn anomaly_alert(entity: &TrackedEntity, series: &Series) -> Option<Alert> {
    let reading = detect_anomaly(series)?;

    Some(Alert {
        kind: AlertKind::Anomaly {
            current_value: util::round_to(reading.current_value, 1),
            mean_value: util::round_to(reading.mean, 1),
            std_deviation: util::round_to(reading.std_dev, 2),
        },
        severity: Severity::Medium,
        entity_id: entity.id.clone(),
        entity_label: entity.label.clone(),
        site: entity.site.clone(),
        message: format!("Unusual growth pattern detected in {}", entity.label),
        recommendation: "Investigate recent changes or automation errors".to_string(),
        fingerprint: fingerprint(&["anomaly", &entity.id]),
    })
}

fn staleness_alert(
    entity: &TrackedEntity,
    last_observed: DateTime<Utc>,
    config: &InsightsConfig,
    now: DateTime<Utc>,
) -> Option<Alert> {
    if last_observed >= config.stale_cutoff(now) {
        return None;
    }
    let days_since_update = (now - last_observed).num_days();

    Some(Alert {
        kind: AlertKind::Staleness {
            days_since_update,
            last_observed,
        },
        severity: Severity::Low,
        entity_id: entity.id.clone(),
        entity_label: entity.label.clone(),
        site: entity.site.clone(),
        message: format!(
            "{} hasn't been measured in {} days",
            entity.label, days_since_update
        ),
        recommendation: "Verify the entity is still active and refresh its data".to_string(),
        fingerprint: fingerprint(&["staleness", &entity.id]),
    })
}

/// Low-severity alerts for active devices whose record has not been updated
/// within the staleness window, in inventory order.
pub fn stale_device_alerts(
    devices: &[DeviceRecord],
    config: &InsightsConfig,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let cutoff = config.stale_cutoff(now);

    devices
        .iter()
        .filter(|d| d.status == DeviceStatus::Active && d.last_updated < cutoff)
        .map(|device| {
            let days_since_update = (now - device.last_updated).num_days();
            Alert {
                kind: AlertKind::StaleDeviceData {
                    days_since_update,
                    last_updated: device.last_updated,
                },
                severity: Severity::Low,
                entity_id: device.id.clone(),
                entity_label: device.name.clone(),
                site: Some(
                    device
                        .field("site")
                        .unwrap_or("No Site")
                        .to_string(),
                ),
                message: format!(
                    "Device {} hasn't been updated in {} days",
                    device.name, days_since_update
                ),
                recommendation: "Verify device is still active and update inventory data"
                    .to_string(),
                fingerprint: fingerprint(&["stale_device", &device.id]),
            }
        })
        .collect()
}

/// Compute a dedup fingerprint from key components.
pub fn fingerprint(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(b"|");
    }
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
