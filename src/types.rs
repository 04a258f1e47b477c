use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::util;

/// Engine configuration, supplied by the caller.
///
/// Accepts both camelCase keys and the snake_case keys used by the dashboard
/// plugin settings (`trend_period_days`, `stale_data_days`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsConfig {
    /// Lookback window for trend and anomaly computation, in days
    #[serde(default = "default_trend_period_days", alias = "trend_period_days")]
    pub trend_period_days: u32,
    #[serde(default = "default_forecast_horizon_days", alias = "forecast_horizon_days")]
    pub forecast_horizon_days: u32,
    /// Minimum weekly growth (value units per week) before exhaustion is alerted
    #[serde(default = "default_growth_rate_threshold", alias = "growth_rate_threshold")]
    pub growth_rate_threshold: f64,
    #[serde(default = "default_stale_data_days", alias = "stale_data_days")]
    pub stale_data_days: u32,
    #[serde(default = "default_projection_thresholds", alias = "projection_thresholds")]
    pub projection_thresholds: Vec<f64>,
    #[serde(default = "default_ipam_warning_threshold", alias = "ipam_warning_threshold")]
    pub ipam_warning_threshold: f64,
    #[serde(default = "default_ipam_critical_threshold", alias = "ipam_critical_threshold")]
    pub ipam_critical_threshold: f64,
    #[serde(default = "default_min_quality_score", alias = "min_quality_score")]
    pub min_quality_score: f64,
    #[serde(default = "default_required_fields", alias = "required_fields")]
    pub required_fields: Vec<String>,
    /// Field name -> regex, e.g. `device_name` -> `^[a-z]+-\d+$`
    #[serde(default, alias = "naming_conventions")]
    pub naming_conventions: HashMap<String, String>,
    /// Window for the capacity-planning growth figures, in days
    #[serde(default = "default_historical_period_days", alias = "historical_period_days")]
    pub historical_period_days: u32,
    /// Rack utilization percent at which a site is near capacity
    #[serde(
        default = "default_capacity_warning_threshold",
        alias = "capacity_warning_threshold"
    )]
    pub capacity_warning_threshold: f64,
    #[serde(default = "default_true", alias = "enable_caching")]
    pub enable_caching: bool,
    /// Widget cache time-to-live in seconds
    #[serde(default = "default_cache_ttl", alias = "cache_ttl")]
    pub cache_ttl: u64,
    #[serde(default)]
    pub widgets: HashMap<String, WidgetSettings>,
}

/// Per-widget overrides keyed by widget slug.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "refresh_interval")]
    pub refresh_interval: Option<u64>,
}

fn default_trend_period_days() -> u32 {
    90
}

fn default_forecast_horizon_days() -> u32 {
    180
}

fn default_growth_rate_threshold() -> f64 {
    5.0
}

fn default_stale_data_days() -> u32 {
    30
}

fn default_projection_thresholds() -> Vec<f64> {
    vec![90.0, 100.0]
}

fn default_ipam_warning_threshold() -> f64 {
    75.0
}

fn default_ipam_critical_threshold() -> f64 {
    90.0
}

fn default_min_quality_score() -> f64 {
    80.0
}

fn default_required_fields() -> Vec<String> {
    vec!["name".to_string(), "site".to_string(), "status".to_string()]
}

fn default_historical_period_days() -> u32 {
    90
}

fn default_capacity_warning_threshold() -> f64 {
    80.0
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    300
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            trend_period_days: default_trend_period_days(),
            forecast_horizon_days: default_forecast_horizon_days(),
            growth_rate_threshold: default_growth_rate_threshold(),
            stale_data_days: default_stale_data_days(),
            projection_thresholds: default_projection_thresholds(),
            ipam_warning_threshold: default_ipam_warning_threshold(),
            ipam_critical_threshold: default_ipam_critical_threshold(),
            min_quality_score: default_min_quality_score(),
            required_fields: default_required_fields(),
            naming_conventions: HashMap::new(),
            historical_period_days: default_historical_period_days(),
            capacity_warning_threshold: default_capacity_warning_threshold(),
            enable_caching: true,
            cache_ttl: default_cache_ttl(),
            widgets: HashMap::new(),
        }
    }
}

impl InsightsConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, EngineError> {
        let config: InsightsConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject windows and thresholds the engine cannot reason about.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.trend_period_days == 0 {
            return Err(EngineError::ConfigurationError(
                "trendPeriodDays must be positive".to_string(),
            ));
        }
        if self.forecast_horizon_days == 0 {
            return Err(EngineError::ConfigurationError(
                "forecastHorizonDays must be positive".to_string(),
            ));
        }
        if self.stale_data_days == 0 {
            return Err(EngineError::ConfigurationError(
                "staleDataDays must be positive".to_string(),
            ));
        }
        if self.historical_period_days == 0 {
            return Err(EngineError::ConfigurationError(
                "historicalPeriodDays must be positive".to_string(),
            ));
        }
        if !self.growth_rate_threshold.is_finite() {
            return Err(EngineError::ConfigurationError(
                "growthRateThreshold must be a finite number".to_string(),
            ));
        }
        if self.projection_thresholds.iter().any(|t| !t.is_finite()) {
            return Err(EngineError::ConfigurationError(
                "projectionThresholds must be finite numbers".to_string(),
            ));
        }
        if self.ipam_warning_threshold > self.ipam_critical_threshold {
            return Err(EngineError::ConfigurationError(format!(
                "ipamWarningThreshold ({}) exceeds ipamCriticalThreshold ({})",
                self.ipam_warning_threshold, self.ipam_critical_threshold
            )));
        }
        Ok(())
    }

    pub fn lookback(&self) -> Duration {
        Duration::days(self.trend_period_days as i64)
    }

    pub fn stale_window(&self) -> Duration {
        Duration::days(self.stale_data_days as i64)
    }

    /// Earliest sample timestamp inside the lookback window.
    pub fn lookback_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        util::saturating_sub(now, self.lookback())
    }

    /// Entities last observed before this instant are stale.
    pub fn stale_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        util::saturating_sub(now, self.stale_window())
    }

    pub fn forecast_horizon_weeks(&self) -> f64 {
        self.forecast_horizon_days as f64 / 7.0
    }

    /// Whether a widget is enabled; widgets default to enabled.
    pub fn widget_enabled(&self, slug: &str) -> bool {
        self.widgets
            .get(slug)
            .and_then(|w| w.enabled)
            .unwrap_or(true)
    }

    pub fn widget_refresh_interval(&self, slug: &str, default_secs: u64) -> u64 {
        self.widgets
            .get(slug)
            .and_then(|w| w.refresh_interval)
            .unwrap_or(default_secs)
    }
}

// =============================================================================
// Samples and tracked entities
// =============================================================================

/// A single observed metric reading for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub entity_id: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(entity_id: impl Into<String>, timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            entity_id: entity_id.into(),
            timestamp,
            value,
        }
    }
}

/// An entity the caller wants evaluated, in caller order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntity {
    pub id: String,
    /// Display name, e.g. the prefix in CIDR notation
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
}

impl TrackedEntity {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            site: None,
        }
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }
}

// =============================================================================
// Inventory snapshot
// =============================================================================

/// Inventory records handed to the widgets by the host database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    #[serde(default)]
    pub prefixes: Vec<PrefixRecord>,
    #[serde(default)]
    pub devices: Vec<DeviceRecord>,
    #[serde(default)]
    pub cables: Vec<CableRecord>,
    #[serde(default)]
    pub circuits: Vec<CircuitRecord>,
    #[serde(default)]
    pub racks: Vec<RackRecord>,
}

impl Inventory {
    /// Active prefixes as tracked entities, in inventory order.
    pub fn tracked_prefixes(&self) -> Vec<TrackedEntity> {
        self.prefixes
            .iter()
            .filter(|p| p.is_active())
            .map(PrefixRecord::tracked_entity)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefixRecord {
    pub id: String,
    pub prefix: String,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub vrf: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    pub total_ips: u64,
    pub used_ips: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

fn default_status() -> String {
    "active".to_string()
}

impl PrefixRecord {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }

    pub fn tracked_entity(&self) -> TrackedEntity {
        TrackedEntity {
            id: self.id.clone(),
            label: self.prefix.clone(),
            site: self.site.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Active,
    Offline,
    Planned,
    Staged,
    Failed,
    Decommissioning,
    Inventory,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Active => "active",
            DeviceStatus::Offline => "offline",
            DeviceStatus::Planned => "planned",
            DeviceStatus::Staged => "staged",
            DeviceStatus::Failed => "failed",
            DeviceStatus::Decommissioning => "decommissioning",
            DeviceStatus::Inventory => "inventory",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRecord {
    pub name: String,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default, alias = "device_role")]
    pub role: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub asset_tag: Option<String>,
    #[serde(default)]
    pub primary_ip4: Option<String>,
    #[serde(default)]
    pub primary_ip6: Option<String>,
    pub status: DeviceStatus,
    #[serde(default)]
    pub interfaces: Vec<InterfaceRecord>,
    #[serde(default, alias = "rack")]
    pub rack_id: Option<String>,
    /// Rack units taken by the device type
    #[serde(default)]
    pub u_height: Option<f64>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

impl DeviceRecord {
    pub fn has_primary_ip(&self) -> bool {
        non_empty(&self.primary_ip4).is_some() || non_empty(&self.primary_ip6).is_some()
    }

    /// Look up a field by its dashboard name. Empty strings count as missing.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(self.name.as_str()).filter(|s| !s.is_empty()),
            "site" => non_empty(&self.site),
            "role" | "device_role" => non_empty(&self.role),
            "device_type" => non_empty(&self.device_type),
            "platform" => non_empty(&self.platform),
            "serial" => non_empty(&self.serial),
            "asset_tag" => non_empty(&self.asset_tag),
            "primary_ip4" => non_empty(&self.primary_ip4),
            "primary_ip6" => non_empty(&self.primary_ip6),
            "status" => Some(self.status.as_str()),
            _ => None,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// One end of a cable: an interface on a device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CableTermination {
    pub device_id: String,
    pub interface: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CableRecord {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type", alias = "cableType")]
    pub cable_type: Option<String>,
    #[serde(default)]
    pub a_terminations: Vec<CableTermination>,
    #[serde(default)]
    pub b_terminations: Vec<CableTermination>,
}

impl CableRecord {
    /// Display label, `Cable #<id>` when unlabelled.
    pub fn display_label(&self) -> String {
        match non_empty(&self.label) {
            Some(label) => label.to_string(),
            None => format!("Cable #{}", self.id),
        }
    }

    pub fn has_type(&self) -> bool {
        non_empty(&self.cable_type).is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitRecord {
    pub id: String,
    pub cid: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl CircuitRecord {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RackRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub site: Option<String>,
    /// Height in rack units; racks without one contribute no space
    #[serde(default)]
    pub u_height: Option<u32>,
}

/// Offline export consumed by the `insights` binary: inventory plus the
/// utilization samples recorded for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardInput {
    #[serde(flatten)]
    pub inventory: Inventory,
    #[serde(default)]
    pub samples: Vec<Sample>,
    /// Evaluation instant; defaults to the current time
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

impl DashboardInput {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_plugin_settings() {
        let config = InsightsConfig::from_json_str("{}").expect("empty config");
        assert_eq!(config.trend_period_days, 90);
        assert_eq!(config.forecast_horizon_days, 180);
        assert_eq!(config.growth_rate_threshold, 5.0);
        assert_eq!(config.stale_data_days, 30);
        assert_eq!(config.projection_thresholds, vec![90.0, 100.0]);
        assert!(config.enable_caching);
        assert_eq!(config.cache_ttl, 300);
        assert_eq!(config.historical_period_days, 90);
        assert_eq!(config.capacity_warning_threshold, 80.0);
    }

    #[test]
    fn test_snake_case_aliases_accepted() {
        let config = InsightsConfig::from_json_str(
            r#"{"trend_period_days": 30, "growth_rate_threshold": 2.5, "stale_data_days": 7}"#,
        )
        .expect("snake case config");
        assert_eq!(config.trend_period_days, 30);
        assert_eq!(config.growth_rate_threshold, 2.5);
        assert_eq!(config.stale_data_days, 7);
    }

    #[test]
    fn test_zero_lookback_rejected() {
        let err = InsightsConfig::from_json_str(r#"{"trendPeriodDays": 0}"#).unwrap_err();
        assert!(matches!(err, EngineError::ConfigurationError(_)));
    }

    #[test]
    fn test_inverted_ipam_thresholds_rejected() {
        let err = InsightsConfig::from_json_str(
            r#"{"ipamWarningThreshold": 95, "ipamCriticalThreshold": 90}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("ipamWarningThreshold"));
    }

    #[test]
    fn test_cable_json_shape() {
        let cable: CableRecord = serde_json::from_str(
            r#"{"id": "7", "type": "cat6", "aTerminations": [{"deviceId": "d1", "interface": "eth0"}]}"#,
        )
        .expect("cable");
        assert!(cable.has_type());
        assert_eq!(cable.display_label(), "Cable #7");
        assert!(cable.b_terminations.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("insights.json");
        std::fs::write(&path, r#"{"forecastHorizonDays": 70}"#).unwrap();
        let config = InsightsConfig::load(&path).expect("load");
        assert_eq!(config.forecast_horizon_days, 70);
        assert!((config.forecast_horizon_weeks() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_dashboard_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(
            &path,
            r#"{
                "prefixes": [{"id": "p1", "prefix": "10.0.0.0/24", "totalIps": 254, "usedIps": 10}],
                "samples": [{"entityId": "p1", "timestamp": "2026-05-01T00:00:00Z", "value": 4.0}]
            }"#,
        )
        .unwrap();
        let input = DashboardInput::load(&path).expect("load snapshot");
        assert_eq!(input.inventory.prefixes.len(), 1);
        assert!(input.inventory.prefixes[0].is_active());
        assert!(input.inventory.devices.is_empty());
        assert_eq!(input.samples.len(), 1);
        assert!(input.generated_at.is_none());
    }

    #[test]
    fn test_missing_snapshot_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DashboardInput::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, EngineError::IoError(_)));
    }

    #[test]
    fn test_widget_overrides() {
        let config = InsightsConfig::from_json_str(
            r#"{"widgets": {"device-health": {"enabled": false, "refreshInterval": 42}}}"#,
        )
        .unwrap();
        assert!(!config.widget_enabled("device-health"));
        assert!(config.widget_enabled("ipam-utilization"));
        assert_eq!(config.widget_refresh_interval("device-health", 300), 42);
        assert_eq!(config.widget_refresh_interval("ipam-utilization", 60), 60);
    }

    #[test]
    fn test_device_field_lookup_treats_blank_as_missing() {
        let device = DeviceRecord {
            id: "d1".to_string(),
            name: "core-01".to_string(),
            site: Some("  ".to_string()),
            role: Some("router".to_string()),
            device_type: None,
            platform: None,
            serial: None,
            asset_tag: None,
            primary_ip4: None,
            primary_ip6: Some("2001:db8::1".to_string()),
            status: DeviceStatus::Active,
            interfaces: Vec::new(),
            rack_id: None,
            u_height: None,
            created: None,
            last_updated: Utc::now(),
        };
        assert_eq!(device.field("name"), Some("core-01"));
        assert_eq!(device.field("site"), None);
        assert_eq!(device.field("device_role"), Some("router"));
        assert_eq!(device.field("status"), Some("active"));
        assert_eq!(device.field("no_such_field"), None);
        assert!(device.has_primary_ip());
    }
}
