//! Dashboard widget registry.
//!
//! A static table of named snapshot producers. Rendering applies per-widget
//! config overrides and routes computation through the TTL cache.

pub mod capacity_planning;
pub mod data_quality;
pub mod device_health;
pub mod ipam;
pub mod predictive;
pub mod topology_status;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{cache_key, TtlCache};
use crate::error::{EngineError, EvaluationFailure};
use crate::predictive::alerts::fingerprint;
use crate::store::SampleStore;
use crate::types::{InsightsConfig, Inventory};

/// Everything a widget may read. Borrowed for one render pass.
pub struct WidgetContext<'a> {
    pub store: &'a dyn SampleStore,
    pub config: &'a InsightsConfig,
    pub inventory: &'a Inventory,
    pub now: DateTime<Utc>,
}

/// Function signature for a widget snapshot.
pub type SnapshotFn = fn(&WidgetContext) -> Result<serde_json::Value, EngineError>;

/// A registered widget.
pub struct WidgetEntry {
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Default refresh interval in seconds
    pub refresh_interval: u64,
    pub order: u32,
    pub snapshot: SnapshotFn,
}

pub static WIDGETS: &[WidgetEntry] = &[
    WidgetEntry {
        slug: "ipam-utilization",
        name: "IPAM Utilization",
        description: "Monitor IP address usage across your network",
        refresh_interval: 60,
        order: 1,
        snapshot: ipam::snapshot,
    },
    WidgetEntry {
        slug: "device-health",
        name: "Device Health Monitor",
        description: "Track device health and identify data quality issues",
        refresh_interval: 300,
        order: 2,
        snapshot: device_health::snapshot,
    },
    WidgetEntry {
        slug: "data-quality",
        name: "Data Quality & Compliance",
        description: "Monitor data completeness, accuracy, and compliance",
        refresh_interval: 600,
        order: 3,
        snapshot: data_quality::snapshot,
    },
    WidgetEntry {
        slug: "predictive-maintenance",
        name: "Predictive Maintenance",
        description: "Proactive alerts based on trend analysis and forecasting",
        refresh_interval: 600,
        order: 4,
        snapshot: predictive::snapshot,
    },
    WidgetEntry {
        slug: "capacity-planning",
        name: "Capacity Planning",
        description: "Track growth trends and forecast capacity requirements",
        refresh_interval: 900,
        order: 5,
        snapshot: capacity_planning::snapshot,
    },
    WidgetEntry {
        slug: "topology-status",
        name: "Network Topology Status",
        description: "Monitor network connectivity, cables, and topology health",
        refresh_interval: 300,
        order: 6,
        snapshot: topology_status::snapshot,
    },
];

/// All widgets in display order.
pub fn all_widgets() -> Vec<&'static WidgetEntry> {
    let mut widgets: Vec<&'static WidgetEntry> = WIDGETS.iter().collect();
    widgets.sort_by_key(|w| w.order);
    widgets
}

pub fn get_widget(slug: &str) -> Option<&'static WidgetEntry> {
    WIDGETS.iter().find(|w| w.slug == slug)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSnapshot {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub refresh_interval: u64,
    pub order: u32,
    pub enabled: bool,
    /// `null` when disabled or failed
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EvaluationFailure>,
}

/// Digest of the config and inventory a snapshot is computed from.
///
/// `now` is left out: a clock reading changes on every call and the TTL
/// already bounds how old a cached snapshot can get.
fn input_fingerprint(ctx: &WidgetContext) -> Result<String, EngineError> {
    // Value maps are ordered, so HashMap fields serialize stably.
    let config = serde_json::to_value(ctx.config)?.to_string();
    let inventory = serde_json::to_value(ctx.inventory)?.to_string();
    Ok(fingerprint(&[&config, &inventory]))
}

/// Render one widget. Disabled widgets return metadata with `null` data.
pub fn render_widget(
    entry: &WidgetEntry,
    ctx: &WidgetContext,
    cache: &TtlCache<serde_json::Value>,
) -> Result<WidgetSnapshot, EngineError> {
    let enabled = ctx.config.widget_enabled(entry.slug);
    let data = if enabled {
        let inputs = input_fingerprint(ctx)?;
        let key = cache_key(&format!("insights:{}", entry.slug), &[&inputs], &[]);
        let ttl = Duration::from_secs(ctx.config.cache_ttl);
        cache.get_or_try_insert_with(&key, ttl, || (entry.snapshot)(ctx))?
    } else {
        serde_json::Value::Null
    };

    Ok(WidgetSnapshot {
        slug: entry.slug.to_string(),
        name: entry.name.to_string(),
        description: entry.description.to_string(),
        refresh_interval: ctx.config.widget_refresh_interval(entry.slug, entry.refresh_interval),
        order: entry.order,
        enabled,
        data,
        error: None,
    })
}

pub fn render_by_slug(
    slug: &str,
    ctx: &WidgetContext,
    cache: &TtlCache<serde_json::Value>,
) -> Result<WidgetSnapshot, EngineError> {
    let entry = get_widget(slug).ok_or_else(|| EngineError::UnknownWidget(slug.to_string()))?;
    render_widget(entry, ctx, cache)
}

/// Render every widget. A failing widget carries its error instead of data,
/// so "could not check" is never shown as an empty panel.
pub fn render_dashboard(
    ctx: &WidgetContext,
    cache: &TtlCache<serde_json::Value>,
) -> Vec<WidgetSnapshot> {
    all_widgets()
        .into_iter()
        .map(|entry| match render_widget(entry, ctx, cache) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("widget {} failed: {}", entry.slug, e);
                WidgetSnapshot {
                    slug: entry.slug.to_string(),
                    name: entry.name.to_string(),
                    description: entry.description.to_string(),
                    refresh_interval: ctx
                        .config
                        .widget_refresh_interval(entry.slug, entry.refresh_interval),
                    order: entry.order,
                    enabled: true,
                    data: serde_json::Value::Null,
                    error: Some(EvaluationFailure::from(&e)),
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorType;
    use crate::store::{InMemorySampleStore, StoreError};
    use crate::types::{DeviceRecord, DeviceStatus, PrefixRecord, Sample};
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()
    }

    fn inventory() -> Inventory {
        Inventory {
            prefixes: vec![PrefixRecord {
                id: "p1".to_string(),
                prefix: "10.1.0.0/24".to_string(),
                site: Some("ams1".to_string()),
                vrf: None,
                role: None,
                status: "active".to_string(),
                total_ips: 254,
                used_ips: 216,
                description: None,
                created: None,
            }],
            ..Inventory::default()
        }
    }

    fn growing_store() -> InMemorySampleStore {
        InMemorySampleStore::from_samples(
            [(21, 70.0), (14, 75.0), (7, 80.0), (0, 85.0)]
                .iter()
                .map(|&(ago, v)| Sample::new("p1", now() - ChronoDuration::days(ago), v)),
        )
    }

    struct DownStore;
    impl SampleStore for DownStore {
        fn fetch_samples(
            &self,
            _entity_id: &str,
            _since: DateTime<Utc>,
        ) -> Result<Vec<Sample>, StoreError> {
            Err(StoreError::Unavailable("timeout".to_string()))
        }
    }

    #[test]
    fn test_registry_slugs_and_order() {
        let slugs: Vec<&str> = all_widgets().iter().map(|w| w.slug).collect();
        assert_eq!(
            slugs,
            vec![
                "ipam-utilization",
                "device-health",
                "data-quality",
                "predictive-maintenance",
                "capacity-planning",
                "topology-status"
            ]
        );
        assert!(get_widget("device-health").is_some());
        assert!(get_widget("nope").is_none());
    }

    #[test]
    fn test_predictive_widget_counts() {
        let store = growing_store();
        let config = InsightsConfig::default();
        let inv = inventory();
        let ctx = WidgetContext {
            store: &store,
            config: &config,
            inventory: &inv,
            now: now(),
        };
        let snap = predictive::build_snapshot(&ctx).unwrap();
        assert_eq!(snap.total_alerts, 1);
        assert_eq!(snap.high_priority_count, 1);
        assert_eq!(snap.alert_types.get("exhaustion"), Some(&1));
        assert_eq!(snap.high_priority_alerts[0].entity_label, "10.1.0.0/24");
    }

    #[test]
    fn test_render_uses_cache() {
        let store = growing_store();
        let config = InsightsConfig::default();
        let inv = inventory();
        let ctx = WidgetContext {
            store: &store,
            config: &config,
            inventory: &inv,
            now: now(),
        };
        let cache = TtlCache::new(true);
        let first = render_by_slug("predictive-maintenance", &ctx, &cache).unwrap();
        assert_eq!(cache.len(), 1);

        // A cached snapshot is served even if the store is now down
        let down_ctx = WidgetContext {
            store: &DownStore,
            ..ctx
        };
        let second = render_by_slug("predictive-maintenance", &down_ctx, &cache).unwrap();
        assert_eq!(first.data, second.data);
    }

    #[test]
    fn test_cache_entry_per_config() {
        let store = growing_store();
        let inv = inventory();
        let cache = TtlCache::new(true);

        let default_config = InsightsConfig::default();
        let ctx = WidgetContext {
            store: &store,
            config: &default_config,
            inventory: &inv,
            now: now(),
        };
        let first = render_by_slug("predictive-maintenance", &ctx, &cache).unwrap();
        assert_eq!(first.data["totalAlerts"], 1);

        let strict = InsightsConfig {
            growth_rate_threshold: 50.0,
            ..InsightsConfig::default()
        };
        let strict_ctx = WidgetContext {
            config: &strict,
            ..ctx
        };
        let second = render_by_slug("predictive-maintenance", &strict_ctx, &cache).unwrap();
        assert_eq!(cache.len(), 2, "each config gets its own entry");
        assert_eq!(second.data["totalAlerts"], 0, "stricter threshold must not reuse the default result");
    }

    #[test]
    fn test_cache_entry_per_inventory() {
        let store = InMemorySampleStore::new();
        let config = InsightsConfig::default();
        let cache = TtlCache::new(true);
        let inv = inventory();
        let ctx = WidgetContext {
            store: &store,
            config: &config,
            inventory: &inv,
            now: now(),
        };
        render_by_slug("ipam-utilization", &ctx, &cache).unwrap();

        let empty = Inventory::default();
        let empty_ctx = WidgetContext {
            inventory: &empty,
            ..ctx
        };
        let snap = render_by_slug("ipam-utilization", &empty_ctx, &cache).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(snap.data["summary"]["total"], 0);
    }

    #[test]
    fn test_stale_device_reaches_predictive_widget() {
        let store = InMemorySampleStore::new();
        let config = InsightsConfig::default();
        let inv = Inventory {
            devices: vec![DeviceRecord {
                id: "d1".to_string(),
                name: "edge-1".to_string(),
                site: Some("ams1".to_string()),
                role: None,
                device_type: None,
                platform: None,
                serial: None,
                asset_tag: None,
                primary_ip4: None,
                primary_ip6: None,
                status: DeviceStatus::Active,
                interfaces: Vec::new(),
                rack_id: None,
                u_height: None,
                created: None,
                last_updated: now() - ChronoDuration::days(60),
            }],
            ..Inventory::default()
        };
        let ctx = WidgetContext {
            store: &store,
            config: &config,
            inventory: &inv,
            now: now(),
        };
        let snap = predictive::build_snapshot(&ctx).unwrap();
        assert_eq!(snap.total_alerts, 1);
        assert_eq!(snap.alert_types.get("stale_device_data"), Some(&1));
    }

    #[test]
    fn test_topology_and_capacity_render() {
        let store = InMemorySampleStore::new();
        let config = InsightsConfig::default();
        let inv = Inventory::default();
        let ctx = WidgetContext {
            store: &store,
            config: &config,
            inventory: &inv,
            now: now(),
        };
        let cache = TtlCache::new(false);

        let topology = render_by_slug("topology-status", &ctx, &cache).unwrap();
        assert_eq!(topology.refresh_interval, 300);
        assert_eq!(topology.data["overallHealth"], 50.0);
        assert_eq!(topology.data["healthStatus"], "critical");

        let capacity = render_by_slug("capacity-planning", &ctx, &cache).unwrap();
        assert_eq!(capacity.data["capacityThreshold"], 80.0);
        assert_eq!(capacity.data["growthHistorical"]["periodDays"], 90);
        assert_eq!(capacity.data["forecast6Months"]["months"], 6);
    }

    #[test]
    fn test_disabled_widget_has_no_data() {
        let store = InMemorySampleStore::new();
        let config = InsightsConfig::from_json_str(
            r#"{"widgets": {"ipam-utilization": {"enabled": false, "refreshInterval": 5}}}"#,
        )
        .unwrap();
        let inv = inventory();
        let ctx = WidgetContext {
            store: &store,
            config: &config,
            inventory: &inv,
            now: now(),
        };
        let snap = render_by_slug("ipam-utilization", &ctx, &TtlCache::new(true)).unwrap();
        assert!(!snap.enabled);
        assert!(snap.data.is_null());
        assert_eq!(snap.refresh_interval, 5);
    }

    #[test]
    fn test_unknown_slug_errors() {
        let store = InMemorySampleStore::new();
        let config = InsightsConfig::default();
        let inv = Inventory::default();
        let ctx = WidgetContext {
            store: &store,
            config: &config,
            inventory: &inv,
            now: now(),
        };
        let err = render_by_slug("topology", &ctx, &TtlCache::new(false)).unwrap_err();
        assert!(matches!(err, EngineError::UnknownWidget(_)));
    }

    #[test]
    fn test_dashboard_reports_outage_instead_of_empty() {
        let config = InsightsConfig::default();
        let inv = inventory();
        let ctx = WidgetContext {
            store: &DownStore,
            config: &config,
            inventory: &inv,
            now: now(),
        };
        let cache = TtlCache::new(true);
        let snapshots = render_dashboard(&ctx, &cache);
        assert_eq!(snapshots.len(), 6);

        let predictive = snapshots
            .iter()
            .find(|s| s.slug == "predictive-maintenance")
            .unwrap();
        assert!(predictive.data.is_null());
        let error = predictive.error.as_ref().expect("error surfaced");
        assert_eq!(error.error_type, ErrorType::Fatal);

        let ipam = snapshots.iter().find(|s| s.slug == "ipam-utilization").unwrap();
        assert!(ipam.error.is_none());
        assert_eq!(ipam.data["summary"]["warning"], 1);
        assert_eq!(cache.len(), 5, "failed widget must not be cached");
    }
}
