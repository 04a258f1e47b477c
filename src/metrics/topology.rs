//! Connectivity health: cable validity, interface usage, inter-site links
//! and circuits.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::types::{CableRecord, CableTermination, CircuitRecord, DeviceRecord};
use crate::util;

const HEALTHY_PERCENT: f64 = 90.0;
const WARNING_PERCENT: f64 = 70.0;
const TOP_PROVIDERS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TopologyStatus {
    Healthy,
    Warning,
    Critical,
}

impl TopologyStatus {
    pub fn from_percent(overall: f64) -> Self {
        if overall >= HEALTHY_PERCENT {
            TopologyStatus::Healthy
        } else if overall >= WARNING_PERCENT {
            TopologyStatus::Warning
        } else {
            TopologyStatus::Critical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CableIssue {
    pub cable_id: String,
    pub label: String,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CableHealth {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub invalid_cables: Vec<CableIssue>,
    /// 1 decimal; 100 with no cables
    pub health_percentage: f64,
}

/// A cable is valid with both ends terminated and a cable type set.
pub fn cable_health(cables: &[CableRecord]) -> CableHealth {
    let mut invalid_cables = Vec::new();

    for cable in cables {
        let mut issues = Vec::new();
        if cable.a_terminations.is_empty() {
            issues.push("Missing A-side".to_string());
        }
        if cable.b_terminations.is_empty() {
            issues.push("Missing B-side".to_string());
        }
        if !cable.has_type() {
            issues.push("No cable type".to_string());
        }
        if !issues.is_empty() {
            invalid_cables.push(CableIssue {
                cable_id: cable.id.clone(),
                label: cable.display_label(),
                issues,
            });
        }
    }

    let total = cables.len();
    let valid = total - invalid_cables.len();
    let health_percentage = if total > 0 {
        util::round_to(util::percent(valid as f64, total as f64), 1)
    } else {
        100.0
    };

    CableHealth {
        total,
        valid,
        invalid: invalid_cables.len(),
        invalid_cables,
        health_percentage,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceStatus {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub connected: usize,
    pub disconnected: usize,
    /// Percent of interfaces with a cable attached, 1 decimal
    pub utilization: f64,
}

fn terminations(cables: &[CableRecord]) -> impl Iterator<Item = &CableTermination> {
    cables
        .iter()
        .flat_map(|c| c.a_terminations.iter().chain(c.b_terminations.iter()))
}

pub fn interface_status(devices: &[DeviceRecord], cables: &[CableRecord]) -> InterfaceStatus {
    let cabled: HashSet<(&str, &str)> = terminations(cables)
        .map(|t| (t.device_id.as_str(), t.interface.as_str()))
        .collect();

    let mut status = InterfaceStatus {
        total: 0,
        enabled: 0,
        disabled: 0,
        connected: 0,
        disconnected: 0,
        utilization: 0.0,
    };
    for device in devices {
        for iface in &device.interfaces {
            status.total += 1;
            if iface.enabled {
                status.enabled += 1;
            } else {
                status.disabled += 1;
            }
            if cabled.contains(&(device.id.as_str(), iface.name.as_str())) {
                status.connected += 1;
            }
        }
    }
    status.disconnected = status.total - status.connected;
    status.utilization = util::round_to(
        util::percent(status.connected as f64, status.total as f64),
        1,
    );
    status
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConnectivity {
    pub site: String,
    pub total_interfaces: usize,
    pub inter_site_links: usize,
    pub connected_to_sites: Vec<String>,
    pub connection_count: usize,
}

#[derive(Default)]
struct SiteLinks<'a> {
    total_interfaces: usize,
    links: usize,
    peers: BTreeSet<&'a str>,
}

/// Links from each site to other sites, most links first.
///
/// Every (local end, far end) pair of a cable whose ends sit at different
/// sites counts once for each site. Sites with neither interfaces nor
/// inter-site links are omitted. Devices without a site are ignored.
pub fn site_connectivity(devices: &[DeviceRecord], cables: &[CableRecord]) -> Vec<SiteConnectivity> {
    let device_site: HashMap<&str, &str> = devices
        .iter()
        .filter_map(|d| d.field("site").map(|s| (d.id.as_str(), s)))
        .collect();

    // First-appearance order keeps ties stable.
    let mut order: Vec<&str> = Vec::new();
    let mut sites: HashMap<&str, SiteLinks> = HashMap::new();
    for device in devices {
        if let Some(site) = device.field("site") {
            let entry = sites.entry(site).or_insert_with(|| {
                order.push(site);
                SiteLinks::default()
            });
            entry.total_interfaces += device.interfaces.len();
        }
    }

    let site_of = |t: &CableTermination| device_site.get(t.device_id.as_str()).copied();
    for cable in cables {
        for a in cable.a_terminations.iter().filter_map(site_of) {
            for b in cable.b_terminations.iter().filter_map(site_of) {
                if a == b {
                    continue;
                }
                for (local, far) in [(a, b), (b, a)] {
                    if let Some(entry) = sites.get_mut(local) {
                        entry.links += 1;
                        entry.peers.insert(far);
                    }
                }
            }
        }
    }

    let mut rows: Vec<SiteConnectivity> = order
        .into_iter()
        .filter_map(|site| {
            let links = sites.remove(site)?;
            if links.total_interfaces == 0 && links.links == 0 {
                return None;
            }
            Some(SiteConnectivity {
                site: site.to_string(),
                total_interfaces: links.total_interfaces,
                inter_site_links: links.links,
                connection_count: links.peers.len(),
                connected_to_sites: links.peers.into_iter().map(str::to_string).collect(),
            })
        })
        .collect();
    rows.sort_by(|a, b| b.inter_site_links.cmp(&a.inter_site_links));
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitSummary {
    pub total: usize,
    pub active: usize,
    pub top_providers: Vec<ProviderCount>,
}

pub fn circuit_summary(circuits: &[CircuitRecord]) -> CircuitSummary {
    let mut by_provider: HashMap<&str, usize> = HashMap::new();
    for circuit in circuits {
        let name = circuit
            .provider
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or("Unknown");
        *by_provider.entry(name).or_insert(0) += 1;
    }

    let mut top_providers: Vec<ProviderCount> = by_provider
        .into_iter()
        .map(|(name, count)| ProviderCount {
            name: name.to_string(),
            count,
        })
        .collect();
    top_providers.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    top_providers.truncate(TOP_PROVIDERS);

    CircuitSummary {
        total: circuits.len(),
        active: circuits.iter().filter(|c| c.is_active()).count(),
        top_providers,
    }
}

/// Mean of cable health and interface utilization.
pub fn overall_health(cables: &CableHealth, interfaces: &InterfaceStatus) -> f64 {
    (cables.health_percentage + interfaces.utilization) / 2.0
}
