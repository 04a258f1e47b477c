//! Network topology status widget.

use serde::Serialize;

use crate::error::EngineError;
use crate::metrics::topology::{
    cable_health, circuit_summary, interface_status, overall_health, site_connectivity,
    CableHealth, CircuitSummary, InterfaceStatus, SiteConnectivity, TopologyStatus,
};
use crate::util;

use super::WidgetContext;

const INVALID_CABLES: usize = 10;
const TOP_SITES: usize = 15;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TopologySnapshot {
    overall_health: f64,
    health_status: TopologyStatus,
    cable_health: CableHealth,
    interface_status: InterfaceStatus,
    site_connectivity: Vec<SiteConnectivity>,
    circuit_summary: CircuitSummary,
}

pub fn snapshot(ctx: &WidgetContext) -> Result<serde_json::Value, EngineError> {
    let inventory = ctx.inventory;
    let mut cables = cable_health(&inventory.cables);
    let interfaces = interface_status(&inventory.devices, &inventory.cables);
    let overall = overall_health(&cables, &interfaces);
    cables.invalid_cables.truncate(INVALID_CABLES);

    let mut sites = site_connectivity(&inventory.devices, &inventory.cables);
    sites.truncate(TOP_SITES);

    let snapshot = TopologySnapshot {
        overall_health: util::round_to(overall, 1),
        health_status: TopologyStatus::from_percent(overall),
        cable_health: cables,
        interface_status: interfaces,
        site_connectivity: sites,
        circuit_summary: circuit_summary(&inventory.circuits),
    };
    Ok(serde_json::to_value(snapshot)?)
}
