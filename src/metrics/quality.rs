//! Data quality scoring: completeness, naming conventions, duplicates.

use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use serde::Serialize;

use crate::types::{DeviceRecord, DeviceStatus};
use crate::util;

/// Naming convention key checked against device names.
pub const DEVICE_NAME_PATTERN: &str = "device_name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityStatus {
    Healthy,
    Warning,
    Critical,
}

impl QualityStatus {
    pub fn from_score(score: f64, min_quality_score: f64) -> Self {
        if score >= min_quality_score {
            QualityStatus::Healthy
        } else if score >= 60.0 {
            QualityStatus::Warning
        } else {
            QualityStatus::Critical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRef {
    pub device_id: String,
    pub device: String,
}

impl From<&DeviceRecord> for DeviceRef {
    fn from(d: &DeviceRecord) -> Self {
        Self {
            device_id: d.id.clone(),
            device: d.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingFields {
    #[serde(flatten)]
    pub device: DeviceRef,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamingViolation {
    #[serde(flatten)]
    pub device: DeviceRef,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Duplicate {
    pub value: String,
    pub count: usize,
    pub devices: Vec<DeviceRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityIssues {
    pub missing_fields: Vec<MissingFields>,
    pub naming_violations: Vec<NamingViolation>,
    pub duplicate_serials: Vec<Duplicate>,
    pub duplicate_macs: Vec<Duplicate>,
    pub missing_primary_ip: Vec<DeviceRef>,
    pub no_interfaces: Vec<DeviceRef>,
}

impl QualityIssues {
    pub fn total(&self) -> usize {
        self.missing_fields.len()
            + self.naming_violations.len()
            + self.duplicate_serials.len()
            + self.duplicate_macs.len()
            + self.missing_primary_ip.len()
            + self.no_interfaces.len()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    /// Percent of compliant devices, 1 decimal; 100 with no devices
    pub score: f64,
    pub total_devices: usize,
    pub compliant_devices: usize,
    pub non_compliant_devices: usize,
    pub total_issues: usize,
    pub issues: QualityIssues,
}

/// Missing required fields for one device, in `required_fields` order.
pub fn missing_fields(device: &DeviceRecord, required_fields: &[String]) -> Vec<String> {
    required_fields
        .iter()
        .filter(|f| device.field(f).is_none())
        .cloned()
        .collect()
}

/// Anchored-at-start match. An invalid pattern never fails a name.
pub fn matches_naming_convention(name: &str, pattern: &str) -> bool {
    match Regex::new(pattern) {
        Ok(re) => re.find(name).is_some_and(|m| m.start() == 0),
        Err(e) => {
            log::warn!("quality: ignoring invalid naming pattern {:?}: {}", pattern, e);
            true
        }
    }
}

/// Score every device against the configured rules.
pub fn quality_report(
    devices: &[DeviceRecord],
    required_fields: &[String],
    naming_conventions: &HashMap<String, String>,
) -> QualityReport {
    let mut issues = QualityIssues::default();
    let mut compliant_devices = 0;

    let name_pattern = naming_conventions.get(DEVICE_NAME_PATTERN);
    let name_regex = name_pattern.and_then(|p| match Regex::new(p) {
        Ok(re) => Some(re),
        Err(e) => {
            log::warn!("quality: ignoring invalid naming pattern {:?}: {}", p, e);
            None
        }
    });

    for device in devices {
        let mut compliant = true;

        let missing = missing_fields(device, required_fields);
        if !missing.is_empty() {
            compliant = false;
            issues.missing_fields.push(MissingFields {
                device: device.into(),
                missing,
            });
        }

        if let (Some(re), Some(pattern)) = (&name_regex, name_pattern) {
            let ok = re.find(&device.name).is_some_and(|m| m.start() == 0);
            if !ok {
                compliant = false;
                issues.naming_violations.push(NamingViolation {
                    device: device.into(),
                    pattern: pattern.clone(),
                });
            }
        }

        if !device.has_primary_ip() {
            compliant = false;
            issues.missing_primary_ip.push(device.into());
        }

        if device.interfaces.is_empty() {
            compliant = false;
            issues.no_interfaces.push(device.into());
        }

        if compliant {
            compliant_devices += 1;
        }
    }

    issues.duplicate_serials = duplicates(devices.iter().filter_map(|d| {
        d.field("serial").map(|s| (s.to_string(), DeviceRef::from(d)))
    }));
    issues.duplicate_macs = duplicates(devices.iter().flat_map(|d| {
        d.interfaces.iter().filter_map(move |i| {
            i.mac_address
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .map(|m| (m.to_ascii_lowercase(), DeviceRef::from(d)))
        })
    }));

    let total_devices = devices.len();
    let score = if total_devices > 0 {
        util::round_to(util::percent(compliant_devices as f64, total_devices as f64), 1)
    } else {
        100.0
    };

    QualityReport {
        score,
        total_devices,
        compliant_devices,
        non_compliant_devices: total_devices - compliant_devices,
        total_issues: issues.total(),
        issues,
    }
}

/// Group `(value, device)` pairs and keep values seen more than once.
fn duplicates(pairs: impl Iterator<Item = (String, DeviceRef)>) -> Vec<Duplicate> {
    let mut groups: BTreeMap<String, Vec<DeviceRef>> = BTreeMap::new();
    for (value, device) in pairs {
        groups.entry(value).or_default().push(device);
    }
    groups
        .into_iter()
        .filter(|(_, devices)| devices.len() > 1)
        .map(|(value, devices)| Duplicate {
            value,
            count: devices.len(),
            devices,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub priority: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub action: String,
}

/// Actionable fixes, highest impact first.
pub fn recommendations(devices: &[DeviceRecord]) -> Vec<Recommendation> {
    let active = || devices.iter().filter(|d| d.status == DeviceStatus::Active);
    let mut recs = Vec::new();

    let no_ip = active().filter(|d| !d.has_primary_ip()).count();
    if no_ip > 0 {
        recs.push(Recommendation {
            priority: "high".to_string(),
            category: "completeness".to_string(),
            title: format!("{} active devices missing primary IP", no_ip),
            description: "Primary IPs are essential for device management and monitoring"
                .to_string(),
            action: "Assign primary IPs to active devices".to_string(),
        });
    }

    let no_interfaces = active().filter(|d| d.interfaces.is_empty()).count();
    if no_interfaces > 0 {
        recs.push(Recommendation {
            priority: "medium".to_string(),
            category: "completeness".to_string(),
            title: format!("{} devices have no interfaces", no_interfaces),
            description: "Devices should have at least one interface documented".to_string(),
            action: "Add interface information to these devices".to_string(),
        });
    }

    let dup_serials = duplicates(devices.iter().filter_map(|d| {
        d.field("serial").map(|s| (s.to_string(), DeviceRef::from(d)))
    }))
    .len();
    if dup_serials > 0 {
        recs.push(Recommendation {
            priority: "high".to_string(),
            category: "accuracy".to_string(),
            title: format!("{} duplicate serial numbers found", dup_serials),
            description: "Serial numbers must be unique for inventory tracking".to_string(),
            action: "Review and correct duplicate serial numbers".to_string(),
        });
    }

    // Stable: high before medium, insertion order otherwise
    recs.sort_by_key(|r| if r.priority == "high" { 0 } else { 1 });
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InterfaceRecord;
    use chrono::Utc;

    fn device(id: &str, name: &str) -> DeviceRecord {
        DeviceRecord {
            id: id.to_string(),
            name: name.to_string(),
            site: Some("ams1".to_string()),
            role: Some("leaf".to_string()),
            device_type: None,
            platform: None,
            serial: Some(format!("SN-{}", id)),
            asset_tag: None,
            primary_ip4: Some("192.0.2.10/32".to_string()),
            primary_ip6: None,
            status: DeviceStatus::Active,
            interfaces: vec![InterfaceRecord {
                name: "eth0".to_string(),
                mac_address: Some(format!("00:00:5e:00:53:0{}", id)),
                enabled: true,
            }],
            rack_id: None,
            u_height: None,
            created: None,
            last_updated: Utc::now(),
        }
    }

    fn required() -> Vec<String> {
        vec!["name".to_string(), "site".to_string(), "status".to_string()]
    }

    #[test]
    fn test_all_compliant() {
        let report = quality_report(
            &[device("1", "leaf-1"), device("2", "leaf-2")],
            &required(),
            &HashMap::new(),
        );
        assert_eq!(report.score, 100.0);
        assert_eq!(report.compliant_devices, 2);
        assert_eq!(report.total_issues, 0);
    }

    #[test]
    fn test_no_devices_scores_full() {
        let report = quality_report(&[], &required(), &HashMap::new());
        assert_eq!(report.score, 100.0);
        assert_eq!(report.total_devices, 0);
    }

    #[test]
    fn test_missing_field_and_primary_ip() {
        let mut d = device("2", "leaf-2");
        d.site = None;
        d.primary_ip4 = None;
        let report = quality_report(&[device("1", "leaf-1"), d], &required(), &HashMap::new());
        assert_eq!(report.score, 50.0);
        assert_eq!(report.issues.missing_fields[0].missing, vec!["site".to_string()]);
        assert_eq!(report.issues.missing_primary_ip.len(), 1);
        assert_eq!(report.total_issues, 2);
    }

    #[test]
    fn test_naming_convention_violation() {
        let conventions = HashMap::from([(
            DEVICE_NAME_PATTERN.to_string(),
            r"[a-z]+-\d+".to_string(),
        )]);
        let report = quality_report(
            &[device("1", "leaf-1"), device("2", "Leaf_Two")],
            &required(),
            &conventions,
        );
        assert_eq!(report.issues.naming_violations.len(), 1);
        assert_eq!(report.issues.naming_violations[0].device.device, "Leaf_Two");
    }

    #[test]
    fn test_invalid_pattern_is_ignored() {
        assert!(matches_naming_convention("anything", "(["));
        let conventions = HashMap::from([(DEVICE_NAME_PATTERN.to_string(), "([".to_string())]);
        let report = quality_report(&[device("1", "x")], &required(), &conventions);
        assert!(report.issues.naming_violations.is_empty());
    }

    #[test]
    fn test_match_is_anchored_at_start() {
        assert!(matches_naming_convention("leaf-1", r"leaf"));
        assert!(!matches_naming_convention("old-leaf-1", r"leaf"));
    }

    #[test]
    fn test_duplicate_serials_and_macs() {
        let a = device("1", "leaf-1");
        let mut b = device("2", "leaf-2");
        b.serial = a.serial.clone();
        b.interfaces[0].mac_address = a.interfaces[0]
            .mac_address
            .as_ref()
            .map(|m| m.to_uppercase());

        let report = quality_report(&[a, b], &required(), &HashMap::new());
        assert_eq!(report.issues.duplicate_serials.len(), 1);
        assert_eq!(report.issues.duplicate_serials[0].count, 2);
        assert_eq!(report.issues.duplicate_macs.len(), 1);
    }

    #[test]
    fn test_recommendations_ordered_by_priority() {
        let mut no_if = device("1", "leaf-1");
        no_if.interfaces.clear();
        let mut no_ip = device("2", "leaf-2");
        no_ip.primary_ip4 = None;
        no_ip.serial = no_if.serial.clone();

        let recs = recommendations(&[no_if, no_ip]);
        let priorities: Vec<&str> = recs.iter().map(|r| r.priority.as_str()).collect();
        assert_eq!(priorities, vec!["high", "high", "medium"]);
        assert!(recs[0].title.contains("primary IP"));
        assert!(recs[1].title.contains("duplicate serial"));
    }

    #[test]
    fn test_status_bands() {
        assert_eq!(QualityStatus::from_score(85.0, 80.0), QualityStatus::Healthy);
        assert_eq!(QualityStatus::from_score(65.0, 80.0), QualityStatus::Warning);
        assert_eq!(QualityStatus::from_score(10.0, 80.0), QualityStatus::Critical);
    }
}
