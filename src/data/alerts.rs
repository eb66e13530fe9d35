//! Threshold rules turning entities into alerts.
//!
//! Evaluation is stateless: every rule is checked for every entity on every
//! cycle and all rules that fire are emitted.

use netwatch_types::{Alert, AlertKind, DeviceDetails, Entity, EntityDetails, InterfaceDetails, Severity};

use super::uptime::parse_uptime;
use crate::config::Thresholds;

/// Evaluate all rules against a set of entities.
pub fn evaluate<'a, I>(entities: I, thresholds: &Thresholds, now_ms: u64) -> Vec<Alert>
where
    I: IntoIterator<Item = &'a Entity>,
{
    let mut alerts = Vec::new();
    for entity in entities {
        match &entity.details {
            EntityDetails::Device(device) => check_device(entity, device, thresholds, now_ms, &mut alerts),
            EntityDetails::Interface(iface) => check_interface(entity, iface, thresholds, now_ms, &mut alerts),
        }
    }
    alerts
}

fn check_device(
    entity: &Entity,
    device: &DeviceDetails,
    thresholds: &Thresholds,
    now_ms: u64,
    alerts: &mut Vec<Alert>,
) {
    let raise = |kind, severity, message: String| Alert::new(kind, severity, message, now_ms).for_entity(&entity.id);

    if entity.has_reachability_state() && !entity.is_operational() {
        alerts.push(raise(
            AlertKind::DeviceUnreachable,
            Severity::Critical,
            format!("Device {} is {}", entity.name, entity.status.as_str()),
        ));
    }

    // A missing value is reported too: only the healthy value passes
    if !device.support_level.trim().eq_ignore_ascii_case("supported") {
        alerts.push(raise(
            AlertKind::Unsupported,
            Severity::Warning,
            format!("Device {} has support level '{}'", entity.name, device.support_level),
        ));
    }

    if !device.collection_status.trim().eq_ignore_ascii_case("managed") {
        alerts.push(raise(
            AlertKind::CollectionIssue,
            Severity::Warning,
            format!("Device {} collection status is '{}'", entity.name, device.collection_status),
        ));
    }

    // Unparseable uptime is not an error, the rule just does not apply
    if let Ok(uptime) = parse_uptime(&device.uptime) {
        if uptime.as_secs_f64() < thresholds.min_uptime_secs as f64 {
            alerts.push(raise(
                AlertKind::RecentReboot,
                Severity::Warning,
                format!("Device {} rebooted recently (uptime {})", entity.name, device.uptime),
            ));
        }
    }
}

fn check_interface(
    entity: &Entity,
    iface: &InterfaceDetails,
    thresholds: &Thresholds,
    now_ms: u64,
    alerts: &mut Vec<Alert>,
) {
    let raise = |kind, severity, message: String| Alert::new(kind, severity, message, now_ms).for_entity(&entity.id);

    if entity.has_reachability_state() && !entity.is_operational() {
        let reason = if !iface.enabled {
            "disabled".to_string()
        } else {
            format!("operationally {}", entity.status.as_str())
        };
        alerts.push(raise(
            AlertKind::InterfaceDown,
            Severity::Critical,
            format!("Interface {} is {}", entity.name, reason),
        ));
    }

    if iface.ipv4.is_none() && iface.ipv6.is_none() {
        alerts.push(raise(
            AlertKind::NoIpAssigned,
            Severity::Warning,
            format!("Interface {} has no IP address assigned", entity.name),
        ));
    }

    if let Some(pct) = iface.bandwidth_pct {
        if pct >= thresholds.bandwidth_pct {
            alerts.push(raise(
                AlertKind::HighBandwidth,
                Severity::Warning,
                format!("Interface {} bandwidth at {:.1}%", entity.name, pct),
            ));
        }
    }

    if let Some(delta) = iface.error_delta {
        if delta >= thresholds.error_count {
            alerts.push(raise(
                AlertKind::HighErrorRate,
                Severity::Warning,
                format!("Interface {} recorded {} errors since the last poll", entity.name, delta),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RawRecord;
    use netwatch_types::{IpAssignment, OperStatus};

    fn healthy_interface(name: &str) -> Entity {
        Entity::interface(
            name,
            OperStatus::Up,
            InterfaceDetails {
                enabled: true,
                ipv4: Some(IpAssignment {
                    address: "192.0.2.1".to_string(),
                    netmask: "255.255.255.0".to_string(),
                }),
                ..Default::default()
            },
        )
    }

    fn device_with_uptime(uptime: &str) -> Entity {
        Entity::device(
            "d1",
            OperStatus::Reachable,
            DeviceDetails {
                uptime: uptime.to_string(),
                support_level: "Supported".to_string(),
                collection_status: "Managed".to_string(),
                ..Default::default()
            },
        )
    }

    fn kinds(alerts: &[Alert]) -> Vec<AlertKind> {
        alerts.iter().map(|a| a.kind).collect()
    }

    #[test]
    fn healthy_entities_raise_nothing() {
        let entities = vec![healthy_interface("Gi0/0"), device_with_uptime("100:00:00")];
        assert!(evaluate(&entities, &Thresholds::default(), 0).is_empty());
    }

    #[test]
    fn down_with_errors_raises_both() {
        let mut e = healthy_interface("Gi0/1");
        e.status = OperStatus::Down;
        e.as_interface_mut().unwrap().error_delta = Some(6);

        let alerts = evaluate([&e], &Thresholds::default(), 42);
        assert_eq!(kinds(&alerts), vec![AlertKind::InterfaceDown, AlertKind::HighErrorRate]);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[1].severity, Severity::Warning);
        assert!(alerts.iter().all(|a| a.entity_id.as_deref() == Some("Gi0/1")));
        assert!(alerts.iter().all(|a| a.timestamp_ms == 42));
    }

    #[test]
    fn error_threshold_is_inclusive() {
        let mut e = healthy_interface("Gi0/1");
        e.as_interface_mut().unwrap().error_delta = Some(5);
        assert_eq!(kinds(&evaluate([&e], &Thresholds::default(), 0)), vec![AlertKind::HighErrorRate]);

        e.as_interface_mut().unwrap().error_delta = Some(4);
        assert!(evaluate([&e], &Thresholds::default(), 0).is_empty());
    }

    #[test]
    fn disabled_interface_is_down() {
        let mut e = healthy_interface("Gi0/2");
        e.as_interface_mut().unwrap().enabled = false;
        let alerts = evaluate([&e], &Thresholds::default(), 0);
        assert_eq!(kinds(&alerts), vec![AlertKind::InterfaceDown]);
        assert!(alerts[0].message.contains("disabled"));
    }

    #[test]
    fn bandwidth_threshold() {
        let mut e = healthy_interface("Gi0/3");
        e.as_interface_mut().unwrap().bandwidth_pct = Some(70.0);
        assert_eq!(kinds(&evaluate([&e], &Thresholds::default(), 0)), vec![AlertKind::HighBandwidth]);

        e.as_interface_mut().unwrap().bandwidth_pct = Some(69.9);
        assert!(evaluate([&e], &Thresholds::default(), 0).is_empty());
    }

    #[test]
    fn missing_addresses() {
        let mut e = healthy_interface("Gi0/4");
        e.as_interface_mut().unwrap().ipv4 = None;
        assert_eq!(kinds(&evaluate([&e], &Thresholds::default(), 0)), vec![AlertKind::NoIpAssigned]);
    }

    #[test]
    fn recent_reboot_rules() {
        let thresholds = Thresholds::default();

        let alerts = evaluate([&device_with_uptime("0:02:00")], &thresholds, 0);
        assert_eq!(kinds(&alerts), vec![AlertKind::RecentReboot]);

        assert!(evaluate([&device_with_uptime("01:00:00")], &thresholds, 0).is_empty());
        assert!(evaluate([&device_with_uptime("N/A")], &thresholds, 0).is_empty());
    }

    #[test]
    fn device_status_rules() {
        let mut dev = device_with_uptime("10:00:00");
        dev.status = OperStatus::Unreachable;
        if let EntityDetails::Device(d) = &mut dev.details {
            d.support_level = "Unsupported".to_string();
            d.collection_status = "Partial Collection Failure".to_string();
        }

        let alerts = evaluate([&dev], &Thresholds::default(), 0);
        assert_eq!(
            kinds(&alerts),
            vec![AlertKind::DeviceUnreachable, AlertKind::Unsupported, AlertKind::CollectionIssue]
        );
    }

    #[test]
    fn absent_device_attributes_raise_warnings() {
        let dev = Entity::device("d2", OperStatus::Reachable, DeviceDetails::default());
        let alerts = evaluate([&dev], &Thresholds::default(), 0);
        assert_eq!(kinds(&alerts), vec![AlertKind::Unsupported, AlertKind::CollectionIssue]);
        assert!(alerts.iter().all(|a| a.severity == Severity::Warning));
    }

    #[test]
    fn normalized_device_missing_inventory_fields() {
        let record = RawRecord::device(serde_json::json!({
            "id": "d1",
            "reachabilityStatus": "Reachable",
            "upTime": "10:00:00"
        }));
        let dev = crate::data::normalize(&record, 0).unwrap();

        let alerts = evaluate([&dev], &Thresholds::default(), 0);
        assert_eq!(kinds(&alerts), vec![AlertKind::Unsupported, AlertKind::CollectionIssue]);
    }

    #[test]
    fn status_comparison_ignores_case() {
        let mut dev = device_with_uptime("10:00:00");
        if let EntityDetails::Device(d) = &mut dev.details {
            d.support_level = "SUPPORTED".to_string();
            d.collection_status = "managed".to_string();
        }
        assert!(evaluate([&dev], &Thresholds::default(), 0).is_empty());
    }
}
