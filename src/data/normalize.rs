//! Conversion of raw transport records into canonical entities.
//!
//! Field names follow the transports: DNA Center inventory (camelCase) for
//! devices and RESTCONF `ietf-interfaces` (hyphenated) for interfaces.
//! Missing fields become defaults and numbers given as strings are coerced,
//! so the only failure is a record that cannot be identified.

use netwatch_types::{
    DeviceDetails, Entity, EntityKind, InterfaceCounters, InterfaceDetails, IpAssignment, OperStatus,
};
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::source::RawRecord;

type Object = Map<String, Value>;

/// Normalize one raw record.
pub fn normalize(record: &RawRecord, now_ms: u64) -> Result<Entity, ParseError> {
    let obj = record.fields.as_object().ok_or(ParseError::NotAnObject)?;
    let mut entity = match record.kind {
        EntityKind::Device => normalize_device(obj)?,
        EntityKind::Interface => normalize_interface(obj)?,
    };
    entity.last_updated_ms = now_ms;
    Ok(entity)
}

/// Normalize a batch, dropping records that fail.
///
/// Returns the entities and the number of rejected records.
pub fn normalize_all(records: &[RawRecord], now_ms: u64) -> (Vec<Entity>, usize) {
    let mut entities = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for record in records {
        match normalize(record, now_ms) {
            Ok(entity) => entities.push(entity),
            Err(e) => {
                tracing::debug!(error = %e, "skipping record");
                skipped += 1;
            }
        }
    }

    (entities, skipped)
}

fn normalize_device(obj: &Object) -> Result<Entity, ParseError> {
    let id = non_empty(obj, "instanceUuid")
        .or_else(|| non_empty(obj, "id"))
        .ok_or(ParseError::MissingIdentifier {
            kind: "device",
            fields: "instanceUuid, id",
        })?;

    let details = DeviceDetails {
        management_ip: string(obj, "managementIpAddress"),
        mac_address: string(obj, "macAddress"),
        software_version: string(obj, "softwareVersion"),
        uptime: string(obj, "upTime"),
        serial_number: string(obj, "serialNumber"),
        platform_id: string(obj, "platformId"),
        interface_count: u64_or_zero(obj.get("interfaceCount")).min(u32::MAX as u64) as u32,
        support_level: string(obj, "deviceSupportLevel"),
        collection_status: string(obj, "collectionStatus"),
        role: string(obj, "role"),
        vendor: string(obj, "vendor"),
        family: string(obj, "family"),
        series: string(obj, "series"),
        description: string(obj, "description"),
        boot_time: string(obj, "bootDateTime"),
    };

    let status = OperStatus::parse(&string(obj, "reachabilityStatus"));
    let mut entity = Entity::device(id, status, details);
    if let Some(hostname) = non_empty(obj, "hostname") {
        entity.name = hostname;
    }
    Ok(entity)
}

fn normalize_interface(obj: &Object) -> Result<Entity, ParseError> {
    let name = non_empty(obj, "name").ok_or(ParseError::MissingIdentifier {
        kind: "interface",
        fields: "name",
    })?;

    let details = InterfaceDetails {
        description: string(obj, "description"),
        enabled: boolean(obj.get("enabled")),
        ipv4: first_address(obj, "ietf-ip:ipv4", "netmask"),
        ipv6: first_address(obj, "ietf-ip:ipv6", "prefix-length"),
        speed_mbps: obj.get("speed").and_then(coerce_u64),
        counters: obj.get("statistics").and_then(Value::as_object).map(counters),
        bandwidth_pct: obj.get("bandwidth-pct").and_then(coerce_f64),
        error_delta: None,
    };

    let status = OperStatus::parse(&string(obj, "oper-status"));
    Ok(Entity::interface(name, status, details))
}

fn counters(stats: &Object) -> InterfaceCounters {
    InterfaceCounters {
        in_octets: u64_or_zero(stats.get("in-octets")),
        out_octets: u64_or_zero(stats.get("out-octets")),
        in_errors: u64_or_zero(stats.get("in-errors")),
        out_errors: u64_or_zero(stats.get("out-errors")),
    }
}

/// First entry of `{family}.address[]` that carries an `ip`.
fn first_address(obj: &Object, family: &str, mask_key: &str) -> Option<IpAssignment> {
    let first = obj.get(family)?.get("address")?.as_array()?.first()?.as_object()?;
    let address = non_empty(first, "ip")?;
    Some(IpAssignment {
        address,
        netmask: string(first, mask_key),
    })
}

fn string(obj: &Object, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn non_empty(obj: &Object, key: &str) -> Option<String> {
    let s = string(obj, key);
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn coerce_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f as u64)
            })
        }
        _ => None,
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    f.is_finite().then_some(f)
}

fn u64_or_zero(value: Option<&Value>) -> u64 {
    value.and_then(coerce_u64).unwrap_or(0)
}

fn boolean(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0),
        _ => false,
    }
}
