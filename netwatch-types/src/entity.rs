//! Canonical entity model: devices and interfaces.

/// Operational status reported for an entity.
///
/// Devices report reachability, interfaces report link state. Anything the
/// normalizer does not recognise becomes [`OperStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OperStatus {
    Up,
    Down,
    Reachable,
    Unreachable,
    #[default]
    Unknown,
}

impl OperStatus {
    /// Parse a status string case-insensitively.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => OperStatus::Up,
            "down" => OperStatus::Down,
            "reachable" => OperStatus::Reachable,
            "unreachable" => OperStatus::Unreachable,
            _ => OperStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperStatus::Up => "up",
            OperStatus::Down => "down",
            OperStatus::Reachable => "reachable",
            OperStatus::Unreachable => "unreachable",
            OperStatus::Unknown => "unknown",
        }
    }
}

/// Which kind of network element an entity represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EntityKind {
    Device,
    Interface,
}

/// A monitored network element in canonical form.
///
/// The `id` is stable across polling cycles for as long as the element keeps
/// being reported: the inventory UUID for devices, the interface name for
/// interfaces.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entity {
    pub id: String,
    /// Display name (hostname or interface name).
    pub name: String,
    pub status: OperStatus,
    /// Unix timestamp in milliseconds of the cycle that produced this entity.
    pub last_updated_ms: u64,
    pub details: EntityDetails,
}

/// Kind-specific attributes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum EntityDetails {
    Device(DeviceDetails),
    Interface(InterfaceDetails),
}

/// Inventory attributes of a network device.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceDetails {
    pub management_ip: String,
    pub mac_address: String,
    pub software_version: String,
    /// Uptime as reported upstream, e.g. `"12:04:33"`. Not guaranteed to parse.
    pub uptime: String,
    pub serial_number: String,
    pub platform_id: String,
    pub interface_count: u32,
    /// Empty when the inventory does not report a support level.
    pub support_level: String,
    /// Empty when the inventory does not report a collection status.
    pub collection_status: String,
    pub role: String,
    pub vendor: String,
    pub family: String,
    pub series: String,
    pub description: String,
    pub boot_time: String,
}

/// An address assigned to an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IpAssignment {
    pub address: String,
    /// Dotted netmask for IPv4, prefix length for IPv6.
    pub netmask: String,
}

/// Raw interface counters as read from the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterfaceCounters {
    pub in_octets: u64,
    pub out_octets: u64,
    pub in_errors: u64,
    pub out_errors: u64,
}

impl InterfaceCounters {
    pub fn total_errors(&self) -> u64 {
        self.in_errors.saturating_add(self.out_errors)
    }

    pub fn total_octets(&self) -> u64 {
        self.in_octets.saturating_add(self.out_octets)
    }
}

/// Attributes of a network interface.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterfaceDetails {
    pub description: String,
    pub enabled: bool,
    pub ipv4: Option<IpAssignment>,
    pub ipv6: Option<IpAssignment>,
    /// Link speed in Mb/s.
    pub speed_mbps: Option<u64>,
    pub counters: Option<InterfaceCounters>,
    /// Utilisation of the link, 0-100.
    pub bandwidth_pct: Option<f64>,
    /// Errors accumulated since the previous cycle.
    pub error_delta: Option<u64>,
}

impl Entity {
    /// Create a device entity whose display name equals its id.
    pub fn device(id: impl Into<String>, status: OperStatus, details: DeviceDetails) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            status,
            last_updated_ms: 0,
            details: EntityDetails::Device(details),
        }
    }

    /// Create an interface entity; interfaces are identified by name.
    pub fn interface(name: impl Into<String>, status: OperStatus, details: InterfaceDetails) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            status,
            last_updated_ms: 0,
            details: EntityDetails::Interface(details),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self.details {
            EntityDetails::Device(_) => EntityKind::Device,
            EntityDetails::Interface(_) => EntityKind::Interface,
        }
    }

    pub fn as_device(&self) -> Option<&DeviceDetails> {
        match &self.details {
            EntityDetails::Device(d) => Some(d),
            EntityDetails::Interface(_) => None,
        }
    }

    pub fn as_interface(&self) -> Option<&InterfaceDetails> {
        match &self.details {
            EntityDetails::Interface(i) => Some(i),
            EntityDetails::Device(_) => None,
        }
    }

    pub fn as_interface_mut(&mut self) -> Option<&mut InterfaceDetails> {
        match &mut self.details {
            EntityDetails::Interface(i) => Some(i),
            EntityDetails::Device(_) => None,
        }
    }

    /// Every entity reports some form of up/down or reachable/unreachable state.
    pub fn has_reachability_state(&self) -> bool {
        true
    }

    pub fn has_error_counters(&self) -> bool {
        self.as_interface().map_or(false, |i| i.counters.is_some() || i.error_delta.is_some())
    }

    pub fn has_bandwidth_metric(&self) -> bool {
        self.as_interface().map_or(false, |i| i.bandwidth_pct.is_some())
    }

    /// Whether the status counts as healthy for this kind of entity.
    ///
    /// Devices must be reachable; interfaces must be administratively enabled
    /// and operationally up.
    pub fn is_operational(&self) -> bool {
        match &self.details {
            EntityDetails::Device(_) => self.status == OperStatus::Reachable,
            EntityDetails::Interface(i) => i.enabled && self.status == OperStatus::Up,
        }
    }
}
