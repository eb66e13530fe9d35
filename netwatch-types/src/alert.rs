//! Alerts raised by threshold rules.

/// How urgent an alert is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARN",
            Severity::Critical => "CRIT",
        }
    }
}

/// The rule that produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum AlertKind {
    DeviceUnreachable,
    Unsupported,
    CollectionIssue,
    RecentReboot,
    InterfaceDown,
    NoIpAssigned,
    HighErrorRate,
    HighBandwidth,
}

impl AlertKind {
    /// Wire name, e.g. `DEVICE_UNREACHABLE`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::DeviceUnreachable => "DEVICE_UNREACHABLE",
            AlertKind::Unsupported => "UNSUPPORTED",
            AlertKind::CollectionIssue => "COLLECTION_ISSUE",
            AlertKind::RecentReboot => "RECENT_REBOOT",
            AlertKind::InterfaceDown => "INTERFACE_DOWN",
            AlertKind::NoIpAssigned => "NO_IP_ASSIGNED",
            AlertKind::HighErrorRate => "HIGH_ERROR_RATE",
            AlertKind::HighBandwidth => "HIGH_BANDWIDTH",
        }
    }
}

/// A single alert from one evaluation cycle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
    pub severity: Severity,
    /// Unix timestamp in milliseconds of the evaluation.
    pub timestamp_ms: u64,
    /// Id of the entity the alert is about, if any.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub entity_id: Option<String>,
}

impl Alert {
    pub fn new(kind: AlertKind, severity: Severity, message: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            kind,
            message: message.into(),
            severity,
            timestamp_ms,
            entity_id: None,
        }
    }

    /// Attach the originating entity id.
    pub fn for_entity(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }
}
