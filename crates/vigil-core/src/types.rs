use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical wizard steps, in presentation order.
///
/// Identifiers are stable across firmware versions; the device reports the
/// last saved step by id and the client submits drafts per step. Legacy ids
/// from older clients ("security", "nfc", "controls", "power") are not part
/// of this enum; the sequencer resolves them through its alias table.
///
/// # Examples
///
/// ```
/// use vigil_core::StepId;
///
/// assert_eq!(StepId::ALL.len(), 7);
/// assert_eq!(StepId::Welcome.as_str(), "welcome");
/// assert_eq!(StepId::from_canonical("review"), Some(StepId::Review));
/// assert_eq!(StepId::from_canonical("power"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Welcome,
    Network,
    Sensors,
    Time,
    Storage,
    Outputs,
    Review,
}

impl StepId {
    /// All canonical steps in presentation order.
    pub const ALL: [StepId; 7] = [
        StepId::Welcome,
        StepId::Network,
        StepId::Sensors,
        StepId::Time,
        StepId::Storage,
        StepId::Outputs,
        StepId::Review,
    ];

    /// The step the wizard opens on.
    #[must_use]
    pub const fn first() -> Self {
        StepId::Welcome
    }

    /// The step that hosts the completion control.
    #[must_use]
    pub const fn last() -> Self {
        StepId::Review
    }

    /// Stable identifier used on the wire and in persisted state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            StepId::Welcome => "welcome",
            StepId::Network => "network",
            StepId::Sensors => "sensors",
            StepId::Time => "time",
            StepId::Storage => "storage",
            StepId::Outputs => "outputs",
            StepId::Review => "review",
        }
    }

    /// Human-readable step title.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            StepId::Welcome => "Welcome + Admin Password",
            StepId::Network => "Network",
            StepId::Sensors => "Inputs (NFC + Sensors)",
            StepId::Time => "Time & RTC",
            StepId::Storage => "Storage",
            StepId::Outputs => "Outputs",
            StepId::Review => "Review & Complete",
        }
    }

    /// Position in the presentation order, starting at zero.
    #[must_use]
    pub fn order(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    /// Parse a canonical id. Aliases and unknown strings return `None`.
    #[must_use]
    pub fn from_canonical(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == raw)
    }

    /// The step immediately after this one, or `None` on the last step.
    #[must_use]
    pub fn successor(&self) -> Option<Self> {
        Self::ALL.get(self.order() + 1).copied()
    }

    /// True for the step that hosts the completion control.
    #[must_use]
    pub fn is_last(&self) -> bool {
        *self == Self::last()
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Admin-session mode reported by the device.
///
/// `Eligible` means the physical admin window is open but no password has
/// been presented yet; `Authenticated` carries a live token on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminMode {
    Eligible,
    Authenticated,
    #[default]
    #[serde(other)]
    Off,
}

impl AdminMode {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AdminMode::Authenticated)
    }
}

/// NFC reader health as reported by the device.
///
/// `Degraded` doubles as the fallback for health strings this client does
/// not know yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NfcHealth {
    Ok,
    DisabledCfg,
    DisabledBuild,
    Unavailable,
    #[default]
    #[serde(other)]
    Degraded,
}

impl NfcHealth {
    /// Short operator-facing label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            NfcHealth::Ok => "OK",
            NfcHealth::DisabledCfg | NfcHealth::DisabledBuild | NfcHealth::Unavailable => {
                "Unavailable"
            }
            NfcHealth::Degraded => "Degraded",
        }
    }
}

/// Outcome of the most recent card scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanResult {
    Ok,
    #[default]
    #[serde(other)]
    Fail,
}

impl ScanResult {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, ScanResult::Ok)
    }
}

/// Role the device resolved for the most recently scanned card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardRole {
    User,
    Admin,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for CardRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            CardRole::Unknown => "unknown",
            CardRole::User => "user",
            CardRole::Admin => "admin",
        };
        write!(f, "{s}")
    }
}

/// Motion-sensor wiring variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionKind {
    Ld2410bUart,
    #[default]
    #[serde(other)]
    Gpio,
}

/// NFC reader bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NfcInterface {
    I2c,
    #[default]
    #[serde(other)]
    Spi,
}

/// Card-provisioning mode requested from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningMode {
    AddAdmin,
    AddUser,
}

impl ProvisioningMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProvisioningMode::AddAdmin => "add_admin",
            ProvisioningMode::AddUser => "add_user",
        }
    }
}

/// Opaque elevated-session token issued by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminToken(String);

impl AdminToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        AdminToken(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The three persisted completion conditions, read together by the gate.
///
/// Absent persisted keys read as `false`: a requirement is never satisfied
/// by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionFlags {
    pub admin_password_set: bool,
    pub ap_password_changed: bool,
    pub primary_sensor_enabled: bool,
}

impl CompletionFlags {
    /// True when every tracked condition has been satisfied at least once.
    #[must_use]
    pub fn all_set(&self) -> bool {
        self.admin_password_set && self.ap_password_changed && self.primary_sensor_enabled
    }
}
