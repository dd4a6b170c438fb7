//! Device-reported status snapshot.
//!
//! The device answers the status poll with one JSON document describing
//! everything setup cares about: whether setup is still required, the last
//! saved step, the admin-session mode, per-subsystem pin assignments, and
//! the NFC scan feed that drives card provisioning. This module is the
//! read-only model of that document.
//!
//! Decoding is lenient by design. Every field carries a default so that a
//! snapshot from an older or newer firmware build still decodes; unknown
//! enum strings fall back to their documented defaults. A snapshot never
//! fails to decode because the device learned a new field.
//!
//! Pin assignments use the firmware convention: a negative number means
//! "not wired / not used". [`gpio_from_raw`] converts to `Option<u8>`.

use crate::types::{AdminMode, CardRole, MotionKind, NfcHealth, NfcInterface, ScanResult};
use serde::{Deserialize, Serialize};

/// Convert a device pin field (`-1` = unset) into an optional pin number.
#[must_use]
pub fn gpio_from_raw(raw: i32) -> Option<u8> {
    u8::try_from(raw).ok()
}

const fn unset_pin() -> i32 {
    -1
}

fn default_ld2410b_baud() -> u32 {
    crate::constants::DEFAULT_LD2410B_BAUD
}

/// Top-level status document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default)]
    pub setup_required: bool,
    #[serde(default)]
    pub setup_last_step: String,
    #[serde(default)]
    pub admin_mode: AdminMode,
    #[serde(default)]
    pub admin_mode_remaining_s: u32,
    #[serde(default)]
    pub storage: StorageStatus,
    #[serde(default)]
    pub sensors: SensorsStatus,
    #[serde(default)]
    pub outputs: OutputsStatus,
    #[serde(default)]
    pub nfc: NfcStatus,
}

impl StatusSnapshot {
    /// Operator-facing admin-session line.
    #[must_use]
    pub fn admin_status_text(&self) -> String {
        match self.admin_mode {
            AdminMode::Eligible => format!("Admin: Eligible ({}s)", self.admin_mode_remaining_s),
            AdminMode::Authenticated => {
                format!("Admin: Authenticated ({}s)", self.admin_mode_remaining_s)
            }
            AdminMode::Off => "Admin: Off".to_string(),
        }
    }

    /// Operator-facing NFC reader line.
    #[must_use]
    pub fn nfc_status_text(&self) -> String {
        let prov = if self.nfc.provisioning_active { "Yes" } else { "No" };
        format!("{} (Provisioning enabled: {prov})", self.nfc.health.label())
    }

    /// Operator-facing storage line, derived from the device's status word.
    #[must_use]
    pub fn storage_status_text(&self) -> String {
        let status = self.storage.status.as_str();
        if status == "DISABLED" {
            return "SD Disabled (Using Flash Fallback)".to_string();
        }
        if status == "OK" {
            return "SD OK".to_string();
        }
        if self.storage.fallback_active {
            return "SD Missing (Using Flash Fallback)".to_string();
        }
        if !status.is_empty() {
            return format!("SD {status}");
        }
        "Unknown".to_string()
    }
}

/// Storage subsystem status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageStatus {
    #[serde(default)]
    pub sd_enabled: bool,
    #[serde(default = "unset_pin")]
    pub sd_cs_gpio: i32,
    #[serde(default)]
    pub sd_required: bool,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub active_backend: String,
    #[serde(default)]
    pub fallback_active: bool,
}

impl Default for StorageStatus {
    fn default() -> Self {
        StorageStatus {
            sd_enabled: false,
            sd_cs_gpio: unset_pin(),
            sd_required: false,
            status: String::new(),
            active_backend: String::new(),
            fallback_active: false,
        }
    }
}

/// Sensor subsystem status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorsStatus {
    #[serde(default)]
    pub motion_enabled: bool,
    #[serde(default)]
    pub door_enabled: bool,
    #[serde(default)]
    pub motion_kind: MotionKind,
    #[serde(default)]
    pub ld2410b: Ld2410bStatus,
}

/// LD2410B radar UART wiring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ld2410bStatus {
    #[serde(default = "unset_pin")]
    pub rx_gpio: i32,
    #[serde(default = "unset_pin")]
    pub tx_gpio: i32,
    #[serde(default = "default_ld2410b_baud")]
    pub baud: u32,
}

impl Default for Ld2410bStatus {
    fn default() -> Self {
        Ld2410bStatus {
            rx_gpio: unset_pin(),
            tx_gpio: unset_pin(),
            baud: default_ld2410b_baud(),
        }
    }
}

/// Alarm output status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputsStatus {
    #[serde(default)]
    pub horn_enabled_cfg: bool,
    #[serde(default)]
    pub light_enabled_cfg: bool,
    #[serde(default = "unset_pin")]
    pub horn_gpio: i32,
    #[serde(default = "unset_pin")]
    pub light_gpio: i32,
}

impl Default for OutputsStatus {
    fn default() -> Self {
        OutputsStatus {
            horn_enabled_cfg: false,
            light_enabled_cfg: false,
            horn_gpio: unset_pin(),
            light_gpio: unset_pin(),
        }
    }
}

/// NFC subsystem status, including the scan feed the provisioning state
/// machine consumes.
///
/// `last_scan_ms` is the device's monotonically advancing scan marker; a
/// new card tap always produces a strictly greater value than any earlier
/// report within the same device uptime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NfcStatus {
    #[serde(default)]
    pub interface: NfcInterface,
    #[serde(default = "unset_pin")]
    pub spi_cs_gpio: i32,
    #[serde(default = "unset_pin")]
    pub spi_irq_gpio: i32,
    #[serde(default = "unset_pin")]
    pub spi_rst_gpio: i32,
    #[serde(default)]
    pub health: NfcHealth,
    #[serde(default)]
    pub lockout_active: bool,
    #[serde(default)]
    pub lockout_remaining_s: u32,
    #[serde(default)]
    pub provisioning_active: bool,
    #[serde(default)]
    pub provisioning_remaining_s: u32,
    #[serde(default)]
    pub last_scan_ms: u64,
    #[serde(default)]
    pub last_scan_result: ScanResult,
    #[serde(default)]
    pub last_role: CardRole,
}

impl Default for NfcStatus {
    fn default() -> Self {
        NfcStatus {
            interface: NfcInterface::default(),
            spi_cs_gpio: unset_pin(),
            spi_irq_gpio: unset_pin(),
            spi_rst_gpio: unset_pin(),
            health: NfcHealth::default(),
            lockout_active: false,
            lockout_remaining_s: 0,
            provisioning_active: false,
            provisioning_remaining_s: 0,
            last_scan_ms: 0,
            last_scan_result: ScanResult::default(),
            last_role: CardRole::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn empty_document_decodes_to_defaults() {
        let snap: StatusSnapshot = serde_json::from_value(json!({})).unwrap();
        assert!(!snap.setup_required);
        assert_eq!(snap.setup_last_step, "");
        assert_eq!(snap.admin_mode, AdminMode::Off);
        assert_eq!(snap.storage.sd_cs_gpio, -1);
        assert_eq!(snap.sensors.ld2410b.baud, 256_000);
        assert_eq!(snap.nfc.last_scan_ms, 0);
        assert!(!snap.nfc.provisioning_active);
    }

    #[test]
    fn full_document_decodes() {
        let snap: StatusSnapshot = serde_json::from_value(json!({
            "setup_required": true,
            "setup_last_step": "sensors",
            "admin_mode": "authenticated",
            "admin_mode_remaining_s": 412,
            "storage": {
                "sd_enabled": true,
                "sd_cs_gpio": 13,
                "sd_required": false,
                "status": "OK",
                "active_backend": "sd",
                "fallback_active": false
            },
            "sensors": {
                "motion_enabled": true,
                "door_enabled": false,
                "motion_kind": "ld2410b_uart",
                "ld2410b": { "rx_gpio": 16, "tx_gpio": 17, "baud": 256000 }
            },
            "outputs": {
                "horn_enabled_cfg": true,
                "light_enabled_cfg": false,
                "horn_gpio": 25,
                "light_gpio": -1
            },
            "nfc": {
                "interface": "spi",
                "spi_cs_gpio": 27,
                "spi_irq_gpio": 32,
                "spi_rst_gpio": 33,
                "health": "ok",
                "provisioning_active": true,
                "provisioning_remaining_s": 55,
                "last_scan_ms": 123456,
                "last_scan_result": "ok",
                "last_role": "admin"
            }
        }))
        .unwrap();

        assert!(snap.setup_required);
        assert_eq!(snap.setup_last_step, "sensors");
        assert!(snap.admin_mode.is_authenticated());
        assert_eq!(snap.storage.sd_cs_gpio, 13);
        assert_eq!(snap.sensors.motion_kind, MotionKind::Ld2410bUart);
        assert_eq!(snap.outputs.horn_gpio, 25);
        assert_eq!(gpio_from_raw(snap.outputs.light_gpio), None);
        assert_eq!(snap.nfc.last_scan_ms, 123_456);
        assert_eq!(snap.nfc.last_role, CardRole::Admin);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let snap: StatusSnapshot = serde_json::from_value(json!({
            "setup_required": false,
            "uptime_ms": 987654,
            "events": [{"kind": "boot"}]
        }))
        .unwrap();
        assert!(!snap.setup_required);
    }

    #[rstest]
    #[case(-1, None)]
    #[case(-7, None)]
    #[case(0, Some(0))]
    #[case(13, Some(13))]
    #[case(39, Some(39))]
    fn raw_pin_conversion(#[case] raw: i32, #[case] expected: Option<u8>) {
        assert_eq!(gpio_from_raw(raw), expected);
    }

    #[rstest]
    #[case(AdminMode::Off, 0, "Admin: Off")]
    #[case(AdminMode::Eligible, 90, "Admin: Eligible (90s)")]
    #[case(AdminMode::Authenticated, 412, "Admin: Authenticated (412s)")]
    fn admin_text_matches_mode(
        #[case] mode: AdminMode,
        #[case] remaining: u32,
        #[case] expected: &str,
    ) {
        let snap = StatusSnapshot {
            admin_mode: mode,
            admin_mode_remaining_s: remaining,
            ..StatusSnapshot::default()
        };
        assert_eq!(snap.admin_status_text(), expected);
    }

    #[test]
    fn nfc_text_reports_health_and_window() {
        let mut snap = StatusSnapshot::default();
        snap.nfc.health = NfcHealth::Ok;
        snap.nfc.provisioning_active = true;
        assert_eq!(snap.nfc_status_text(), "OK (Provisioning enabled: Yes)");
        snap.nfc.provisioning_active = false;
        assert_eq!(snap.nfc_status_text(), "OK (Provisioning enabled: No)");
    }

    #[rstest]
    #[case("OK", false, "SD OK")]
    #[case("DISABLED", false, "SD Disabled (Using Flash Fallback)")]
    #[case("", true, "SD Missing (Using Flash Fallback)")]
    #[case("MOUNT_FAILED", true, "SD Missing (Using Flash Fallback)")]
    #[case("MOUNT_FAILED", false, "SD MOUNT_FAILED")]
    #[case("", false, "Unknown")]
    fn storage_text_matches_status_word(
        #[case] status: &str,
        #[case] fallback: bool,
        #[case] expected: &str,
    ) {
        let snap = StatusSnapshot {
            storage: StorageStatus {
                status: status.to_string(),
                fallback_active: fallback,
                ..StorageStatus::default()
            },
            ..StatusSnapshot::default()
        };
        assert_eq!(snap.storage_status_text(), expected);
    }
}
