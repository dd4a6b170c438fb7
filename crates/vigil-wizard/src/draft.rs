//! The unsaved configuration draft.
//!
//! Operator edits accumulate here, strictly separated from the
//! device-reported snapshot. Each step's fields live in their own group;
//! mutable access to a group marks that step dirty, and
//! [`SetupDraft::absorb_snapshot`] refreshes only the groups that are not
//! dirty. A status poll that lands after an edit therefore never reverts
//! what the operator typed, while untouched steps keep tracking the
//! device.
//!
//! The draft also derives the two things the rest of the wizard needs from
//! it: the full [`PinClaim`] set for conflict detection, and the per-step
//! save payload with the device's field names.

use crate::pins::PinClaim;
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;
use vigil_core::constants::{
    DEFAULT_ADMIN_TIMEOUT_S, DEFAULT_LD2410B_BAUD, DEFAULT_LD2410B_RX_GPIO,
    DEFAULT_LD2410B_TX_GPIO, DEFAULT_LOG_RETENTION_DAYS, DEFAULT_NFC_CS_GPIO,
    DEFAULT_NFC_IRQ_GPIO, DEFAULT_NFC_RST_GPIO, DEFAULT_SD_CS_GPIO,
};
use vigil_core::{MotionKind, NfcInterface, StatusSnapshot, StepId};

/// Welcome-step fields.
#[derive(Debug, Clone, PartialEq)]
pub struct WelcomeDraft {
    pub admin_password: String,
    pub admin_timeout_s: u32,
}

impl Default for WelcomeDraft {
    fn default() -> Self {
        WelcomeDraft {
            admin_password: String::new(),
            admin_timeout_s: DEFAULT_ADMIN_TIMEOUT_S,
        }
    }
}

/// Network-step fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkDraft {
    pub sta_enabled: bool,
    pub sta_ssid: String,
    pub sta_password: String,
    pub ap_password: String,
}

/// Time-step fields. `sync_clock` requests that the save carry the current
/// epoch for the RTC.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeDraft {
    pub timezone: String,
    pub sync_clock: bool,
}

/// Storage-step fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageDraft {
    pub sd_enabled: bool,
    pub sd_cs_gpio: i32,
    pub sd_required: bool,
    pub log_retention_days: u32,
}

impl Default for StorageDraft {
    fn default() -> Self {
        StorageDraft {
            sd_enabled: false,
            sd_cs_gpio: i32::from(DEFAULT_SD_CS_GPIO),
            sd_required: false,
            log_retention_days: DEFAULT_LOG_RETENTION_DAYS,
        }
    }
}

/// Sensors-step fields: primary sensor enables, NFC wiring, motion radar
/// wiring, and control surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorsDraft {
    pub motion_enabled: bool,
    pub door_enabled: bool,
    pub nfc_interface: NfcInterface,
    pub nfc_cs_gpio: i32,
    pub nfc_irq_gpio: i32,
    pub nfc_rst_gpio: i32,
    pub motion_kind: MotionKind,
    pub ld2410b_rx_gpio: i32,
    pub ld2410b_tx_gpio: i32,
    pub ld2410b_baud: u32,
    pub control_web_enabled: bool,
    pub control_nfc_enabled: bool,
}

impl Default for SensorsDraft {
    fn default() -> Self {
        SensorsDraft {
            motion_enabled: false,
            door_enabled: false,
            nfc_interface: NfcInterface::Spi,
            nfc_cs_gpio: i32::from(DEFAULT_NFC_CS_GPIO),
            nfc_irq_gpio: i32::from(DEFAULT_NFC_IRQ_GPIO),
            nfc_rst_gpio: i32::from(DEFAULT_NFC_RST_GPIO),
            motion_kind: MotionKind::Gpio,
            ld2410b_rx_gpio: i32::from(DEFAULT_LD2410B_RX_GPIO),
            ld2410b_tx_gpio: i32::from(DEFAULT_LD2410B_TX_GPIO),
            ld2410b_baud: DEFAULT_LD2410B_BAUD,
            control_web_enabled: true,
            control_nfc_enabled: false,
        }
    }
}

/// Outputs-step fields.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputsDraft {
    pub horn_enabled: bool,
    pub light_enabled: bool,
    pub horn_gpio: i32,
    pub light_gpio: i32,
}

impl Default for OutputsDraft {
    fn default() -> Self {
        OutputsDraft {
            horn_enabled: false,
            light_enabled: false,
            horn_gpio: -1,
            light_gpio: -1,
        }
    }
}

/// All unsaved edits, grouped by owning step, with per-step dirty marks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetupDraft {
    welcome: WelcomeDraft,
    network: NetworkDraft,
    time: TimeDraft,
    storage: StorageDraft,
    sensors: SensorsDraft,
    outputs: OutputsDraft,
    dirty: BTreeSet<StepId>,
}

impl SetupDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn welcome(&self) -> &WelcomeDraft {
        &self.welcome
    }

    #[must_use]
    pub fn network(&self) -> &NetworkDraft {
        &self.network
    }

    #[must_use]
    pub fn time(&self) -> &TimeDraft {
        &self.time
    }

    #[must_use]
    pub fn storage(&self) -> &StorageDraft {
        &self.storage
    }

    #[must_use]
    pub fn sensors(&self) -> &SensorsDraft {
        &self.sensors
    }

    #[must_use]
    pub fn outputs(&self) -> &OutputsDraft {
        &self.outputs
    }

    /// Edit the welcome fields; marks the step dirty.
    pub fn welcome_mut(&mut self) -> &mut WelcomeDraft {
        self.dirty.insert(StepId::Welcome);
        &mut self.welcome
    }

    /// Edit the network fields; marks the step dirty.
    pub fn network_mut(&mut self) -> &mut NetworkDraft {
        self.dirty.insert(StepId::Network);
        &mut self.network
    }

    /// Edit the time fields; marks the step dirty.
    pub fn time_mut(&mut self) -> &mut TimeDraft {
        self.dirty.insert(StepId::Time);
        &mut self.time
    }

    /// Edit the storage fields; marks the step dirty.
    pub fn storage_mut(&mut self) -> &mut StorageDraft {
        self.dirty.insert(StepId::Storage);
        &mut self.storage
    }

    /// Edit the sensors fields; marks the step dirty.
    pub fn sensors_mut(&mut self) -> &mut SensorsDraft {
        self.dirty.insert(StepId::Sensors);
        &mut self.sensors
    }

    /// Edit the outputs fields; marks the step dirty.
    pub fn outputs_mut(&mut self) -> &mut OutputsDraft {
        self.dirty.insert(StepId::Outputs);
        &mut self.outputs
    }

    #[must_use]
    pub fn is_dirty(&self, step: StepId) -> bool {
        self.dirty.contains(&step)
    }

    /// Forget unsaved-edit marks for `step`, typically after a successful
    /// save of that step.
    pub fn clear_dirty(&mut self, step: StepId) {
        self.dirty.remove(&step);
    }

    /// Refresh device-derived fields from a status snapshot.
    ///
    /// Steps with unsaved edits are skipped entirely. Password fields are
    /// write-only on the device and are never refreshed.
    pub fn absorb_snapshot(&mut self, snap: &StatusSnapshot) {
        if !self.is_dirty(StepId::Storage) {
            self.storage.sd_enabled = snap.storage.sd_enabled;
            self.storage.sd_cs_gpio = snap.storage.sd_cs_gpio;
            self.storage.sd_required = snap.storage.sd_required;
        }
        if !self.is_dirty(StepId::Sensors) {
            self.sensors.motion_enabled = snap.sensors.motion_enabled;
            self.sensors.door_enabled = snap.sensors.door_enabled;
            self.sensors.nfc_interface = snap.nfc.interface;
            self.sensors.nfc_cs_gpio = snap.nfc.spi_cs_gpio;
            self.sensors.nfc_irq_gpio = snap.nfc.spi_irq_gpio;
            self.sensors.nfc_rst_gpio = snap.nfc.spi_rst_gpio;
            self.sensors.motion_kind = snap.sensors.motion_kind;
            self.sensors.ld2410b_rx_gpio = snap.sensors.ld2410b.rx_gpio;
            self.sensors.ld2410b_tx_gpio = snap.sensors.ld2410b.tx_gpio;
            self.sensors.ld2410b_baud = snap.sensors.ld2410b.baud;
        }
        if !self.is_dirty(StepId::Outputs) {
            self.outputs.horn_enabled = snap.outputs.horn_enabled_cfg;
            self.outputs.light_enabled = snap.outputs.light_enabled_cfg;
            self.outputs.horn_gpio = snap.outputs.horn_gpio;
            self.outputs.light_gpio = snap.outputs.light_gpio;
        }
    }

    /// Assemble the complete pin-claim set for conflict detection.
    ///
    /// Disabled subsystems claim nothing. Declaration order fixes the
    /// conflict-report order.
    #[must_use]
    pub fn pin_claims(&self) -> Vec<PinClaim> {
        let mut claims = Vec::new();

        if self.storage.sd_enabled {
            claims.push(PinClaim::output("SD CS", self.storage.sd_cs_gpio));
        }

        if self.sensors.nfc_interface == NfcInterface::Spi {
            claims.push(PinClaim::output("NFC CS", self.sensors.nfc_cs_gpio));
            claims.push(PinClaim::output("NFC RST", self.sensors.nfc_rst_gpio));
            claims.push(PinClaim::input("NFC IRQ", self.sensors.nfc_irq_gpio));
        }

        if self.sensors.motion_kind == MotionKind::Ld2410bUart {
            claims.push(PinClaim::input("LD2410B RX", self.sensors.ld2410b_rx_gpio));
            claims.push(PinClaim::output("LD2410B TX", self.sensors.ld2410b_tx_gpio));
        }

        if self.outputs.horn_enabled {
            claims.push(PinClaim::output("Horn", self.outputs.horn_gpio));
        }
        if self.outputs.light_enabled {
            claims.push(PinClaim::output("Light", self.outputs.light_gpio));
        }

        claims
    }

    /// Build the save-step body for `step`, using the device's field names.
    ///
    /// The review step saves no fields. The time payload never includes the
    /// RTC epoch; the caller injects `rtc_set_epoch_s` at submit time when
    /// [`TimeDraft::sync_clock`] is set, so the timestamp is taken when the
    /// save actually happens.
    #[must_use]
    pub fn payload_for(&self, step: StepId) -> Map<String, Value> {
        let mut data = Map::new();
        match step {
            StepId::Welcome => {
                data.insert(
                    "admin_web_password".into(),
                    json!(self.welcome.admin_password),
                );
                data.insert(
                    "admin_mode_timeout_s".into(),
                    json!(self.welcome.admin_timeout_s),
                );
            }
            StepId::Network => {
                data.insert("wifi_sta_enabled".into(), json!(self.network.sta_enabled));
                data.insert("wifi_sta_ssid".into(), json!(self.network.sta_ssid));
                data.insert("wifi_sta_password".into(), json!(self.network.sta_password));
                data.insert("wifi_ap_password".into(), json!(self.network.ap_password));
            }
            StepId::Sensors => {
                data.insert("motion_enabled".into(), json!(self.sensors.motion_enabled));
                data.insert("door_enabled".into(), json!(self.sensors.door_enabled));
                data.insert("nfc_interface".into(), json!(self.sensors.nfc_interface));
                data.insert("nfc_spi_cs_gpio".into(), json!(self.sensors.nfc_cs_gpio));
                data.insert("nfc_spi_irq_gpio".into(), json!(self.sensors.nfc_irq_gpio));
                data.insert("nfc_spi_rst_gpio".into(), json!(self.sensors.nfc_rst_gpio));
                data.insert("motion_kind".into(), json!(self.sensors.motion_kind));
                if self.sensors.motion_kind == MotionKind::Ld2410bUart {
                    data.insert(
                        "motion_ld2410b_rx_gpio".into(),
                        json!(self.sensors.ld2410b_rx_gpio),
                    );
                    data.insert(
                        "motion_ld2410b_tx_gpio".into(),
                        json!(self.sensors.ld2410b_tx_gpio),
                    );
                    data.insert(
                        "motion_ld2410b_baud".into(),
                        json!(self.sensors.ld2410b_baud),
                    );
                }
                data.insert(
                    "control_web_enabled".into(),
                    json!(self.sensors.control_web_enabled),
                );
                data.insert(
                    "control_nfc_enabled".into(),
                    json!(self.sensors.control_nfc_enabled),
                );
            }
            StepId::Time => {
                data.insert("timezone".into(), json!(self.time.timezone));
            }
            StepId::Storage => {
                data.insert("sd_enabled".into(), json!(self.storage.sd_enabled));
                data.insert("sd_cs_gpio".into(), json!(self.storage.sd_cs_gpio));
                data.insert("sd_required".into(), json!(self.storage.sd_required));
                data.insert(
                    "log_retention_days".into(),
                    json!(self.storage.log_retention_days),
                );
            }
            StepId::Outputs => {
                data.insert("horn_enabled".into(), json!(self.outputs.horn_enabled));
                data.insert("light_enabled".into(), json!(self.outputs.light_enabled));
                data.insert("horn_gpio".into(), json!(self.outputs.horn_gpio));
                data.insert("light_gpio".into(), json!(self.outputs.light_gpio));
            }
            StepId::Review => {}
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::snapshot::{NfcStatus, SensorsStatus, StorageStatus};

    fn snapshot_with_storage() -> StatusSnapshot {
        StatusSnapshot {
            storage: StorageStatus {
                sd_enabled: true,
                sd_cs_gpio: 5,
                sd_required: true,
                ..StorageStatus::default()
            },
            sensors: SensorsStatus {
                motion_enabled: true,
                door_enabled: false,
                ..SensorsStatus::default()
            },
            nfc: NfcStatus {
                spi_cs_gpio: 26,
                spi_irq_gpio: 32,
                spi_rst_gpio: 33,
                ..NfcStatus::default()
            },
            ..StatusSnapshot::default()
        }
    }

    #[test]
    fn defaults_match_the_device_form() {
        let draft = SetupDraft::new();
        assert_eq!(draft.welcome().admin_timeout_s, 600);
        assert_eq!(draft.storage().sd_cs_gpio, 13);
        assert_eq!(draft.sensors().nfc_cs_gpio, 27);
        assert_eq!(draft.sensors().nfc_irq_gpio, 32);
        assert_eq!(draft.sensors().nfc_rst_gpio, 33);
        assert_eq!(draft.sensors().ld2410b_baud, 256_000);
        assert_eq!(draft.storage().log_retention_days, 365);
    }

    #[test]
    fn mutable_access_marks_step_dirty() {
        let mut draft = SetupDraft::new();
        assert!(!draft.is_dirty(StepId::Network));
        draft.network_mut().sta_ssid = "barn".into();
        assert!(draft.is_dirty(StepId::Network));
        assert!(!draft.is_dirty(StepId::Storage));
    }

    #[test]
    fn absorb_updates_clean_steps() {
        let mut draft = SetupDraft::new();
        draft.absorb_snapshot(&snapshot_with_storage());
        assert!(draft.storage().sd_enabled);
        assert_eq!(draft.storage().sd_cs_gpio, 5);
        assert!(draft.storage().sd_required);
        assert_eq!(draft.sensors().nfc_cs_gpio, 26);
        assert!(draft.sensors().motion_enabled);
    }

    #[test]
    fn absorb_skips_dirty_steps() {
        let mut draft = SetupDraft::new();
        draft.storage_mut().sd_cs_gpio = 14;
        draft.absorb_snapshot(&snapshot_with_storage());
        // edited step untouched, others refreshed
        assert_eq!(draft.storage().sd_cs_gpio, 14);
        assert!(!draft.storage().sd_enabled);
        assert_eq!(draft.sensors().nfc_cs_gpio, 26);
    }

    #[test]
    fn clear_dirty_resumes_absorbing() {
        let mut draft = SetupDraft::new();
        draft.storage_mut().sd_cs_gpio = 14;
        draft.clear_dirty(StepId::Storage);
        draft.absorb_snapshot(&snapshot_with_storage());
        assert_eq!(draft.storage().sd_cs_gpio, 5);
    }

    #[test]
    fn claims_cover_all_enabled_subsystems() {
        let mut draft = SetupDraft::new();
        draft.storage_mut().sd_enabled = true;
        draft.sensors_mut().motion_kind = MotionKind::Ld2410bUart;
        draft.outputs_mut().horn_enabled = true;
        draft.outputs_mut().horn_gpio = 25;

        let claims = draft.pin_claims();
        let roles: Vec<&str> = claims.iter().map(PinClaim::role).collect();
        assert_eq!(
            roles,
            [
                "SD CS",
                "NFC CS",
                "NFC RST",
                "NFC IRQ",
                "LD2410B RX",
                "LD2410B TX",
                "Horn",
            ]
        );
    }

    #[test]
    fn disabled_subsystems_claim_nothing() {
        let draft = SetupDraft::new();
        // SD disabled, radar off, outputs off: only the SPI NFC lines claim.
        let roles: Vec<String> = draft
            .pin_claims()
            .iter()
            .map(|c| c.role().to_string())
            .collect();
        assert_eq!(roles, ["NFC CS", "NFC RST", "NFC IRQ"]);
    }

    #[test]
    fn welcome_payload_uses_device_field_names() {
        let mut draft = SetupDraft::new();
        draft.welcome_mut().admin_password = "hunter2hunter2".into();
        draft.welcome_mut().admin_timeout_s = 900;

        let data = draft.payload_for(StepId::Welcome);
        assert_eq!(data["admin_web_password"], json!("hunter2hunter2"));
        assert_eq!(data["admin_mode_timeout_s"], json!(900));
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn network_payload_uses_device_field_names() {
        let mut draft = SetupDraft::new();
        {
            let network = draft.network_mut();
            network.sta_enabled = true;
            network.sta_ssid = "barn".into();
            network.sta_password = "fieldmouse".into();
            network.ap_password = "Sunflower42".into();
        }

        let data = draft.payload_for(StepId::Network);
        assert_eq!(data["wifi_sta_enabled"], json!(true));
        assert_eq!(data["wifi_sta_ssid"], json!("barn"));
        assert_eq!(data["wifi_sta_password"], json!("fieldmouse"));
        assert_eq!(data["wifi_ap_password"], json!("Sunflower42"));
    }

    #[test]
    fn sensors_payload_includes_radar_fields_only_for_uart_kind() {
        let mut draft = SetupDraft::new();
        let data = draft.payload_for(StepId::Sensors);
        assert_eq!(data["nfc_interface"], json!("spi"));
        assert_eq!(data["motion_kind"], json!("gpio"));
        assert!(!data.contains_key("motion_ld2410b_rx_gpio"));

        draft.sensors_mut().motion_kind = MotionKind::Ld2410bUart;
        let data = draft.payload_for(StepId::Sensors);
        assert_eq!(data["motion_kind"], json!("ld2410b_uart"));
        assert_eq!(data["motion_ld2410b_rx_gpio"], json!(16));
        assert_eq!(data["motion_ld2410b_tx_gpio"], json!(17));
        assert_eq!(data["motion_ld2410b_baud"], json!(256_000));
    }

    #[test]
    fn time_payload_never_carries_the_epoch() {
        let mut draft = SetupDraft::new();
        draft.time_mut().timezone = "Europe/Stockholm".into();
        draft.time_mut().sync_clock = true;

        let data = draft.payload_for(StepId::Time);
        assert_eq!(data["timezone"], json!("Europe/Stockholm"));
        assert!(!data.contains_key("rtc_set_epoch_s"));
    }

    #[test]
    fn review_payload_is_empty() {
        assert!(SetupDraft::new().payload_for(StepId::Review).is_empty());
    }
}
