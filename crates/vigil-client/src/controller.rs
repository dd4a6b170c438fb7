//! Command-driven orchestration of the setup wizard.
//!
//! [`SetupController`] owns everything the wizard needs on the client
//! side: the step sequencer, the persistent visited/requirement
//! trackers, the unsaved draft, the provisioning machine, the admin
//! session, and a [`DeviceApi`] implementation for talking to the
//! device. All mutation goes through [`SetupController::handle`] with
//! an explicit [`Command`], so the rendering layer stays a pure
//! function of the read model.
//!
//! Outcomes the operator must see are buffered as notices and drained
//! with [`SetupController::take_notices`]; device status arrives
//! through [`SetupController::apply_snapshot`], either from the
//! embedder's poll loop or from the controller's own refresh after a
//! successful save.
//!
//! Store errors are the only failures that propagate out of `handle`;
//! a device that rejects or drops a request turns into a notice, never
//! an `Err`.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use chrono::Utc;
use vigil_core::{ProvisioningMode, StatusSnapshot, StepId};
use vigil_provision::{ProvisioningEvent, ProvisioningMachine, ProvisioningStage};
use vigil_store::{CompletionFlagTracker, FlagStore, StoreResult, VisitedStepTracker};
use vigil_wizard::{
    CompletionGate, ConflictReport, GateInputs, GateVerdict, SetupDraft, StepSequencer,
    detect_conflicts,
};

use crate::api::{ApiError, DeviceApi};
use crate::session::AdminSession;

/// One operator action against the wizard.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Jump to a step by id or legacy alias
    SelectStep(String),
    /// Move to the successor of the current step
    AdvanceStep,
    /// Submit the current step's draft fields to the device
    SaveStep,
    /// Ask the device to finish setup (local gate permitting)
    CompleteSetup,
    /// Exchange the admin password for a session token
    AdminLogin { password: String },
    /// Drop the admin session on both ends
    AdminLogout,
    /// Open the admin-card provisioning window
    StartProvisioning,
    /// Close the provisioning window early
    StopProvisioning,
    /// Re-enter setup from the first step, forgetting all progress
    RestartSetup,
}

/// Client-side orchestrator for the setup wizard.
pub struct SetupController<D: DeviceApi> {
    api: D,
    sequencer: StepSequencer,
    visited: VisitedStepTracker,
    flags: CompletionFlagTracker,
    draft: SetupDraft,
    machine: ProvisioningMachine,
    session: AdminSession,
    snapshot: Option<StatusSnapshot>,
    notices: Vec<String>,
    device_reachable: bool,
}

impl<D: DeviceApi> SetupController<D> {
    /// Build a controller over `api`, loading wizard progress from `store`.
    #[must_use]
    pub fn new(api: D, store: FlagStore) -> Self {
        SetupController {
            api,
            sequencer: StepSequencer::new(),
            visited: VisitedStepTracker::load(store.clone()),
            flags: CompletionFlagTracker::new(store),
            draft: SetupDraft::new(),
            machine: ProvisioningMachine::new(),
            session: AdminSession::new(),
            snapshot: None,
            notices: Vec::new(),
            device_reachable: false,
        }
    }

    /// Execute one command.
    ///
    /// # Errors
    /// Returns [`vigil_store::StoreError`] when persisting wizard progress
    /// fails. Device-side failures become notices instead.
    pub async fn handle(&mut self, command: Command) -> StoreResult<()> {
        match command {
            Command::SelectStep(raw) => self.select_step(&raw),
            Command::AdvanceStep => self.advance_step(),
            Command::SaveStep => self.save_step().await,
            Command::CompleteSetup => self.complete_setup().await,
            Command::AdminLogin { password } => self.admin_login(&password).await,
            Command::AdminLogout => {
                self.admin_logout().await;
                Ok(())
            }
            Command::StartProvisioning => {
                self.start_provisioning().await;
                Ok(())
            }
            Command::StopProvisioning => {
                self.stop_provisioning().await;
                Ok(())
            }
            Command::RestartSetup => self.restart_setup().await,
        }
    }

    fn select_step(&mut self, raw: &str) -> StoreResult<()> {
        let step = self.sequencer.select(raw);
        self.visited.mark_visited(step)?;
        self.visited.mark_step_touched()?;
        debug!(step = step.as_str(), "step selected");
        Ok(())
    }

    fn advance_step(&mut self) -> StoreResult<()> {
        let step = self.sequencer.advance();
        self.visited.mark_visited(step)?;
        self.visited.mark_step_touched()?;
        debug!(step = step.as_str(), "step advanced");
        Ok(())
    }

    async fn save_step(&mut self) -> StoreResult<()> {
        let step = self.sequencer.current();
        // Requirement flags are sticky: recorded from the attempt, and
        // never lowered by a later save.
        self.update_flags_from_draft(step)?;

        let mut fields = self.draft.payload_for(step);
        if step == StepId::Time && self.draft.time().sync_clock {
            fields.insert("rtc_set_epoch_s".into(), Value::from(Utc::now().timestamp()));
        }

        match self.api.save_step(step, fields).await {
            Ok(()) => {
                self.draft.clear_dirty(step);
                self.push_notice("Saved.");
                info!(step = step.as_str(), "step saved");
                self.refresh().await
            }
            Err(err) => {
                self.note_save_failure(step, &err);
                Ok(())
            }
        }
    }

    async fn complete_setup(&mut self) -> StoreResult<()> {
        let verdict = self.gate_verdict();
        if !verdict.can_complete {
            debug!(hint = %verdict.hint, "completion blocked locally");
            self.push_notice(verdict.hint);
            return Ok(());
        }

        match self.api.complete_setup().await {
            Ok(()) => {
                self.push_notice("Setup complete.");
                info!("setup completed");
                self.refresh().await
            }
            Err(err) if err.is_session_error() => {
                warn!(error = %err, "completion rejected");
                self.expire_session();
                Ok(())
            }
            Err(ApiError::CompletionBlocked { reason }) => {
                warn!(reason = %reason, "device refused completion");
                self.push_notice(format!("Complete failed: {reason}"));
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "completion rejected");
                self.push_notice("Complete failed.");
                Ok(())
            }
        }
    }

    async fn admin_login(&mut self, password: &str) -> StoreResult<()> {
        match self.api.admin_login(password).await {
            Ok(token) => {
                self.session.establish(token);
                self.push_notice("Admin authenticated.");
                info!("admin login accepted");
                // The refresh brings in the device-reported Authenticated
                // mode; the session counts as elevated only after that.
                self.refresh().await
            }
            Err(err) => {
                warn!(error = %err, "admin login rejected");
                self.push_notice("Login failed.");
                Ok(())
            }
        }
    }

    async fn admin_logout(&mut self) {
        if let Err(err) = self.api.admin_logout().await {
            warn!(error = %err, "logout request failed");
        }
        self.session.clear();
        self.push_notice("Logged out.");
    }

    async fn start_provisioning(&mut self) {
        if !self.session.is_authenticated() {
            self.push_notice("Admin Authenticated required.");
            return;
        }

        match self.api.start_provisioning(ProvisioningMode::AddAdmin).await {
            Ok(()) => {
                let baseline = self.snapshot.as_ref().map_or(0, |s| s.nfc.last_scan_ms);
                self.machine.begin(baseline);
                info!(baseline, "provisioning window opened");
            }
            Err(err) if err.is_session_error() => {
                warn!(error = %err, "provisioning start rejected");
                self.expire_session();
            }
            Err(ApiError::ProvisioningRejected { reason }) => {
                warn!(reason = %reason, "provisioning start rejected");
                self.push_notice(format!("Provisioning rejected: {reason}"));
            }
            Err(err) => {
                warn!(error = %err, "provisioning start rejected");
                self.push_notice("Provisioning request failed.");
            }
        }
    }

    async fn stop_provisioning(&mut self) {
        if !self.session.is_authenticated() {
            self.push_notice("Admin Authenticated required.");
            return;
        }

        if let Err(err) = self.api.stop_provisioning().await {
            warn!(error = %err, "provisioning stop request failed");
            if err.is_session_error() {
                self.expire_session();
            }
        }
        // The device closes the window on its side; the next snapshot
        // would report it inactive either way.
        self.machine.reset();
    }

    async fn restart_setup(&mut self) -> StoreResult<()> {
        let mut fields = Map::new();
        fields.insert("setup_completed".into(), Value::Bool(false));

        match self.api.save_step(StepId::Welcome, fields).await {
            Ok(()) => {
                self.visited.reset()?;
                self.flags.reset()?;
                self.sequencer = StepSequencer::new();
                self.machine.reset();
                self.draft = SetupDraft::new();
                self.push_notice("Setup restarted.");
                info!("setup restarted");
                self.refresh().await
            }
            Err(err) => {
                self.note_save_failure(StepId::Welcome, &err);
                Ok(())
            }
        }
    }

    /// Fold a device status document into the controller state.
    ///
    /// Feeds the NFC section to the provisioning machine, updates the
    /// admin session's device-reported mode, refreshes non-dirty draft
    /// groups, and on the very first snapshot resumes the step the
    /// device remembered, unless the operator has already navigated.
    ///
    /// # Errors
    /// Returns [`vigil_store::StoreError`] if persisting the resumed
    /// step fails; the snapshot itself is applied regardless.
    pub fn apply_snapshot(&mut self, snap: StatusSnapshot) -> StoreResult<()> {
        let first = self.snapshot.is_none();

        if let Some(event) = self.machine.observe(&snap.nfc) {
            self.note_provisioning_event(event);
        }
        self.session
            .apply_device_mode(snap.admin_mode, snap.admin_mode_remaining_s);
        self.draft.absorb_snapshot(&snap);

        let resumed = (first && !self.visited.step_touched())
            .then(|| StepSequencer::normalize(&snap.setup_last_step));
        self.snapshot = Some(snap);
        self.device_reachable = true;

        if let Some(step) = resumed {
            debug!(step = step.as_str(), "resuming step reported by device");
            self.sequencer.set_current(step);
            self.visited.mark_visited(step)?;
        }
        Ok(())
    }

    async fn refresh(&mut self) -> StoreResult<()> {
        match self.api.fetch_status().await {
            Ok(snap) => self.apply_snapshot(snap),
            Err(err) => {
                // No notice: the poll loop would repeat it every cycle.
                warn!(error = %err, "status refresh failed");
                self.device_reachable = false;
                Ok(())
            }
        }
    }

    fn update_flags_from_draft(&self, step: StepId) -> StoreResult<()> {
        match step {
            StepId::Welcome => self
                .flags
                .update_admin_password(&self.draft.welcome().admin_password, true),
            StepId::Network => self
                .flags
                .update_ap_password(&self.draft.network().ap_password, true),
            StepId::Sensors => {
                let sensors = self.draft.sensors();
                self.flags
                    .update_primary_sensor(sensors.motion_enabled, sensors.door_enabled, true)
            }
            _ => Ok(()),
        }
    }

    fn note_save_failure(&mut self, step: StepId, err: &ApiError) {
        warn!(step = step.as_str(), error = %err, "step save rejected");
        if err.is_session_error() {
            self.expire_session();
            return;
        }
        match err {
            ApiError::SaveFailed {
                detail: Some(detail),
            } => {
                self.push_notice(format!("Save failed. Settings were not saved. ({detail})"));
            }
            _ => self.push_notice("Save failed. Settings were not saved."),
        }
    }

    fn note_provisioning_event(&mut self, event: ProvisioningEvent) {
        match event {
            ProvisioningEvent::FirstScanCaptured => {
                self.push_notice("First scan captured. Tap the same card again to confirm.");
            }
            ProvisioningEvent::CardConfirmed { role } => {
                self.push_notice(format!("Admin card confirmed ({role})."));
            }
            ProvisioningEvent::WindowClosed => {
                self.push_notice("Provisioning window closed.");
            }
        }
    }

    fn expire_session(&mut self) {
        self.session.clear();
        self.push_notice("Admin session expired. Log in again.");
    }

    fn push_notice(&mut self, text: impl Into<String>) {
        self.notices.push(text.into());
    }

    // --- read model ---

    #[must_use]
    pub fn current_step(&self) -> StepId {
        self.sequencer.current()
    }

    #[must_use]
    pub fn draft(&self) -> &SetupDraft {
        &self.draft
    }

    /// Mutable draft access; edits mark the owning step dirty.
    pub fn draft_mut(&mut self) -> &mut SetupDraft {
        &mut self.draft
    }

    /// Pin-conflict report for the draft as it stands.
    #[must_use]
    pub fn conflicts(&self) -> ConflictReport {
        detect_conflicts(&self.draft.pin_claims())
    }

    #[must_use]
    pub fn gate_verdict(&self) -> GateVerdict {
        let conflicts = self.conflicts();
        CompletionGate::evaluate(&GateInputs {
            current: self.sequencer.current(),
            all_visited: self.visited.all_visited(),
            flags: self.flags.read(),
            conflicts: &conflicts,
        })
    }

    #[must_use]
    pub fn can_complete(&self) -> bool {
        self.gate_verdict().can_complete
    }

    /// Why completion is blocked; empty when it is not.
    #[must_use]
    pub fn completion_hint(&self) -> String {
        self.gate_verdict().hint
    }

    #[must_use]
    pub fn provisioning_stage(&self) -> ProvisioningStage {
        self.machine.stage()
    }

    #[must_use]
    pub fn provisioning_status_text(&self) -> String {
        self.machine.status_text()
    }

    #[must_use]
    pub fn admin_status_text(&self) -> String {
        self.session.status_text()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// False after a failed fetch, true again after any applied snapshot.
    #[must_use]
    pub fn device_reachable(&self) -> bool {
        self.device_reachable
    }

    #[must_use]
    pub fn latest_snapshot(&self) -> Option<&StatusSnapshot> {
        self.snapshot.as_ref()
    }

    /// Drain buffered operator notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCall, MockDeviceApi, MockDeviceHandle, RecordedCall};
    use vigil_core::AdminMode;

    fn controller_with_store() -> (SetupController<MockDeviceApi>, MockDeviceHandle, FlagStore) {
        let (api, handle) = MockDeviceApi::new();
        let store = FlagStore::in_memory();
        (SetupController::new(api, store.clone()), handle, store)
    }

    fn controller() -> (SetupController<MockDeviceApi>, MockDeviceHandle) {
        let (controller, handle, _) = controller_with_store();
        (controller, handle)
    }

    #[tokio::test]
    async fn select_normalizes_aliases_and_persists_progress() {
        let (mut c, _handle, store) = controller_with_store();

        c.handle(Command::SelectStep("nfc".into())).await.unwrap();
        assert_eq!(c.current_step(), StepId::Sensors);

        let reloaded = VisitedStepTracker::load(store);
        assert!(reloaded.contains(StepId::Sensors));
        assert!(reloaded.step_touched());
    }

    #[tokio::test]
    async fn advance_stops_at_review() {
        let (mut c, _handle) = controller();
        for _ in 0..StepId::ALL.len() + 2 {
            c.handle(Command::AdvanceStep).await.unwrap();
        }
        assert_eq!(c.current_step(), StepId::Review);
    }

    #[tokio::test]
    async fn save_success_clears_dirty_and_refreshes() {
        let (mut c, handle) = controller();
        c.draft_mut().welcome_mut().admin_password = "hunter2-long".into();
        assert!(c.draft().is_dirty(StepId::Welcome));

        c.handle(Command::SaveStep).await.unwrap();

        assert!(!c.draft().is_dirty(StepId::Welcome));
        assert_eq!(c.take_notices(), vec!["Saved.".to_string()]);
        // Save emits its own refresh.
        assert_eq!(handle.call_count(MockCall::FetchStatus), 1);
        let (step, fields) = handle.last_save().unwrap();
        assert_eq!(step, StepId::Welcome);
        assert_eq!(fields["admin_web_password"], "hunter2-long");
    }

    #[tokio::test]
    async fn time_save_injects_epoch_only_when_syncing() {
        let (mut c, handle) = controller();
        c.handle(Command::SelectStep("time".into())).await.unwrap();

        c.handle(Command::SaveStep).await.unwrap();
        let (_, fields) = handle.last_save().unwrap();
        assert!(!fields.contains_key("rtc_set_epoch_s"));

        c.draft_mut().time_mut().sync_clock = true;
        c.handle(Command::SaveStep).await.unwrap();
        let (_, fields) = handle.last_save().unwrap();
        let epoch = fields["rtc_set_epoch_s"].as_i64().unwrap();
        assert!(epoch > 1_700_000_000);
    }

    #[tokio::test]
    async fn save_failure_keeps_draft_dirty() {
        let (mut c, handle) = controller();
        handle.fail_next(
            MockCall::SaveStep,
            ApiError::SaveFailed {
                detail: Some("sd mount failed".into()),
            },
        );
        c.draft_mut().storage_mut().sd_enabled = true;
        c.handle(Command::SelectStep("storage".into())).await.unwrap();

        c.handle(Command::SaveStep).await.unwrap();

        assert!(c.draft().is_dirty(StepId::Storage));
        assert_eq!(
            c.take_notices(),
            vec!["Save failed. Settings were not saved. (sd mount failed)".to_string()]
        );
    }

    #[tokio::test]
    async fn session_error_on_save_expires_the_session() {
        let (mut c, handle) = controller();
        handle.fail_next(MockCall::SaveStep, ApiError::AdminTokenInvalid);

        c.handle(Command::SaveStep).await.unwrap();

        assert!(!c.is_authenticated());
        assert_eq!(
            c.take_notices(),
            vec!["Admin session expired. Log in again.".to_string()]
        );
    }

    #[tokio::test]
    async fn complete_blocked_locally_sends_nothing() {
        let (mut c, handle) = controller();

        c.handle(Command::CompleteSetup).await.unwrap();

        assert_eq!(handle.call_count(MockCall::CompleteSetup), 0);
        let notices = c.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(!notices[0].is_empty());
    }

    #[tokio::test]
    async fn provisioning_requires_authenticated_session() {
        let (mut c, handle) = controller();

        c.handle(Command::StartProvisioning).await.unwrap();

        assert_eq!(handle.call_count(MockCall::StartProvisioning), 0);
        assert_eq!(
            c.take_notices(),
            vec!["Admin Authenticated required.".to_string()]
        );
        assert_eq!(c.provisioning_stage(), ProvisioningStage::Idle);
    }

    #[tokio::test]
    async fn login_then_snapshot_elevates_the_session() {
        let (mut c, handle) = controller();
        handle.set_status(StatusSnapshot {
            admin_mode: AdminMode::Authenticated,
            admin_mode_remaining_s: 600,
            ..StatusSnapshot::default()
        });

        c.handle(Command::AdminLogin {
            password: "hunter2-long".into(),
        })
        .await
        .unwrap();

        assert!(c.is_authenticated());
        assert_eq!(c.admin_status_text(), "Admin: Authenticated (600s)");
        assert!(matches!(
            handle.calls().first(),
            Some(RecordedCall::AdminLogin { .. })
        ));
    }

    #[tokio::test]
    async fn failed_login_leaves_session_down() {
        let (mut c, handle) = controller();
        handle.fail_next(MockCall::AdminLogin, ApiError::BadRequest("nope".into()));

        c.handle(Command::AdminLogin {
            password: "wrong".into(),
        })
        .await
        .unwrap();

        assert!(!c.is_authenticated());
        assert_eq!(c.take_notices(), vec!["Login failed.".to_string()]);
        // No refresh on a failed login.
        assert_eq!(handle.call_count(MockCall::FetchStatus), 0);
    }

    #[tokio::test]
    async fn first_snapshot_resumes_device_step() {
        let (mut c, _handle) = controller();

        c.apply_snapshot(StatusSnapshot {
            setup_last_step: "storage".into(),
            ..StatusSnapshot::default()
        })
        .unwrap();

        assert_eq!(c.current_step(), StepId::Storage);
        assert!(c.device_reachable());
    }

    #[tokio::test]
    async fn operator_navigation_beats_device_resume() {
        let (mut c, _handle) = controller();
        c.handle(Command::SelectStep("network".into())).await.unwrap();

        c.apply_snapshot(StatusSnapshot {
            setup_last_step: "storage".into(),
            ..StatusSnapshot::default()
        })
        .unwrap();

        assert_eq!(c.current_step(), StepId::Network);
    }

    #[tokio::test]
    async fn later_snapshots_never_move_the_step() {
        let (mut c, _handle) = controller();
        c.apply_snapshot(StatusSnapshot {
            setup_last_step: "time".into(),
            ..StatusSnapshot::default()
        })
        .unwrap();
        c.apply_snapshot(StatusSnapshot {
            setup_last_step: "review".into(),
            ..StatusSnapshot::default()
        })
        .unwrap();

        assert_eq!(c.current_step(), StepId::Time);
    }

    #[tokio::test]
    async fn restart_resets_progress_and_draft() {
        let (mut c, handle, store) = controller_with_store();
        c.draft_mut().welcome_mut().admin_password = "hunter2-long".into();
        c.handle(Command::SelectStep("review".into())).await.unwrap();
        c.handle(Command::SaveStep).await.unwrap();

        c.handle(Command::RestartSetup).await.unwrap();

        assert_eq!(c.current_step(), StepId::Welcome);
        assert!(c.draft().welcome().admin_password.is_empty());
        let reloaded = VisitedStepTracker::load(store);
        assert!(reloaded.visited().is_empty());
        assert!(!reloaded.step_touched());
        let (step, fields) = handle
            .calls()
            .iter()
            .find_map(|call| match call {
                RecordedCall::SaveStep { step, fields } if fields.contains_key("setup_completed") => {
                    Some((*step, fields.clone()))
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(step, StepId::Welcome);
        assert_eq!(fields["setup_completed"], false);
    }

    #[tokio::test]
    async fn unreachable_device_flips_the_reachable_flag() {
        let (mut c, handle) = controller();
        c.apply_snapshot(StatusSnapshot::default()).unwrap();
        assert!(c.device_reachable());

        handle.fail_next(
            MockCall::SaveStep,
            ApiError::Unreachable("connect timeout".into()),
        );
        c.handle(Command::SaveStep).await.unwrap();
        // Save failed before any refresh happened.
        assert!(c.device_reachable());

        handle.fail_next(
            MockCall::FetchStatus,
            ApiError::Unreachable("connect timeout".into()),
        );
        c.handle(Command::SaveStep).await.unwrap();
        assert!(!c.device_reachable());
    }
}
