//! Admin-card provisioning state machine.
//!
//! The device opens a provisioning window during which the next NFC card
//! presented becomes the new admin card. The device itself only reports
//! scan observations; this machine turns those observations into a
//! two-scan confirmation flow so one accidental tap cannot enroll a card.
//!
//! # Stages
//!
//! - `Idle`: no provisioning run in progress
//! - `WaitingFirst`: window open, waiting for the first tap
//! - `WaitingConfirm`: first tap seen, waiting for the confirming tap
//! - `Confirmed`: both taps seen; terminal until a new run begins
//!
//! # Valid Transitions
//!
//! - Idle → WaitingFirst (via [`ProvisioningMachine::begin`])
//! - WaitingFirst → WaitingConfirm (successful scan newer than the baseline)
//! - WaitingConfirm → Confirmed (successful scan newer than the first)
//! - WaitingFirst/WaitingConfirm → Idle (device closes the window)
//!
//! `Confirmed` is terminal: later observations never leave it, including
//! the device's own window teardown after enrollment.
//!
//! # Scan Markers
//!
//! The device reports each scan with a monotonic marker
//! ([`NfcStatus::last_scan_ms`]). A scan only counts if its marker is
//! strictly greater than what the machine has already seen, so the scan
//! that was on the wire when the window opened can never satisfy a tap.
//!
//! # Examples
//!
//! ```
//! use vigil_core::{CardRole, ScanResult, snapshot::NfcStatus};
//! use vigil_provision::{ProvisioningEvent, ProvisioningMachine, ProvisioningStage};
//!
//! let mut machine = ProvisioningMachine::new();
//! machine.begin(100);
//! assert_eq!(machine.stage(), ProvisioningStage::WaitingFirst);
//!
//! let status = NfcStatus {
//!     provisioning_active: true,
//!     last_scan_ms: 101,
//!     last_scan_result: ScanResult::Ok,
//!     last_role: CardRole::Admin,
//!     ..NfcStatus::default()
//! };
//! assert_eq!(
//!     machine.observe(&status),
//!     Some(ProvisioningEvent::FirstScanCaptured)
//! );
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use vigil_core::CardRole;
use vigil_core::snapshot::NfcStatus;

/// Maximum number of stage transitions to keep in history.
///
/// A full provisioning run is three transitions, so this retains roughly
/// ten runs for diagnostics without unbounded growth.
const MAX_HISTORY_SIZE: usize = 32;

/// Stages of the two-scan admin-card provisioning flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningStage {
    /// No provisioning run in progress.
    Idle,

    /// Window open; waiting for the first card tap.
    WaitingFirst,

    /// First tap recorded; waiting for the confirming tap.
    WaitingConfirm,

    /// Both taps recorded. Terminal until [`ProvisioningMachine::begin`]
    /// starts a new run.
    Confirmed,
}

impl ProvisioningStage {
    /// True while the machine is waiting on a tap.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        matches!(
            self,
            ProvisioningStage::WaitingFirst | ProvisioningStage::WaitingConfirm
        )
    }

    /// True once the run has finished successfully.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        *self == ProvisioningStage::Confirmed
    }
}

impl fmt::Display for ProvisioningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage_str = match self {
            ProvisioningStage::Idle => "idle",
            ProvisioningStage::WaitingFirst => "waiting_first",
            ProvisioningStage::WaitingConfirm => "waiting_confirm",
            ProvisioningStage::Confirmed => "confirmed",
        };
        write!(f, "{stage_str}")
    }
}

/// Notable outcomes of feeding one device observation to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningEvent {
    /// The first tap was captured; the same card must be tapped again.
    FirstScanCaptured,

    /// The confirming tap arrived; the card is enrolled with `role`.
    CardConfirmed { role: CardRole },

    /// The device closed the window before confirmation completed.
    WindowClosed,
}

/// A single stage transition with timestamp.
///
/// The `timestamp` field is not serialized as `Instant` is process-specific.
/// When deserializing, the timestamp is set to the time of deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTransition {
    /// The stage transitioned from.
    pub from: ProvisioningStage,

    /// The stage transitioned to.
    pub to: ProvisioningStage,

    /// When the transition occurred.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StageTransition {
    /// Create a new transition record stamped with the current time.
    pub fn new(from: ProvisioningStage, to: ProvisioningStage) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Get the duration since this transition occurred.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// State machine that drives the two-scan admin-card provisioning flow.
///
/// The machine never talks to the device. The caller opens the window
/// (and calls [`begin`](Self::begin) with the scan marker reported at
/// that moment), then feeds every polled [`NfcStatus`] through
/// [`observe`](Self::observe) and surfaces the returned events.
///
/// # Examples
///
/// ```
/// use vigil_core::{CardRole, ScanResult, snapshot::NfcStatus};
/// use vigil_provision::{ProvisioningEvent, ProvisioningMachine, ProvisioningStage};
///
/// let mut machine = ProvisioningMachine::new();
/// machine.begin(200);
///
/// let tap = |marker| NfcStatus {
///     provisioning_active: true,
///     last_scan_ms: marker,
///     last_scan_result: ScanResult::Ok,
///     last_role: CardRole::Admin,
///     ..NfcStatus::default()
/// };
///
/// machine.observe(&tap(201));
/// let event = machine.observe(&tap(202));
/// assert_eq!(
///     event,
///     Some(ProvisioningEvent::CardConfirmed { role: CardRole::Admin })
/// );
/// assert!(machine.stage().is_terminal());
/// ```
pub struct ProvisioningMachine {
    /// Current stage of the flow.
    stage: ProvisioningStage,

    /// Scan marker reported when the window was opened. Scans at or below
    /// this marker predate the run.
    baseline_marker: u64,

    /// Marker of the first accepted tap, once seen.
    first_scan_marker: Option<u64>,

    /// Role the device assigned to the confirmed card.
    confirmed_role: Option<CardRole>,

    /// History of stage transitions (limited to MAX_HISTORY_SIZE).
    history: VecDeque<StageTransition>,
}

impl ProvisioningMachine {
    /// Create a new machine in the Idle stage.
    pub fn new() -> Self {
        Self {
            stage: ProvisioningStage::Idle,
            baseline_marker: 0,
            first_scan_marker: None,
            confirmed_role: None,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Get the current stage.
    #[must_use]
    pub fn stage(&self) -> ProvisioningStage {
        self.stage
    }

    /// Marker of the first accepted tap, if the run has progressed that far.
    #[must_use]
    pub fn first_scan_marker(&self) -> Option<u64> {
        self.first_scan_marker
    }

    /// Role of the confirmed card, once the run has finished.
    #[must_use]
    pub fn confirmed_role(&self) -> Option<CardRole> {
        self.confirmed_role
    }

    /// Get a reference to the stage transition history, oldest first.
    pub fn history(&self) -> &VecDeque<StageTransition> {
        &self.history
    }

    /// Start a provisioning run.
    ///
    /// `baseline_marker` is the scan marker the device reported at the
    /// moment the window opened; only scans strictly newer than it count.
    /// Starting a run from any stage, including Confirmed, discards the
    /// previous run's markers.
    pub fn begin(&mut self, baseline_marker: u64) {
        self.baseline_marker = baseline_marker;
        self.first_scan_marker = None;
        self.confirmed_role = None;
        self.change_stage(ProvisioningStage::WaitingFirst);
    }

    /// Feed one polled NFC status through the machine.
    ///
    /// Returns the event this observation caused, if any. The device
    /// closing the window takes priority over scan processing: a status
    /// with `provisioning_active == false` aborts a waiting run even if
    /// the same status carries a fresh successful scan.
    pub fn observe(&mut self, status: &NfcStatus) -> Option<ProvisioningEvent> {
        if self.stage.is_waiting() && !status.provisioning_active {
            self.abort();
            return Some(ProvisioningEvent::WindowClosed);
        }

        match self.stage {
            ProvisioningStage::WaitingFirst => {
                if status.last_scan_ms > self.baseline_marker && status.last_scan_result.is_ok() {
                    self.first_scan_marker = Some(status.last_scan_ms);
                    self.change_stage(ProvisioningStage::WaitingConfirm);
                    return Some(ProvisioningEvent::FirstScanCaptured);
                }
                None
            }
            ProvisioningStage::WaitingConfirm => {
                let first = self.first_scan_marker?;
                if status.last_scan_ms > first && status.last_scan_result.is_ok() {
                    self.confirmed_role = Some(status.last_role);
                    self.change_stage(ProvisioningStage::Confirmed);
                    return Some(ProvisioningEvent::CardConfirmed {
                        role: status.last_role,
                    });
                }
                None
            }
            ProvisioningStage::Idle | ProvisioningStage::Confirmed => None,
        }
    }

    /// Forcefully return the machine to Idle, discarding any run in
    /// progress. Used for operator-driven resets and setup restarts.
    pub fn reset(&mut self) {
        self.abort();
    }

    /// Operator-facing description of the current stage.
    #[must_use]
    pub fn status_text(&self) -> String {
        match self.stage {
            ProvisioningStage::Idle => "Provisioning idle".to_string(),
            ProvisioningStage::WaitingFirst => "Tap the new admin card".to_string(),
            ProvisioningStage::WaitingConfirm => {
                "Tap the same card again to confirm".to_string()
            }
            ProvisioningStage::Confirmed => {
                let role = self.confirmed_role.unwrap_or_default();
                format!("Admin card confirmed ({role})")
            }
        }
    }

    fn abort(&mut self) {
        self.first_scan_marker = None;
        self.confirmed_role = None;
        if self.stage != ProvisioningStage::Idle {
            self.change_stage(ProvisioningStage::Idle);
        }
    }

    /// Perform the stage change and record it in history.
    fn change_stage(&mut self, to: ProvisioningStage) {
        let transition = StageTransition::new(self.stage, to);
        debug!(from = %transition.from, to = %transition.to, "provisioning stage changed");
        self.stage = to;
        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for ProvisioningMachine {
    fn default() -> Self {
        Self::new()
    }
}
