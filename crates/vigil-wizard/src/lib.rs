//! Setup-wizard logic for the Vigil security device.
//!
//! This crate is the pure half of the first-run wizard: step ordering and
//! alias normalization, the unsaved configuration draft, GPIO pin-conflict
//! detection, and the completion gate that decides when "Complete setup"
//! may be offered. Nothing here performs I/O; the controller crate feeds
//! these types from device snapshots and persists their outputs.
//!
//! # Example
//!
//! ```
//! use vigil_wizard::{CompletionGate, GateInputs, SetupDraft, StepSequencer, detect_conflicts};
//! use vigil_core::CompletionFlags;
//!
//! let mut sequencer = StepSequencer::new();
//! sequencer.select("nfc"); // legacy alias
//! assert_eq!(sequencer.current().as_str(), "sensors");
//!
//! let draft = SetupDraft::new();
//! let report = detect_conflicts(&draft.pin_claims());
//! let verdict = CompletionGate::evaluate(&GateInputs {
//!     current: sequencer.current(),
//!     all_visited: false,
//!     flags: CompletionFlags::default(),
//!     conflicts: &report,
//! });
//! assert!(!verdict.can_complete);
//! ```

pub mod draft;
pub mod gate;
pub mod pins;
pub mod steps;

pub use draft::{
    NetworkDraft, OutputsDraft, SensorsDraft, SetupDraft, StorageDraft, TimeDraft, WelcomeDraft,
};
pub use gate::{CompletionGate, GateInputs, GateVerdict};
pub use pins::{ConflictReport, PinClaim, SignalDirection, detect_conflicts};
pub use steps::{STEP_ALIASES, StepSequencer};
