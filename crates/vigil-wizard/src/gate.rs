//! The completion gate.
//!
//! "Complete Setup" is permitted only on the last step, with every step
//! visited, all three completion flags satisfied, and a conflict-free pin
//! draft. The gate is a stateless evaluator over those inputs: callers
//! re-run it after every draft mutation and every status refresh, so its
//! verdict can never go stale.

use crate::pins::ConflictReport;
use vigil_core::{CompletionFlags, StepId};

/// Everything the gate looks at, gathered by the caller.
#[derive(Debug, Clone, Copy)]
pub struct GateInputs<'a> {
    pub current: StepId,
    pub all_visited: bool,
    pub flags: CompletionFlags,
    pub conflicts: &'a ConflictReport,
}

/// One evaluation: the decision and the operator-facing hint.
///
/// The hint is empty exactly when completion is permitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateVerdict {
    pub can_complete: bool,
    pub hint: String,
}

/// Stateless completion evaluator.
pub struct CompletionGate;

impl CompletionGate {
    /// Decide whether setup may complete and build the hint.
    #[must_use]
    pub fn evaluate(inputs: &GateInputs<'_>) -> GateVerdict {
        let on_last = inputs.current.is_last();
        let clean = inputs.conflicts.is_empty();
        let can_complete =
            on_last && inputs.all_visited && inputs.flags.all_set() && clean;

        GateVerdict {
            can_complete,
            hint: Self::hint(inputs, on_last),
        }
    }

    fn hint(inputs: &GateInputs<'_>, on_last: bool) -> String {
        if !on_last {
            return "Complete setup is available on the last step.".to_string();
        }

        let mut missing: Vec<&str> = Vec::new();
        if !inputs.all_visited {
            missing.push("visit all steps");
        }
        if !inputs.flags.admin_password_set {
            missing.push("set admin password");
        }
        if !inputs.flags.ap_password_changed {
            missing.push("change AP password from default");
        }
        if !inputs.flags.primary_sensor_enabled {
            missing.push("enable a primary sensor");
        }

        let base = if missing.is_empty() {
            String::new()
        } else {
            format!("To complete: {}.", missing.join(", "))
        };

        if inputs.conflicts.is_empty() {
            return base;
        }
        let conflict_msg = format!("Pin conflicts: {}.", inputs.conflicts.summary());
        if base.is_empty() {
            conflict_msg
        } else {
            format!("{base} {conflict_msg}")
        }
    }
}
