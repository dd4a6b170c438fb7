//! GPIO pin-conflict detection.
//!
//! Independently configured subsystems (SD chip-select, NFC reader lines,
//! the LD2410B radar UART, alarm outputs) all draw from the same GPIO
//! space. Detection runs over the complete current draft every time a
//! relevant field changes, so a misassignment is caught before a save is
//! attempted, not after the device has applied half a configuration.

use std::collections::HashMap;
use vigil_core::{policy, snapshot::gpio_from_raw};

/// Whether a role only listens on its pin or must drive a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalDirection {
    Input,
    Output,
}

/// One subsystem's claim on a GPIO pin.
///
/// Constructors take the raw device representation where a negative number
/// means "not used"; such claims are carried but never conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinClaim {
    role: String,
    pin: Option<u8>,
    direction: SignalDirection,
}

impl PinClaim {
    /// Claim by a role that only reads its pin.
    #[must_use]
    pub fn input(role: impl Into<String>, raw_pin: i32) -> Self {
        PinClaim {
            role: role.into(),
            pin: gpio_from_raw(raw_pin),
            direction: SignalDirection::Input,
        }
    }

    /// Claim by a role that must drive the pin (chip selects, TX lines,
    /// alarm outputs).
    #[must_use]
    pub fn output(role: impl Into<String>, raw_pin: i32) -> Self {
        PinClaim {
            role: role.into(),
            pin: gpio_from_raw(raw_pin),
            direction: SignalDirection::Output,
        }
    }

    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    #[must_use]
    pub fn pin(&self) -> Option<u8> {
        self.pin
    }

    #[must_use]
    pub fn direction(&self) -> SignalDirection {
        self.direction
    }
}

/// Ordered, human-readable conflict lines; empty means the draft is clean.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    lines: Vec<String>,
}

impl ConflictReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// All lines joined with `"; "`, the form the completion hint embeds.
    #[must_use]
    pub fn summary(&self) -> String {
        self.lines.join("; ")
    }
}

/// Check a claim set for double-claimed pins and output roles on
/// input-only pins.
///
/// Reported order is deterministic: double-claim lines first, in the order
/// the contested pin first appeared in `claims`, then input-only lines in
/// claim order. A pin can appear in both categories.
///
/// # Examples
///
/// ```
/// use vigil_wizard::pins::{PinClaim, detect_conflicts};
///
/// let report = detect_conflicts(&[
///     PinClaim::output("SD CS", 13),
///     PinClaim::output("NFC CS", 13),
/// ]);
/// assert_eq!(report.lines(), ["GPIO 13 used by SD CS + NFC CS"]);
/// ```
#[must_use]
pub fn detect_conflicts(claims: &[PinClaim]) -> ConflictReport {
    let mut seen_order: Vec<u8> = Vec::new();
    let mut roles_by_pin: HashMap<u8, Vec<&str>> = HashMap::new();
    for claim in claims {
        let Some(pin) = claim.pin else { continue };
        let roles = roles_by_pin.entry(pin).or_default();
        if roles.is_empty() {
            seen_order.push(pin);
        }
        roles.push(claim.role());
    }

    let mut lines = Vec::new();
    for pin in seen_order {
        let roles = &roles_by_pin[&pin];
        if roles.len() > 1 {
            lines.push(format!("GPIO {pin} used by {}", roles.join(" + ")));
        }
    }

    for claim in claims {
        if claim.direction == SignalDirection::Output
            && let Some(pin) = claim.pin
            && policy::is_input_only_gpio(pin)
        {
            lines.push(format!("{} uses input-only GPIO {pin}", claim.role()));
        }
    }

    ConflictReport { lines }
}
