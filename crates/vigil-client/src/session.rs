//! Client-side record of the elevated admin session.
//!
//! The device is the authority on admin mode: it reports the current
//! mode and the seconds remaining in every status document. This record
//! pairs that report with the token obtained at login. The two must
//! agree for the session to count as authenticated, so a token that the
//! device has already timed out never gates anything open.

use vigil_core::{AdminMode, AdminToken};

/// Token custody plus the device-reported admin mode.
#[derive(Debug, Clone, Default)]
pub struct AdminSession {
    token: Option<AdminToken>,
    mode: AdminMode,
    remaining_s: u32,
}

impl AdminSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the token issued by a successful login.
    pub fn establish(&mut self, token: AdminToken) {
        self.token = Some(token);
    }

    /// Fold in the mode the device reported with its latest status.
    ///
    /// The token is dropped as soon as the device reports the mode Off;
    /// it could never be presented successfully again.
    pub fn apply_device_mode(&mut self, mode: AdminMode, remaining_s: u32) {
        self.mode = mode;
        self.remaining_s = remaining_s;
        if self.mode == AdminMode::Off {
            self.token = None;
        }
    }

    /// Drop the token, typically after the device rejected it.
    pub fn clear(&mut self) {
        self.token = None;
    }

    /// True only while a token is held AND the device still reports the
    /// session as authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.mode.is_authenticated()
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub fn mode(&self) -> AdminMode {
        self.mode
    }

    #[must_use]
    pub fn remaining_s(&self) -> u32 {
        self.remaining_s
    }

    /// Operator-facing admin line, matching the status document's wording.
    #[must_use]
    pub fn status_text(&self) -> String {
        match self.mode {
            AdminMode::Eligible => format!("Admin: Eligible ({}s)", self.remaining_s),
            AdminMode::Authenticated => format!("Admin: Authenticated ({}s)", self.remaining_s),
            AdminMode::Off => "Admin: Off".to_string(),
        }
    }
}
