//! Device API trait definitions.
//!
//! This module defines the contract between the setup controller and the
//! security device's configuration interface. The trait keeps the
//! controller transport-agnostic and lets tests substitute the mock
//! device for the real one.
//!
//! Methods return explicitly `Send` futures (Rust 1.90 + Edition 2024
//! RPITIT) so the status poller can run an implementation on a spawned
//! task without the `async_trait` macro.

use std::future::Future;

use serde_json::{Map, Value};
use thiserror::Error;

use vigil_core::{AdminToken, ProvisioningMode, StatusSnapshot, StepId};

/// Errors that can occur when talking to the device.
///
/// The vocabulary mirrors the device's own error responses so the
/// controller can translate each into operator guidance.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The device could not be reached at all.
    #[error("Device unreachable: {0}")]
    Unreachable(String),

    /// The request needs an authenticated admin session.
    #[error("Admin session required")]
    AdminRequired,

    /// The admin token attached to the request was not accepted.
    #[error("Admin token rejected")]
    AdminTokenInvalid,

    /// The device refused to persist the step payload.
    #[error("Save rejected by the device")]
    SaveFailed { detail: Option<String> },

    /// The device-side completion gate rejected the finish request.
    #[error("Setup completion blocked: {reason}")]
    CompletionBlocked { reason: String },

    /// The device refused to open the provisioning window.
    #[error("Provisioning rejected: {reason}")]
    ProvisioningRejected { reason: String },

    /// The request was malformed.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    /// True when the failure means the admin session is gone and the
    /// operator must log in again.
    #[must_use]
    pub fn is_session_error(&self) -> bool {
        matches!(self, ApiError::AdminRequired | ApiError::AdminTokenInvalid)
    }
}

/// The device's configuration API as the setup wizard consumes it.
///
/// Implementations hold their own transport state, including the admin
/// credential obtained from [`admin_login`](DeviceApi::admin_login);
/// callers track the session separately for gating and display.
pub trait DeviceApi {
    /// Fetch the device's full status document.
    fn fetch_status(&self) -> impl Future<Output = Result<StatusSnapshot, ApiError>> + Send;

    /// Persist one wizard step's fields on the device.
    fn save_step(
        &self,
        step: StepId,
        fields: Map<String, Value>,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Ask the device to leave setup mode.
    fn complete_setup(&self) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Authenticate the admin password, returning the session token.
    fn admin_login(
        &self,
        password: &str,
    ) -> impl Future<Output = Result<AdminToken, ApiError>> + Send;

    /// End the admin session on the device.
    fn admin_logout(&self) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Ask the device to open a card-provisioning window.
    fn start_provisioning(
        &self,
        mode: ProvisioningMode,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Ask the device to close the card-provisioning window.
    fn stop_provisioning(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_errors_are_classified() {
        assert!(ApiError::AdminRequired.is_session_error());
        assert!(ApiError::AdminTokenInvalid.is_session_error());
        assert!(!ApiError::Unreachable("timeout".into()).is_session_error());
        assert!(
            !ApiError::SaveFailed {
                detail: None
            }
            .is_session_error()
        );
    }

    #[test]
    fn errors_render_device_vocabulary() {
        assert_eq!(
            ApiError::Unreachable("connection refused".into()).to_string(),
            "Device unreachable: connection refused"
        );
        assert_eq!(
            ApiError::CompletionBlocked {
                reason: "primary_sensor_required".into()
            }
            .to_string(),
            "Setup completion blocked: primary_sensor_required"
        );
    }
}
