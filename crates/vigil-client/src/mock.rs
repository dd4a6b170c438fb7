//! Mock device implementation for testing and development.
//!
//! This module provides a simulated security device that can be
//! controlled programmatically, so the controller and poller can be
//! exercised without network access to real hardware.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Map, Value};

use crate::api::{ApiError, DeviceApi};
use vigil_core::{AdminToken, ProvisioningMode, StatusSnapshot, StepId};

/// Identifies one [`DeviceApi`] method for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    FetchStatus,
    SaveStep,
    CompleteSetup,
    AdminLogin,
    AdminLogout,
    StartProvisioning,
    StopProvisioning,
}

/// One recorded [`DeviceApi`] invocation, with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    FetchStatus,
    SaveStep {
        step: StepId,
        fields: Map<String, Value>,
    },
    CompleteSetup,
    AdminLogin {
        password: String,
    },
    AdminLogout,
    StartProvisioning {
        mode: ProvisioningMode,
    },
    StopProvisioning,
}

#[derive(Debug, Default)]
struct MockState {
    /// Status returned by `fetch_status` once the queue is drained.
    current: StatusSnapshot,

    /// Upcoming statuses, consumed one per fetch.
    queued: VecDeque<StatusSnapshot>,

    /// Single-shot failures, removed when they fire.
    planned_failures: HashMap<MockCall, ApiError>,

    /// Every call made against the device, in order.
    calls: Vec<RecordedCall>,

    /// Counter for issued admin tokens.
    token_seq: u32,
}

/// Mock security device for testing and development.
///
/// The device half implements [`DeviceApi`]; the handle half scripts its
/// behavior. Both share the same state, so a test can keep steering the
/// device after the controller has taken ownership of its clone.
///
/// # Examples
///
/// ```
/// use vigil_client::{DeviceApi, MockDeviceApi};
/// use vigil_core::StatusSnapshot;
///
/// #[tokio::main]
/// async fn main() {
///     let (device, handle) = MockDeviceApi::new();
///
///     handle.set_status(StatusSnapshot {
///         setup_last_step: "sensors".to_string(),
///         ..StatusSnapshot::default()
///     });
///
///     let snapshot = device.fetch_status().await.unwrap();
///     assert_eq!(snapshot.setup_last_step, "sensors");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockDeviceApi {
    state: Arc<Mutex<MockState>>,
}

impl MockDeviceApi {
    /// Create a mock device together with its scripting handle.
    ///
    /// The device starts with a default (factory-fresh) status document
    /// and no planned failures.
    pub fn new() -> (Self, MockDeviceHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        let device = Self {
            state: Arc::clone(&state),
        };
        let handle = MockDeviceHandle { state };
        (device, handle)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // Test double; recover rather than poison-cascade.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_failure(state: &mut MockState, call: MockCall) -> Option<ApiError> {
        state.planned_failures.remove(&call)
    }
}

impl DeviceApi for MockDeviceApi {
    async fn fetch_status(&self) -> Result<StatusSnapshot, ApiError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::FetchStatus);
        if let Some(error) = Self::take_failure(&mut state, MockCall::FetchStatus) {
            return Err(error);
        }
        if let Some(next) = state.queued.pop_front() {
            state.current = next;
        }
        Ok(state.current.clone())
    }

    async fn save_step(&self, step: StepId, fields: Map<String, Value>) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::SaveStep { step, fields });
        match Self::take_failure(&mut state, MockCall::SaveStep) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn complete_setup(&self) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::CompleteSetup);
        match Self::take_failure(&mut state, MockCall::CompleteSetup) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn admin_login(&self, password: &str) -> Result<AdminToken, ApiError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::AdminLogin {
            password: password.to_string(),
        });
        if let Some(error) = Self::take_failure(&mut state, MockCall::AdminLogin) {
            return Err(error);
        }
        state.token_seq += 1;
        Ok(AdminToken::new(format!("mock-token-{}", state.token_seq)))
    }

    async fn admin_logout(&self) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::AdminLogout);
        match Self::take_failure(&mut state, MockCall::AdminLogout) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn start_provisioning(&self, mode: ProvisioningMode) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::StartProvisioning { mode });
        match Self::take_failure(&mut state, MockCall::StartProvisioning) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn stop_provisioning(&self) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::StopProvisioning);
        match Self::take_failure(&mut state, MockCall::StopProvisioning) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Handle for scripting a [`MockDeviceApi`].
///
/// Cloneable; all clones steer the same device.
#[derive(Debug, Clone)]
pub struct MockDeviceHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockDeviceHandle {
    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the status the device reports, discarding any queue.
    pub fn set_status(&self, snapshot: StatusSnapshot) {
        let mut state = self.lock();
        state.queued.clear();
        state.current = snapshot;
    }

    /// Queue a status to be reported by the next fetch. Once the queue
    /// drains, the device keeps reporting the last queued status.
    pub fn push_status(&self, snapshot: StatusSnapshot) {
        self.lock().queued.push_back(snapshot);
    }

    /// Make the next invocation of `call` fail with `error`. Later
    /// invocations succeed again.
    pub fn fail_next(&self, call: MockCall, error: ApiError) {
        self.lock().planned_failures.insert(call, error);
    }

    /// All calls made against the device so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Forget the recorded calls (scripted statuses are kept).
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Number of recorded calls of the kind identified by `call`.
    #[must_use]
    pub fn call_count(&self, call: MockCall) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|recorded| {
                matches!(
                    (recorded, call),
                    (RecordedCall::FetchStatus, MockCall::FetchStatus)
                        | (RecordedCall::SaveStep { .. }, MockCall::SaveStep)
                        | (RecordedCall::CompleteSetup, MockCall::CompleteSetup)
                        | (RecordedCall::AdminLogin { .. }, MockCall::AdminLogin)
                        | (RecordedCall::AdminLogout, MockCall::AdminLogout)
                        | (
                            RecordedCall::StartProvisioning { .. },
                            MockCall::StartProvisioning
                        )
                        | (RecordedCall::StopProvisioning, MockCall::StopProvisioning)
                )
            })
            .count()
    }

    /// The most recent save request, if any.
    #[must_use]
    pub fn last_save(&self) -> Option<(StepId, Map<String, Value>)> {
        self.lock().calls.iter().rev().find_map(|call| match call {
            RecordedCall::SaveStep { step, fields } => Some((*step, fields.clone())),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot_on_step(step: &str) -> StatusSnapshot {
        StatusSnapshot {
            setup_last_step: step.to_string(),
            ..StatusSnapshot::default()
        }
    }

    #[tokio::test]
    async fn test_mock_reports_scripted_status() {
        let (device, handle) = MockDeviceApi::new();
        handle.set_status(snapshot_on_step("storage"));

        let fetched = device.fetch_status().await.unwrap();
        assert_eq!(fetched.setup_last_step, "storage");
    }

    #[tokio::test]
    async fn test_mock_queue_advances_then_repeats() {
        let (device, handle) = MockDeviceApi::new();

        handle.push_status(snapshot_on_step("welcome"));
        handle.push_status(snapshot_on_step("network"));

        assert_eq!(device.fetch_status().await.unwrap().setup_last_step, "welcome");
        assert_eq!(device.fetch_status().await.unwrap().setup_last_step, "network");
        // Queue drained; the last status sticks.
        assert_eq!(device.fetch_status().await.unwrap().setup_last_step, "network");
    }

    #[tokio::test]
    async fn test_planned_failure_fires_once() {
        let (device, handle) = MockDeviceApi::new();
        handle.fail_next(MockCall::SaveStep, ApiError::SaveFailed { detail: None });

        let fields = Map::new();
        assert!(device.save_step(StepId::Welcome, fields.clone()).await.is_err());
        assert!(device.save_step(StepId::Welcome, fields).await.is_ok());
    }

    #[tokio::test]
    async fn test_calls_are_recorded_in_order() {
        let (device, handle) = MockDeviceApi::new();

        device.fetch_status().await.unwrap();
        let mut fields = Map::new();
        fields.insert("sd_enabled".to_string(), json!(true));
        device.save_step(StepId::Storage, fields.clone()).await.unwrap();
        device.admin_login("hunter2hunter2").await.unwrap();

        let calls = handle.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], RecordedCall::FetchStatus);
        assert_eq!(
            calls[1],
            RecordedCall::SaveStep {
                step: StepId::Storage,
                fields
            }
        );
        assert_eq!(
            calls[2],
            RecordedCall::AdminLogin {
                password: "hunter2hunter2".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_call_count_and_last_save() {
        let (device, handle) = MockDeviceApi::new();

        let mut fields = Map::new();
        fields.insert("horn_enabled".to_string(), json!(true));
        device.save_step(StepId::Outputs, Map::new()).await.unwrap();
        device.save_step(StepId::Outputs, fields.clone()).await.unwrap();

        assert_eq!(handle.call_count(MockCall::SaveStep), 2);
        assert_eq!(handle.call_count(MockCall::CompleteSetup), 0);
        assert_eq!(handle.last_save(), Some((StepId::Outputs, fields)));
    }

    #[tokio::test]
    async fn test_login_issues_distinct_tokens() {
        let (device, _handle) = MockDeviceApi::new();

        let first = device.admin_login("pw-not-checked").await.unwrap();
        let second = device.admin_login("pw-not-checked").await.unwrap();
        assert_ne!(first, second);
    }
}
