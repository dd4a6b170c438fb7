//! Background status polling.
//!
//! A [`StatusPoller`] owns its own [`DeviceApi`] instance and fetches
//! the device status on a fixed cadence, emitting one [`PollEvent`] per
//! cycle into an mpsc channel:
//!
//! ```text
//! ┌─────────────┐  fetch   ┌────────┐  PollEvent   ┌──────────────┐
//! │ Poll Task   │─────────►│ Device │─────────────►│ Embedder     │
//! │ (JoinSet)   │          └────────┘              │ loop         │
//! │ sleep/wake  │◄─────────────────────────────────│ trigger_now  │
//! └─────────────┘                                  └──────────────┘
//! ```
//!
//! Cycles never overlap: the fetch is awaited before the next tick is
//! armed, so a slow device stretches the cadence instead of stacking
//! requests. [`PollerHandle::trigger_now`] skips the remainder of the
//! current wait; wakes that arrive while a cycle is already due merge
//! into a single extra cycle.
//!
//! The embedding layer owns the [`SetupController`](crate::SetupController)
//! and feeds received snapshots to it:
//!
//! ```no_run
//! use vigil_client::{MockDeviceApi, PollEvent, SetupController, StatusPoller};
//! use vigil_store::FlagStore;
//!
//! #[tokio::main]
//! async fn main() -> vigil_store::StoreResult<()> {
//!     let (api, _device) = MockDeviceApi::new();
//!     let mut controller = SetupController::new(api.clone(), FlagStore::in_memory());
//!
//!     let mut poller = StatusPoller::new(api).start();
//!     while let Some(event) = poller.recv().await {
//!         match event {
//!             PollEvent::Status(snapshot) => controller.apply_snapshot(snapshot)?,
//!             PollEvent::Unreachable(_) => {}
//!         }
//!     }
//!
//!     poller.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use vigil_core::StatusSnapshot;
use vigil_core::constants::DEFAULT_POLL_INTERVAL_MS;

use crate::api::{ApiError, DeviceApi};

/// Cadence used by [`StatusPoller::new`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);

const EVENT_CHANNEL_CAPACITY: usize = 8;

/// Outcome of one poll cycle.
#[derive(Debug)]
pub enum PollEvent {
    /// A status document arrived.
    Status(StatusSnapshot),

    /// The fetch failed; the device may be rebooting or off-network.
    Unreachable(ApiError),
}

/// Periodic status fetcher. Built, then consumed by [`start`](Self::start).
pub struct StatusPoller<D> {
    api: D,
    interval: Duration,
}

impl<D: DeviceApi + Send + 'static> StatusPoller<D> {
    /// Poller over `api` at the default cadence.
    #[must_use]
    pub fn new(api: D) -> Self {
        Self::with_interval(api, DEFAULT_POLL_INTERVAL)
    }

    #[must_use]
    pub fn with_interval(api: D, interval: Duration) -> Self {
        StatusPoller { api, interval }
    }

    /// Spawn the poll task and return the handle for consuming events.
    ///
    /// The first cycle runs immediately.
    #[must_use]
    pub fn start(self) -> PollerHandle {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (wake_tx, wake_rx) = mpsc::channel(1);

        let mut tasks = JoinSet::new();
        tasks.spawn(Self::poll_task(self.api, self.interval, event_tx, wake_rx));

        PollerHandle {
            event_rx,
            wake_tx,
            tasks,
        }
    }

    async fn poll_task(
        api: D,
        interval: Duration,
        event_tx: mpsc::Sender<PollEvent>,
        mut wake_rx: mpsc::Receiver<()>,
    ) {
        loop {
            let event = match api.fetch_status().await {
                Ok(snapshot) => PollEvent::Status(snapshot),
                Err(err) => PollEvent::Unreachable(err),
            };
            if event_tx.send(event).await.is_err() {
                debug!("poll event channel closed, stopping");
                break;
            }

            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                woke = wake_rx.recv() => {
                    if woke.is_none() {
                        debug!("poller handle dropped, stopping");
                        break;
                    }
                }
            }
        }
    }
}

/// Handle over the running poll task.
pub struct PollerHandle {
    event_rx: mpsc::Receiver<PollEvent>,
    wake_tx: mpsc::Sender<()>,
    tasks: JoinSet<()>,
}

impl PollerHandle {
    /// Receive the next poll outcome.
    ///
    /// Returns `None` once the poll task has terminated and the channel
    /// has drained.
    pub async fn recv(&mut self) -> Option<PollEvent> {
        self.event_rx.recv().await
    }

    /// Request an immediate cycle instead of waiting out the interval.
    ///
    /// Wakes merge: several triggers before the next cycle produce one
    /// extra cycle, not several.
    pub fn trigger_now(&self) {
        let _ = self.wake_tx.try_send(());
    }

    /// Abort the poll task and wait for it to terminate.
    pub async fn shutdown(mut self) {
        self.tasks.abort_all();
        while let Some(result) = self.tasks.join_next().await {
            if let Err(err) = result
                && err.is_panic()
            {
                warn!(error = %err, "poll task panicked during shutdown");
            }
        }
    }
}
