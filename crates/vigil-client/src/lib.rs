//! Controller tier for the Vigil setup wizard.
//!
//! This crate connects the pure wizard logic to a live device. It defines
//! the [`DeviceApi`] seam over the device's HTTP surface, the
//! [`SetupController`] that executes operator [`Command`]s against it, and
//! the [`StatusPoller`] that keeps a status snapshot flowing in the
//! background.
//!
//! # Design Philosophy
//!
//! - **Async-first**: the device seam uses native async in traits
//!   (Rust 1.90 + Edition 2024 RPITIT), with `Send` futures so pollers
//!   can run on the multi-threaded runtime.
//! - **Single writer**: one [`SetupController`] owns all mutable wizard
//!   state; the rendering layer reads from it and sends it commands.
//! - **Notices, not panics**: device-side failures surface as operator
//!   notices; only local persistence errors propagate as `Err`.
//!
//! # Command Flow
//!
//! ```no_run
//! use vigil_client::{Command, MockDeviceApi, SetupController};
//! use vigil_store::FlagStore;
//!
//! #[tokio::main]
//! async fn main() -> vigil_store::StoreResult<()> {
//!     let (api, _device) = MockDeviceApi::new();
//!     let mut controller = SetupController::new(api, FlagStore::in_memory());
//!
//!     controller.handle(Command::SelectStep("network".into())).await?;
//!     controller.handle(Command::SaveStep).await?;
//!
//!     for notice in controller.take_notices() {
//!         println!("{notice}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Mock Implementations
//!
//! [`MockDeviceApi`] ships with the crate so embedders can test their
//! own flows without a device on the bench.

pub mod api;
pub mod controller;
pub mod mock;
pub mod poller;
pub mod session;

// Re-export commonly used types for convenience
pub use api::{ApiError, DeviceApi};
pub use controller::{Command, SetupController};
pub use mock::{MockCall, MockDeviceApi, MockDeviceHandle, RecordedCall};
pub use poller::{DEFAULT_POLL_INTERVAL, PollEvent, PollerHandle, StatusPoller};
pub use session::AdminSession;
