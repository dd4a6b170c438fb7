//! Admin-card provisioning flow for the Vigil security device.
//!
//! The device can open a short window during which a tapped NFC card is
//! enrolled as the admin card. This crate supplies the client-side state
//! machine that supervises the window: it requires the same card marker
//! progression twice (tap, then confirm) before treating the card as
//! enrolled, and it folds the device's own window teardown into the flow.
//!
//! See [`ProvisioningMachine`] for the flow itself.

pub mod machine;

pub use machine::{ProvisioningEvent, ProvisioningMachine, ProvisioningStage, StageTransition};
