//! Durable wizard-progress storage.
//!
//! Setup progress must survive client restarts: which steps the operator
//! has seen, and which completion conditions have ever been satisfied.
//! This crate provides that persistence as an injected capability:
//!
//! - [`PersistentStore`] - the storage trait, with [`MemoryStore`] and
//!   [`JsonFileStore`] backends
//! - [`FlagStore`] - cloneable handle sharing one backend between trackers
//! - [`VisitedStepTracker`] - persisted visited-step set + step-touched flag
//! - [`CompletionFlagTracker`] - the three sticky completion flags
//!
//! # Examples
//!
//! ```
//! use vigil_core::StepId;
//! use vigil_store::{CompletionFlagTracker, FlagStore, VisitedStepTracker};
//!
//! # fn main() -> Result<(), vigil_store::StoreError> {
//! let store = FlagStore::in_memory();
//! let mut visited = VisitedStepTracker::load(store.clone());
//! let flags = CompletionFlagTracker::new(store);
//!
//! visited.mark_visited(StepId::Welcome)?;
//! flags.update_admin_password("hunter2hunter2", true)?;
//!
//! assert!(visited.contains(StepId::Welcome));
//! assert!(flags.read().admin_password_set);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod flags;
pub mod store;
pub mod visited;

pub use error::{StoreError, StoreResult};
pub use flags::{CompletionFlagTracker, KEY_ADMIN_PW_SET, KEY_AP_PW_SET, KEY_PRIMARY_SENSOR};
pub use store::{FlagStore, JsonFileStore, MemoryStore, PersistentStore};
pub use visited::{KEY_STEP_TOUCHED, KEY_VISITED_STEPS, VisitedStepTracker};
