//! Sticky completion flags.
//!
//! Three conditions gate the end of setup: an acceptable admin password, an
//! AP password changed away from the factory default, and at least one
//! primary sensor enabled. Each is persisted as a sticky flag: once a
//! condition has been observed true it stays true across revisits and
//! restarts of the client, even if the operator later blanks the field it
//! was derived from. Password inputs are never redisplayed, so a revisited
//! step presents empty fields; without stickiness every revisit would
//! re-block completion.

use crate::error::StoreResult;
use crate::store::FlagStore;
use vigil_core::{CompletionFlags, policy};

/// Key for the "admin password set" flag.
pub const KEY_ADMIN_PW_SET: &str = "setup_admin_pw_set_v1";

/// Key for the "AP password changed" flag.
pub const KEY_AP_PW_SET: &str = "setup_ap_pw_set_v1";

/// Key for the "primary sensor enabled" flag.
pub const KEY_PRIMARY_SENSOR: &str = "setup_primary_sensor_enabled_v1";

/// Tracker for the three persisted completion conditions.
///
/// Every `update_*` method takes `only_set_true`. The normal call path
/// passes `true`: a satisfied condition persists the flag, an unsatisfied
/// one leaves the persisted value alone. Passing `false` makes the update
/// bidirectional, clearing the flag when the condition fails; only
/// explicit reset paths use that.
#[derive(Debug, Clone)]
pub struct CompletionFlagTracker {
    store: FlagStore,
}

impl CompletionFlagTracker {
    #[must_use]
    pub fn new(store: FlagStore) -> Self {
        CompletionFlagTracker { store }
    }

    /// Re-evaluate the admin-password condition from the draft value.
    ///
    /// # Errors
    /// Returns [`crate::StoreError`] if persisting fails.
    pub fn update_admin_password(&self, password: &str, only_set_true: bool) -> StoreResult<()> {
        self.apply(
            KEY_ADMIN_PW_SET,
            policy::acceptable_admin_password(password),
            only_set_true,
        )
    }

    /// Re-evaluate the AP-password condition from the draft value.
    ///
    /// # Errors
    /// Returns [`crate::StoreError`] if persisting fails.
    pub fn update_ap_password(&self, password: &str, only_set_true: bool) -> StoreResult<()> {
        self.apply(
            KEY_AP_PW_SET,
            policy::non_default_ap_password(password),
            only_set_true,
        )
    }

    /// Re-evaluate the primary-sensor condition from the draft checkboxes.
    ///
    /// # Errors
    /// Returns [`crate::StoreError`] if persisting fails.
    pub fn update_primary_sensor(
        &self,
        motion: bool,
        door: bool,
        only_set_true: bool,
    ) -> StoreResult<()> {
        self.apply(
            KEY_PRIMARY_SENSOR,
            policy::primary_sensor_enabled(motion, door),
            only_set_true,
        )
    }

    fn apply(&self, key: &str, satisfied: bool, only_set_true: bool) -> StoreResult<()> {
        if satisfied {
            self.store.set_bool(key, true)
        } else if only_set_true {
            Ok(())
        } else {
            self.store.set_bool(key, false)
        }
    }

    /// Current persisted flags. Absent keys read as false.
    #[must_use]
    pub fn read(&self) -> CompletionFlags {
        CompletionFlags {
            admin_password_set: self.store.get_bool(KEY_ADMIN_PW_SET),
            ap_password_changed: self.store.get_bool(KEY_AP_PW_SET),
            primary_sensor_enabled: self.store.get_bool(KEY_PRIMARY_SENSOR),
        }
    }

    /// Clear all three flags; part of the setup-restart action.
    ///
    /// # Errors
    /// Returns [`crate::StoreError`] if clearing fails.
    pub fn reset(&self) -> StoreResult<()> {
        self.store.remove(KEY_ADMIN_PW_SET)?;
        self.store.remove(KEY_AP_PW_SET)?;
        self.store.remove(KEY_PRIMARY_SENSOR)
    }
}
