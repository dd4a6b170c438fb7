//! Credential and GPIO capability rules shared by the wizard and the gate.

use crate::constants::{
    FACTORY_AP_PASSWORD_PREFIX, INPUT_ONLY_GPIO_MAX, INPUT_ONLY_GPIO_MIN, MIN_PASSWORD_LENGTH,
};

/// True when the admin web password meets the minimum policy.
///
/// Length is counted in Unicode scalar values, matching what the device
/// firmware accepts.
#[must_use]
pub fn acceptable_admin_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

/// True when the AP password counts as "changed from factory default".
///
/// The device ships with an auto-generated `ChangeMe-<suffix>` password.
/// A value that still carries the factory prefix is not a change, however
/// long it is.
#[must_use]
pub fn non_default_ap_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
        && !password.starts_with(FACTORY_AP_PASSWORD_PREFIX)
}

/// True when at least one primary (motion or door) sensor is enabled.
#[must_use]
pub fn primary_sensor_enabled(motion: bool, door: bool) -> bool {
    motion || door
}

/// True for ESP32 pins that cannot drive an output level.
#[must_use]
pub fn is_input_only_gpio(pin: u8) -> bool {
    (INPUT_ONLY_GPIO_MIN..=INPUT_ONLY_GPIO_MAX).contains(&pin)
}
