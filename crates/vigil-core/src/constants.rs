//! Core constants for the setup-wizard controller.
//!
//! This module centralizes the values the wizard shares with the device
//! firmware: the factory credential pattern, GPIO capability bounds, the
//! hardware pin defaults offered during provisioning, and client timing.
//!
//! # Factory credentials
//!
//! At first boot the device generates its access-point password as
//! `ChangeMe-<device suffix>`. Setup may not complete until the operator
//! replaces it, so "changed" is defined as: at least
//! [`MIN_PASSWORD_LENGTH`] characters and not starting with
//! [`FACTORY_AP_PASSWORD_PREFIX`]. Re-entering another `ChangeMe-…` value
//! does not count.
//!
//! # GPIO capability
//!
//! ESP32 pins 34-39 have no output driver. Any role that must drive a
//! level (chip selects, UART TX, alarm outputs) is rejected on those pins
//! by the conflict detector.
//!
//! # Usage
//!
//! ```
//! use vigil_core::constants::*;
//!
//! assert!(INPUT_ONLY_GPIO_MIN <= INPUT_ONLY_GPIO_MAX);
//! assert_eq!(FACTORY_AP_PASSWORD_PREFIX, "ChangeMe-");
//! ```

// ============================================================================
// Credential Policy
// ============================================================================

/// Prefix of the auto-generated factory AP password.
pub const FACTORY_AP_PASSWORD_PREFIX: &str = "ChangeMe-";

/// Minimum length for admin and AP passwords, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Default admin-mode session lifetime, in seconds.
pub const DEFAULT_ADMIN_TIMEOUT_S: u32 = 600;

// ============================================================================
// GPIO Capability
// ============================================================================

/// First pin of the input-only GPIO range.
pub const INPUT_ONLY_GPIO_MIN: u8 = 34;

/// Last pin of the input-only GPIO range.
pub const INPUT_ONLY_GPIO_MAX: u8 = 39;

// ============================================================================
// Hardware Defaults
// ============================================================================

/// Default SD card chip-select pin.
pub const DEFAULT_SD_CS_GPIO: u8 = 13;

/// Default NFC reader SPI chip-select pin.
pub const DEFAULT_NFC_CS_GPIO: u8 = 27;

/// Default NFC reader interrupt pin.
pub const DEFAULT_NFC_IRQ_GPIO: u8 = 32;

/// Default NFC reader reset pin.
pub const DEFAULT_NFC_RST_GPIO: u8 = 33;

/// Default LD2410B radar UART receive pin.
pub const DEFAULT_LD2410B_RX_GPIO: u8 = 16;

/// Default LD2410B radar UART transmit pin.
pub const DEFAULT_LD2410B_TX_GPIO: u8 = 17;

/// Default LD2410B radar UART baud rate.
pub const DEFAULT_LD2410B_BAUD: u32 = 256_000;

/// Default log retention on the storage backend, in days.
pub const DEFAULT_LOG_RETENTION_DAYS: u32 = 365;

// ============================================================================
// Client Timing
// ============================================================================

/// Default status poll interval, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
