pub mod constants;
pub mod policy;
pub mod snapshot;
pub mod types;

pub use snapshot::{
    Ld2410bStatus, NfcStatus, OutputsStatus, SensorsStatus, StatusSnapshot, StorageStatus,
    gpio_from_raw,
};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
