pub mod constants;
pub mod error;
pub mod state;
pub mod types;

pub use error::{Error, Result};
pub use state::{BuzzerUpdate, DeviceState, LedUpdate, StateUpdate};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
