//! Warehouse Common
//!
//! Ambient infrastructure shared by the warehouse crates and binaries.

pub mod logging;

pub use logging::{init_logging, LogFormat};
