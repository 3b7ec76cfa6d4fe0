//! Bus configuration
//!
//! A [`BusConfig`] fully describes one bit-banged bus: peripheral address,
//! line assignment and timing. With the `toml` feature it can be loaded
//! from a `[bus]` table.

#[cfg(feature = "toml")]
pub mod loader;
pub mod types;

#[cfg(feature = "toml")]
pub use loader::ConfigError;
pub use types::*;
