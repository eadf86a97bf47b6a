//! testsel version information.
//!
//! The value is taken from Cargo metadata (`CARGO_PKG_VERSION`) at compile time.
//! Prefer this constant over repeating `env!("CARGO_PKG_VERSION")` in multiple places.

/// The testsel version string (for example, `0.1.0`).
pub const TESTSEL_VERSION: &str = env!("CARGO_PKG_VERSION");
