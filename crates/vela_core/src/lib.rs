//! Core infrastructure for Vela.
//!
//! Resources log through [`tracing`] and never install a subscriber
//! themselves. Applications call [`TracingSetup::init`] once at startup to
//! choose a level, a filter and an output format.
//!
//! ```
//! use vela_core::{TracingFormat, TracingSetup};
//! use tracing::Level;
//!
//! TracingSetup::new()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .with_env_filter("vela_resource=debug,todos=info")
//!     .init();
//! ```

/// Tracing subscriber setup.
pub mod subscriber;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::subscriber::{TracingFormat, TracingSetup};
}

pub use subscriber::{TracingFormat, TracingSetup};
