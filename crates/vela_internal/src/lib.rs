//! # Vela Internal Library
//!
//! Re-exports the core Vela crates for convenience.

/// Layer 1: Request sources and the combine-latest join.
pub use vela_source as source;

/// Layer 2: Resource controller, scheduler and state store.
pub use vela_resource as resource;

/// Infrastructure: tracing subscriber setup.
pub use vela_core as telemetry;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use vela_core::prelude::*;
    pub use vela_resource::prelude::*;
    pub use vela_source::prelude::*;
}
