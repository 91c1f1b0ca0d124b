//! Reactive resource controllers for Rust.
//!
//! Combine changing request sources, load asynchronously, observe one
//! consistent state.

pub use vela_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use vela_internal::prelude::*;
}
