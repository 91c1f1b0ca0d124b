//! Reactive request sources for Vela (Layer 1).
//!
//! `vela_source` provides the inputs a resource controller reacts to, and the
//! join that turns several of them into a single request tuple.
//!
//! # Core Concepts
//!
//! - [`Source`] - A value that changes over time and can be subscribed to
//! - [`Signal`] - Writable, cloneable source (a form field, a page number, ...)
//! - [`Constant`] - Source that holds one value forever
//! - [`RequestSources`] - Tuples of sources that can be joined
//! - [`Combined`] - The combine-latest join over a tuple of sources
//!
//! # Example
//!
//! ```
//! use vela_source::{RequestSources, Signal};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let page = Signal::with_value(1_u32);
//! let query = Signal::<String>::new();
//!
//! let mut combined = (page.clone(), query.clone()).combine();
//! assert_eq!(combined.current(), None); // `query` is still cold
//!
//! query.set("rust".to_owned());
//! assert_eq!(combined.next().await, Some((1, "rust".to_owned())));
//!
//! page.set(2);
//! assert_eq!(combined.next().await, Some((2, "rust".to_owned())));
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Layer 1** (`vela_source`): request sources and the combinator (this crate)
//! - **Layer 2** (`vela_resource`): scheduler, state store and controller

/// The combine-latest join over tuples of sources.
pub mod combine;

/// Source trait and the built-in source types.
pub mod signal;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::combine::{Combined, CombinedStream, RequestSources};
    pub use crate::signal::{Constant, Signal, Source};
}

pub use combine::{Combined, CombinedStream, RequestSources};
pub use signal::{Constant, Signal, Source};
