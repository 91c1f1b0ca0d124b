//! Reactive resource controller for Vela (Layer 2).
//!
//! A resource turns one or more changing request sources plus an async loader
//! into a single observable [`ResourceState`], together with controls to
//! reload, read and locally mutate the cached value.
//!
//! # Core Concepts
//!
//! - [`ResourceController`] - Handle to a running resource
//! - [`ResourceBuilder`] - Configures and spawns a resource
//! - [`ResourceState`] - `Loading`, `Loaded`, `Error` or `Local`
//! - [`Loader`] - Async producer of the resource's value
//! - [`StateStore`] - The cell every state change goes through
//! - [`ResourceHooks`] - Lifecycle callbacks for observability
//!
//! # Data Flow
//!
//! ```text
//! sources ──► combine ──► scheduler ──► loader ──► store ──► observers
//!                             ▲                      ▲
//!                  reload() ──┘       set()/update() ┘
//! ```
//!
//! The scheduler runs as one Tokio task per resource. Under the default
//! [`ConcurrencyPolicy::Exhaust`], at most one loader invocation is in flight
//! and triggers arriving meanwhile are dropped. Each invocation retries failed
//! attempts (two retries by default) under a per-attempt deadline (3000 ms by
//! default) before surfacing an `Error` state.
//!
//! # Example
//!
//! ```
//! use vela_resource::{ResourceState, create_resource};
//! use vela_source::Signal;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let limit = Signal::with_value(3_usize);
//! let todos = create_resource((limit.clone(),), |(limit,)| async move {
//!     if limit == 8 {
//!         return Err("error happened on the server");
//!     }
//!     Ok(vec!["write docs"; limit])
//! });
//!
//! assert_eq!(todos.settled().await.into_data().map(|todos| todos.len()), Some(3));
//!
//! // Drop the first todo without asking the server.
//! todos.update(|todos| todos[1..].to_vec());
//! assert!(matches!(todos.state(), ResourceState::Local { ref data } if data.len() == 2));
//! # }
//! ```

/// Resource configuration.
pub mod config;

/// The resource controller and its builder.
pub mod controller;

/// Error types.
pub mod error;

/// Lifecycle hooks.
pub mod hooks;

/// Resource and invocation identifiers.
pub mod id;

/// The loader contract.
pub mod loader;

/// Resource state values.
pub mod state;

/// The state store.
pub mod store;

mod scheduler;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::config::{ConcurrencyPolicy, ResourceConfig};
    pub use crate::controller::{ResourceBuilder, ResourceController, create_resource};
    pub use crate::error::{LoadError, ResourceError};
    pub use crate::hooks::{ResourceEvent, ResourceHooks};
    pub use crate::state::{ResourceState, ResourceStatus};
    pub use crate::store::StateStream;
}

pub use config::{ConcurrencyPolicy, ResourceConfig};
pub use controller::{ResourceBuilder, ResourceController, create_resource};
pub use error::{BoxError, ConfigError, HookRegistrationError, LoadError, ResourceError};
pub use hooks::{ResourceEvent, ResourceHooks};
pub use id::{InvocationId, ResourceId};
pub use loader::Loader;
pub use state::{ResourceState, ResourceStatus};
pub use store::{StateStore, StateStream};
