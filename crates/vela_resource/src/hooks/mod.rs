//! Lifecycle hooks for resources.
//!
//! Hooks let callers observe what the scheduler and controller do without
//! touching the state stream: invocation starts, failed attempts, dropped
//! triggers, discarded stale results, local mutations and disposal.
//!
//! # Design Principles
//!
//! - Hooks execute in registration order
//! - Hooks never run while the state cell or the registry is locked, so a hook
//!   may read the controller and register or unregister hooks
//! - A panicking hook is logged and skipped; it never stalls the scheduler
//! - Primary use case: tracing, metrics, logging, debugging
//!
//! # Architecture
//!
//! - **Schedule markers** ([`schedule`]): Empty types that identify hook points
//! - **Events** ([`events`]): `ResourceEvent` enum carrying context to hooks
//! - **API** ([`api`]): Registration and invocation mechanism
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use vela_resource::hooks::{OnTriggerDropped, ResourceEvent, ResourceHooks};
//!
//! let hooks = Arc::new(ResourceHooks::new());
//! hooks.register_observer::<OnTriggerDropped, _>("dropped", |event: &ResourceEvent| {
//!     tracing::debug!(%event, "trigger dropped");
//! })?;
//! // pass `hooks` to `ResourceBuilder::hooks`
//! # Ok::<(), vela_resource::error::HookRegistrationError>(())
//! ```

pub mod api;
pub mod events;
pub mod schedule;

pub use api::{BoxedHook, ResourceHooks};
pub use events::{LocalMutation, ResourceEvent};
pub use schedule::{
    IntoScheduleIds, OnAttemptFailed, OnDisposed, OnInvocationSettled, OnInvocationStart,
    OnLocalMutation, OnStaleResult, OnTriggerDropped, Schedule, ScheduleId,
};
