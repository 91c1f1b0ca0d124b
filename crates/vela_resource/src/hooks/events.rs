//! Unified event enum for resource lifecycle hooks.
//!
//! All hooks receive `&ResourceEvent` and can match on variants for typed access.
//!
//! # Example
//!
//! ```
//! use vela_resource::hooks::ResourceEvent;
//!
//! fn handle_event(event: &ResourceEvent) {
//!     match event {
//!         ResourceEvent::AttemptFailed { attempt, max_attempts, error, .. } => {
//!             eprintln!("attempt {attempt}/{max_attempts} failed: {error}");
//!         }
//!         ResourceEvent::InvocationSettled { status, duration, .. } => {
//!             println!("settled as {status} in {duration:?}");
//!         }
//!         _ => {}
//!     }
//! }
//! # let _ = handle_event;
//! ```

use core::fmt;
use core::time::Duration;

use super::schedule::{
    OnAttemptFailed, OnDisposed, OnInvocationSettled, OnInvocationStart, OnLocalMutation,
    OnStaleResult, OnTriggerDropped, ScheduleId,
};
use crate::error::LoadError;
use crate::id::{InvocationId, ResourceId};
use crate::state::ResourceStatus;

/// Which local mutation produced a [`ResourceEvent::LocalMutation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalMutation {
    /// `set(data)`.
    Set,
    /// `update(f)`.
    Update,
}

impl fmt::Display for LocalMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalMutation::Set => f.write_str("set"),
            LocalMutation::Update => f.write_str("update"),
        }
    }
}

/// Unified event enum for all resource lifecycle hooks.
#[derive(Debug, Clone)]
pub enum ResourceEvent {
    // ─────────────────────────────────────────────────────────────────────────
    // Invocation Events
    // ─────────────────────────────────────────────────────────────────────────
    /// A loader invocation started.
    InvocationStart {
        /// The resource.
        resource: ResourceId,
        /// The new invocation.
        invocation: InvocationId,
    },

    /// An attempt failed. Fired for every failed attempt, the last included.
    AttemptFailed {
        /// The resource.
        resource: ResourceId,
        /// The invocation the attempt belongs to.
        invocation: InvocationId,
        /// One-based attempt number.
        attempt: u32,
        /// Attempts allowed per invocation.
        max_attempts: u32,
        /// Why the attempt failed.
        error: LoadError,
    },

    /// An invocation's outcome was written to the store.
    InvocationSettled {
        /// The resource.
        resource: ResourceId,
        /// The settled invocation.
        invocation: InvocationId,
        /// `Loaded` or `Error`.
        status: ResourceStatus,
        /// Attempts made.
        attempts: u32,
        /// Time from invocation start to settlement.
        duration: Duration,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Scheduling Events
    // ─────────────────────────────────────────────────────────────────────────
    /// A trigger arrived while busy and did not start an invocation.
    TriggerDropped {
        /// The resource.
        resource: ResourceId,
        /// The invocation in flight.
        in_flight: InvocationId,
        /// Whether a trailing invocation was scheduled in its place.
        deferred: bool,
    },

    /// An outcome was discarded because its invocation was superseded.
    StaleResult {
        /// The resource.
        resource: ResourceId,
        /// The superseded invocation.
        invocation: InvocationId,
        /// The invocation the scheduler is waiting for, if any.
        current: Option<InvocationId>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Controller Events
    // ─────────────────────────────────────────────────────────────────────────
    /// The value was changed locally.
    LocalMutation {
        /// The resource.
        resource: ResourceId,
        /// Which operation changed it.
        mutation: LocalMutation,
    },

    /// The resource was disposed.
    Disposed {
        /// The resource.
        resource: ResourceId,
    },
}

impl ResourceEvent {
    /// Returns the schedule hooks for this event are registered on.
    #[must_use]
    pub fn schedule(&self) -> ScheduleId {
        match self {
            ResourceEvent::InvocationStart { .. } => ScheduleId::of::<OnInvocationStart>(),
            ResourceEvent::AttemptFailed { .. } => ScheduleId::of::<OnAttemptFailed>(),
            ResourceEvent::InvocationSettled { .. } => ScheduleId::of::<OnInvocationSettled>(),
            ResourceEvent::TriggerDropped { .. } => ScheduleId::of::<OnTriggerDropped>(),
            ResourceEvent::StaleResult { .. } => ScheduleId::of::<OnStaleResult>(),
            ResourceEvent::LocalMutation { .. } => ScheduleId::of::<OnLocalMutation>(),
            ResourceEvent::Disposed { .. } => ScheduleId::of::<OnDisposed>(),
        }
    }

    /// Returns the schedule name for this event variant.
    #[must_use]
    pub fn schedule_name(&self) -> &'static str {
        self.schedule().type_name()
    }

    /// Returns the resource the event belongs to.
    #[must_use]
    pub fn resource(&self) -> &ResourceId {
        match self {
            ResourceEvent::InvocationStart { resource, .. }
            | ResourceEvent::AttemptFailed { resource, .. }
            | ResourceEvent::InvocationSettled { resource, .. }
            | ResourceEvent::TriggerDropped { resource, .. }
            | ResourceEvent::StaleResult { resource, .. }
            | ResourceEvent::LocalMutation { resource, .. }
            | ResourceEvent::Disposed { resource } => resource,
        }
    }

    /// Returns the invocation the event refers to, if any.
    #[must_use]
    pub fn invocation(&self) -> Option<InvocationId> {
        match self {
            ResourceEvent::InvocationStart { invocation, .. }
            | ResourceEvent::AttemptFailed { invocation, .. }
            | ResourceEvent::InvocationSettled { invocation, .. }
            | ResourceEvent::StaleResult { invocation, .. } => Some(*invocation),
            ResourceEvent::TriggerDropped { in_flight, .. } => Some(*in_flight),
            ResourceEvent::LocalMutation { .. } | ResourceEvent::Disposed { .. } => None,
        }
    }
}

impl fmt::Display for ResourceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceEvent::InvocationStart {
                resource,
                invocation,
            } => write!(f, "InvocationStart({} @ {})", invocation, resource),
            ResourceEvent::AttemptFailed {
                resource,
                invocation,
                attempt,
                max_attempts,
                error,
            } => write!(
                f,
                "AttemptFailed({} @ {}, attempt: {}/{}, error: {})",
                invocation, resource, attempt, max_attempts, error
            ),
            ResourceEvent::InvocationSettled {
                resource,
                invocation,
                status,
                attempts,
                duration,
            } => write!(
                f,
                "InvocationSettled({} @ {}, status: {}, attempts: {}, duration: {:?})",
                invocation, resource, status, attempts, duration
            ),
            ResourceEvent::TriggerDropped {
                resource,
                in_flight,
                deferred,
            } => write!(
                f,
                "TriggerDropped({}, in_flight: {}, deferred: {})",
                resource, in_flight, deferred
            ),
            ResourceEvent::StaleResult {
                resource,
                invocation,
                current,
            } => match current {
                Some(current) => write!(
                    f,
                    "StaleResult({} @ {}, current: {})",
                    invocation, resource, current
                ),
                None => write!(f, "StaleResult({} @ {})", invocation, resource),
            },
            ResourceEvent::LocalMutation { resource, mutation } => {
                write!(f, "LocalMutation({}, {})", resource, mutation)
            }
            ResourceEvent::Disposed { resource } => write!(f, "Disposed({})", resource),
        }
    }
}
