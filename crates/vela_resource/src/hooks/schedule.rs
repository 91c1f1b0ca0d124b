//! Schedule markers for resource lifecycle events.
//!
//! A schedule is identified by a marker type wrapped in a [`ScheduleId`].
//! Use the markers with [`register_observer::<OnInvocationStart>`](super::ResourceHooks::register_observer),
//! or with a tuple of markers to observe several schedules at once.
//!
//! # Pure Markers
//!
//! Schedule markers carry no data. Event data is provided via the unified
//! [`ResourceEvent`](super::events::ResourceEvent) enum, which all hooks receive.

use core::any::TypeId;
use variadics_please::all_tuples;

/// Identifier for a hook schedule, derived from a marker type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ScheduleId {
    /// Creates a `ScheduleId` for the given schedule marker type.
    #[must_use]
    pub fn of<S: Schedule>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            type_name: S::NAME,
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the marker's short name, e.g. `OnInvocationStart`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Schedule Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Marker trait for schedule types.
pub trait Schedule: 'static {
    /// Short name used in hook names and error messages.
    const NAME: &'static str;
}

/// Trait for types that can be converted into a list of schedule IDs.
///
/// Implemented for single schedules and tuples of schedules.
pub trait IntoScheduleIds {
    /// Returns the schedule IDs for this type.
    fn schedule_ids() -> Vec<ScheduleId>;
}

impl<S: Schedule> IntoScheduleIds for S {
    fn schedule_ids() -> Vec<ScheduleId> {
        vec![ScheduleId::of::<S>()]
    }
}

macro_rules! impl_into_schedule_ids_for_tuple {
    ($($S:ident),*) => {
        impl<$($S: Schedule),*> IntoScheduleIds for ($($S,)*) {
            fn schedule_ids() -> Vec<ScheduleId> {
                vec![$(ScheduleId::of::<$S>()),*]
            }
        }
    };
}

all_tuples!(impl_into_schedule_ids_for_tuple, 2, 7, S);

macro_rules! schedule_marker {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name;
        impl Schedule for $name {
            const NAME: &'static str = stringify!($name);
        }
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// Invocation Schedules
// ─────────────────────────────────────────────────────────────────────────────

schedule_marker!(
    /// Marker type for hooks called when the scheduler starts a loader invocation.
    ///
    /// Event data: [`ResourceEvent::InvocationStart`](super::events::ResourceEvent::InvocationStart)
    OnInvocationStart
);

schedule_marker!(
    /// Marker type for hooks called after a failed attempt, including the last one.
    ///
    /// Event data: [`ResourceEvent::AttemptFailed`](super::events::ResourceEvent::AttemptFailed)
    OnAttemptFailed
);

schedule_marker!(
    /// Marker type for hooks called once an invocation's outcome has been
    /// written to the store.
    ///
    /// Event data: [`ResourceEvent::InvocationSettled`](super::events::ResourceEvent::InvocationSettled)
    OnInvocationSettled
);

// ─────────────────────────────────────────────────────────────────────────────
// Scheduling Schedules
// ─────────────────────────────────────────────────────────────────────────────

schedule_marker!(
    /// Marker type for hooks called when a trigger arrives while an invocation
    /// is in flight and does not start one.
    ///
    /// Event data: [`ResourceEvent::TriggerDropped`](super::events::ResourceEvent::TriggerDropped)
    OnTriggerDropped
);

schedule_marker!(
    /// Marker type for hooks called when an outcome from a superseded
    /// invocation is discarded.
    ///
    /// Event data: [`ResourceEvent::StaleResult`](super::events::ResourceEvent::StaleResult)
    OnStaleResult
);

// ─────────────────────────────────────────────────────────────────────────────
// Controller Schedules
// ─────────────────────────────────────────────────────────────────────────────

schedule_marker!(
    /// Marker type for hooks called after `set` or `update` changed the value.
    ///
    /// Event data: [`ResourceEvent::LocalMutation`](super::events::ResourceEvent::LocalMutation)
    OnLocalMutation
);

schedule_marker!(
    /// Marker type for hooks called once when the resource is disposed.
    ///
    /// Event data: [`ResourceEvent::Disposed`](super::events::ResourceEvent::Disposed)
    OnDisposed
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_id_equality() {
        assert_eq!(
            ScheduleId::of::<OnInvocationStart>(),
            ScheduleId::of::<OnInvocationStart>()
        );
        assert_ne!(
            ScheduleId::of::<OnInvocationStart>(),
            ScheduleId::of::<OnDisposed>()
        );
    }

    #[test]
    fn schedule_id_type_name_is_short() {
        assert_eq!(
            ScheduleId::of::<OnTriggerDropped>().type_name(),
            "OnTriggerDropped"
        );
    }

    #[test]
    fn schedule_id_type_id() {
        assert_eq!(
            ScheduleId::of::<OnStaleResult>().type_id(),
            TypeId::of::<OnStaleResult>()
        );
    }

    #[test]
    fn into_schedule_ids_tuple_keeps_order() {
        let ids = <(OnInvocationStart, OnAttemptFailed, OnInvocationSettled)>::schedule_ids();
        assert_eq!(
            ids,
            vec![
                ScheduleId::of::<OnInvocationStart>(),
                ScheduleId::of::<OnAttemptFailed>(),
                ScheduleId::of::<OnInvocationSettled>(),
            ]
        );
    }
}
