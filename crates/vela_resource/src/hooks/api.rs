//! Hook registration API for resource lifecycle events.
//!
//! [`ResourceHooks`] is a registry of observers keyed by schedule. One registry
//! can be shared by several resources through an `Arc`; every event carries
//! the [`ResourceId`](crate::id::ResourceId) it belongs to.
//!
//! # Multi-Schedule Registration
//!
//! Register hooks on multiple schedules using tuple syntax:
//!
//! ```
//! use vela_resource::hooks::{OnAttemptFailed, OnInvocationSettled, ResourceEvent, ResourceHooks};
//!
//! let hooks = ResourceHooks::new();
//! hooks.register_observer::<(OnAttemptFailed, OnInvocationSettled), _>(
//!     "tracker",
//!     |event: &ResourceEvent| match event {
//!         ResourceEvent::AttemptFailed { error, .. } => eprintln!("failed: {error}"),
//!         ResourceEvent::InvocationSettled { status, .. } => println!("settled: {status}"),
//!         _ => {}
//!     },
//! )?;
//! # Ok::<(), vela_resource::error::HookRegistrationError>(())
//! ```

use core::panic::AssertUnwindSafe;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use super::events::ResourceEvent;
use super::schedule::{IntoScheduleIds, ScheduleId};
use crate::error::HookRegistrationError;

// ─────────────────────────────────────────────────────────────────────────────
// BoxedHook
// ─────────────────────────────────────────────────────────────────────────────

/// Type-erased hook that receives `&ResourceEvent`.
///
/// Most users should use [`ResourceHooks::register_observer`] instead of
/// creating `BoxedHook` directly.
pub struct BoxedHook {
    handler: Box<dyn Fn(&ResourceEvent) + Send + Sync>,
}

impl BoxedHook {
    /// Wraps a handler.
    #[must_use]
    pub fn new(handler: impl Fn(&ResourceEvent) + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
        }
    }

    /// Invokes the hook with the given event.
    pub fn invoke(&self, event: &ResourceEvent) {
        (self.handler)(event);
    }
}

/// Entry in the hook registry.
struct HookEntry {
    /// Human-readable name for debugging and logging.
    name: Arc<str>,
    hook: Arc<BoxedHook>,
}

// ─────────────────────────────────────────────────────────────────────────────
// ResourceHooks
// ─────────────────────────────────────────────────────────────────────────────

/// Registry of lifecycle hooks for one or more resources.
///
/// # Thread Safety
///
/// Registration and invocation may happen concurrently; the registry uses
/// interior mutability via [`RwLock`]. Hooks run on the thread that produced
/// the event (the scheduler task, or the caller of `set`/`update`/`dispose`)
/// and should return quickly.
///
/// [`invoke`](Self::invoke) releases the lock before calling hooks, so a hook
/// may register or unregister hooks; the change applies from the next event.
/// A panicking hook is logged and skipped.
#[derive(Default)]
pub struct ResourceHooks {
    /// Maps schedule ID to a list of hook entries.
    hooks: RwLock<HashMap<ScheduleId, Vec<HookEntry>>>,
}

impl ResourceHooks {
    /// Creates a new empty hooks registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(HashMap::new()),
        }
    }

    /// Registers an observer hook for one or more schedules.
    ///
    /// When registered on several schedules, each entry is named
    /// `"{name}@{schedule}"`.
    ///
    /// # Errors
    ///
    /// Returns [`HookRegistrationError::DuplicateName`] if a hook with the
    /// same name already exists on one of the schedules. Schedules earlier in
    /// the tuple keep their registration.
    pub fn register_observer<S, F>(
        &self,
        name: impl Into<String>,
        hook: F,
    ) -> Result<&Self, HookRegistrationError>
    where
        S: IntoScheduleIds,
        F: Fn(&ResourceEvent) + Send + Sync + 'static,
    {
        let schedules = S::schedule_ids();
        let name = name.into();
        let hook = Arc::new(hook);

        for schedule in &schedules {
            let hook_name = if schedules.len() > 1 {
                format!("{}@{}", name, schedule.type_name())
            } else {
                name.clone()
            };
            let hook = Arc::clone(&hook);
            self.register_boxed(
                *schedule,
                hook_name,
                BoxedHook::new(move |event: &ResourceEvent| hook(event)),
            )?;
        }
        Ok(self)
    }

    /// Registers a pre-built [`BoxedHook`] for the given schedule.
    ///
    /// # Errors
    ///
    /// Returns [`HookRegistrationError::DuplicateName`] if the name is taken.
    pub fn register_boxed(
        &self,
        schedule: ScheduleId,
        name: impl Into<String>,
        hook: BoxedHook,
    ) -> Result<(), HookRegistrationError> {
        let name = name.into();

        let mut hooks = self.hooks.write();
        let entries = hooks.entry(schedule).or_default();

        if entries.iter().any(|entry| *entry.name == *name) {
            return Err(HookRegistrationError::DuplicateName {
                schedule: schedule.type_name(),
                name,
            });
        }

        entries.push(HookEntry {
            name: Arc::from(name),
            hook: Arc::new(hook),
        });
        Ok(())
    }

    /// Removes the named hook from a schedule. Returns `true` if it existed.
    pub fn unregister(&self, schedule: ScheduleId, name: &str) -> bool {
        let mut hooks = self.hooks.write();
        let Some(entries) = hooks.get_mut(&schedule) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| &*entry.name != name);
        before != entries.len()
    }

    /// Invokes all hooks registered for the event's schedule, in registration order.
    ///
    /// The hooks called are those registered when the event arrives. A hook
    /// that panics is logged and skipped; the remaining hooks still run.
    pub fn invoke(&self, event: &ResourceEvent) {
        let entries: Vec<(Arc<str>, Arc<BoxedHook>)> = {
            let hooks = self.hooks.read();
            let Some(entries) = hooks.get(&event.schedule()) else {
                return;
            };
            entries
                .iter()
                .map(|entry| (Arc::clone(&entry.name), Arc::clone(&entry.hook)))
                .collect()
        };

        for (name, hook) in entries {
            if std::panic::catch_unwind(AssertUnwindSafe(|| hook.invoke(event))).is_err() {
                tracing::error!(
                    hook = %name,
                    schedule = event.schedule_name(),
                    resource = %event.resource(),
                    "hook panicked, skipped"
                );
            }
        }
    }

    /// Returns the number of hooks registered for the given schedule.
    #[must_use]
    pub fn hook_count(&self, schedule: ScheduleId) -> usize {
        let hooks = self.hooks.read();
        hooks.get(&schedule).map_or(0, Vec::len)
    }

    /// Checks if a hook with the given name exists on the schedule.
    #[must_use]
    pub fn contains_hook(&self, schedule: ScheduleId, name: &str) -> bool {
        let hooks = self.hooks.read();
        hooks
            .get(&schedule)
            .is_some_and(|entries| entries.iter().any(|entry| &*entry.name == name))
    }
}

impl core::fmt::Debug for ResourceHooks {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let hooks = self.hooks.read();
        let mut map = f.debug_map();
        for (schedule, entries) in hooks.iter() {
            let names: Vec<&str> = entries.iter().map(|entry| &*entry.name).collect();
            map.entry(&schedule.type_name(), &names);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::schedule::{OnDisposed, OnInvocationStart, OnLocalMutation};
    use crate::id::{InvocationId, ResourceId};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn start() -> ResourceEvent {
        ResourceEvent::InvocationStart {
            resource: ResourceId::from_string("test"),
            invocation: InvocationId::new(1),
        }
    }

    fn disposed() -> ResourceEvent {
        ResourceEvent::Disposed {
            resource: ResourceId::from_string("test"),
        }
    }

    #[test]
    fn register_increments_count() {
        let hooks = ResourceHooks::new();
        let schedule = ScheduleId::of::<OnInvocationStart>();

        hooks
            .register_observer::<OnInvocationStart, _>("first", |_: &ResourceEvent| {})
            .expect("registration should succeed");
        assert_eq!(hooks.hook_count(schedule), 1);

        hooks
            .register_observer::<OnInvocationStart, _>("second", |_: &ResourceEvent| {})
            .expect("registration should succeed");
        assert_eq!(hooks.hook_count(schedule), 2);
    }

    #[test]
    fn invoke_calls_hooks_in_order() {
        let hooks = ResourceHooks::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            hooks
                .register_observer::<OnInvocationStart, _>(name, move |_: &ResourceEvent| {
                    order.lock().unwrap().push(name);
                })
                .expect("registration should succeed");
        }

        hooks.invoke(&start());
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn invoke_only_reaches_matching_schedule() {
        let hooks = ResourceHooks::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        hooks
            .register_observer::<OnDisposed, _>("count", move |_: &ResourceEvent| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        hooks.invoke(&start());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        hooks.invoke(&disposed());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let hooks = ResourceHooks::new();
        hooks
            .register_observer::<OnDisposed, _>("my_hook", |_: &ResourceEvent| {})
            .unwrap();

        let result = hooks.register_observer::<OnDisposed, _>("my_hook", |_: &ResourceEvent| {});
        match result {
            Err(HookRegistrationError::DuplicateName { schedule, name }) => {
                assert_eq!(schedule, "OnDisposed");
                assert_eq!(name, "my_hook");
            }
            Ok(_) => panic!("expected DuplicateName error"),
        }
    }

    #[test]
    fn same_name_different_schedules_allowed() {
        let hooks = ResourceHooks::new();
        hooks
            .register_observer::<OnDisposed, _>("logger", |_: &ResourceEvent| {})
            .unwrap()
            .register_observer::<OnLocalMutation, _>("logger", |_: &ResourceEvent| {})
            .unwrap();

        assert_eq!(hooks.hook_count(ScheduleId::of::<OnDisposed>()), 1);
        assert_eq!(hooks.hook_count(ScheduleId::of::<OnLocalMutation>()), 1);
    }

    #[test]
    fn multi_schedule_observer_gets_suffixed_names() {
        let hooks = ResourceHooks::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        hooks
            .register_observer::<(OnInvocationStart, OnDisposed), _>(
                "tracker",
                move |event: &ResourceEvent| {
                    seen_clone.lock().unwrap().push(event.schedule_name());
                },
            )
            .unwrap();

        assert!(hooks.contains_hook(ScheduleId::of::<OnInvocationStart>(), "tracker@OnInvocationStart"));
        assert!(hooks.contains_hook(ScheduleId::of::<OnDisposed>(), "tracker@OnDisposed"));

        hooks.invoke(&start());
        hooks.invoke(&disposed());
        assert_eq!(*seen.lock().unwrap(), vec!["OnInvocationStart", "OnDisposed"]);
    }

    #[test]
    fn unregister_removes_hook() {
        let hooks = ResourceHooks::new();
        let schedule = ScheduleId::of::<OnDisposed>();
        hooks
            .register_observer::<OnDisposed, _>("gone", |_: &ResourceEvent| {})
            .unwrap();

        assert!(hooks.unregister(schedule, "gone"));
        assert!(!hooks.unregister(schedule, "gone"));
        assert!(!hooks.contains_hook(schedule, "gone"));
        assert_eq!(hooks.hook_count(schedule), 0);
    }

    #[test]
    fn panicking_hook_is_skipped() {
        let hooks = ResourceHooks::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let before = Arc::clone(&order);
        let after = Arc::clone(&order);
        hooks
            .register_observer::<OnInvocationStart, _>("before", move |_: &ResourceEvent| {
                before.lock().unwrap().push("before");
            })
            .unwrap()
            .register_observer::<OnInvocationStart, _>("explodes", |_: &ResourceEvent| {
                panic!("hook exploded");
            })
            .unwrap()
            .register_observer::<OnInvocationStart, _>("after", move |_: &ResourceEvent| {
                after.lock().unwrap().push("after");
            })
            .unwrap();

        hooks.invoke(&start());
        hooks.invoke(&start());
        assert_eq!(
            *order.lock().unwrap(),
            vec!["before", "after", "before", "after"]
        );
    }

    #[test]
    fn hook_can_register_and_unregister_hooks() {
        let hooks = Arc::new(ResourceHooks::new());
        let schedule = ScheduleId::of::<OnInvocationStart>();

        let registry = Arc::clone(&hooks);
        hooks
            .register_observer::<OnInvocationStart, _>("once", move |_: &ResourceEvent| {
                registry.unregister(ScheduleId::of::<OnInvocationStart>(), "once");
                registry
                    .register_observer::<OnDisposed, _>("added", |_: &ResourceEvent| {})
                    .unwrap();
            })
            .unwrap();

        hooks.invoke(&start());
        assert!(!hooks.contains_hook(schedule, "once"));
        assert!(hooks.contains_hook(ScheduleId::of::<OnDisposed>(), "added"));

        // The removed hook is not called again.
        hooks.invoke(&start());
        assert_eq!(hooks.hook_count(schedule), 0);
    }

    #[test]
    fn invoke_unknown_schedule_is_noop() {
        ResourceHooks::new().invoke(&disposed());
    }
}
