//! The state store: one addressable cell of [`ResourceState`].
//!
//! The scheduler and local mutations write through the same store, so the
//! synchronous [`read`](StateStore::read) and the [`observe`](StateStore::observe)
//! stream never disagree about the latest value.
//!
//! # Consistency
//!
//! Every write happens under the cell's write lock and is published on the
//! change feed before the lock is released. `observe` clones the current value
//! and subscribes under the read lock, so an observer sees the value it was
//! created with followed by every later change, with no overlap and no gap.

use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::RwLock;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::state::ResourceState;

/// Stream of resource states: the current one first, then every change.
pub type StateStream<T> = BoxStream<'static, ResourceState<T>>;

struct Cell<T> {
    state: ResourceState<T>,
    /// Bumped on every write.
    generation: u64,
    /// `None` once disposed.
    changes: Option<broadcast::Sender<ResourceState<T>>>,
}

/// A single mutable cell of [`ResourceState`] with a replay-of-one change feed.
pub struct StateStore<T> {
    cell: RwLock<Cell<T>>,
}

impl<T> StateStore<T> {
    /// Applies `f` to the latest state without cloning it.
    pub fn inspect<R>(&self, f: impl FnOnce(&ResourceState<T>) -> R) -> R {
        f(&self.cell.read().state)
    }

    /// Number of writes applied so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.cell.read().generation
    }

    /// Closes the change feed and rejects further writes.
    ///
    /// Returns `true` the first time it is called.
    pub fn dispose(&self) -> bool {
        self.cell.write().changes.take().is_some()
    }

    /// Returns `true` once [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.cell.read().changes.is_none()
    }
}

impl<T> StateStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a store in the `Loading` state.
    ///
    /// `history_capacity` is the number of changes an observer may fall behind
    /// by before it starts skipping. Values below one are raised to one.
    #[must_use]
    pub fn new(history_capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(history_capacity.max(1));
        Self {
            cell: RwLock::new(Cell {
                state: ResourceState::Loading,
                generation: 0,
                changes: Some(changes),
            }),
        }
    }

    /// Returns a clone of the latest state.
    #[must_use]
    pub fn read(&self) -> ResourceState<T> {
        self.cell.read().state.clone()
    }

    /// Returns a stream of the current state followed by every later change.
    ///
    /// The stream ends, and stays ended, when the store is disposed. An
    /// observer that falls more than `history_capacity` changes behind skips
    /// ahead to the oldest change still retained.
    #[must_use]
    pub fn observe(&self) -> StateStream<T> {
        let cell = self.cell.read();
        let current = stream::once(future::ready(cell.state.clone()));
        let Some(changes) = &cell.changes else {
            return current.boxed();
        };
        let receiver = changes.subscribe();
        drop(cell);

        let changes = stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(state) => return Some((state, receiver)),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "state observer lagged behind, skipping changes");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        });
        current.chain(changes).fuse().boxed()
    }

    /// Replaces the state. Returns `false` if the store is disposed.
    pub fn replace(&self, state: ResourceState<T>) -> bool {
        let mut cell = self.cell.write();
        Self::write(&mut cell, state)
    }

    /// Replaces the state with `Local { data }`.
    pub fn set(&self, data: T) -> bool {
        self.replace(ResourceState::Local { data })
    }

    /// Replaces the carried data with `Local { f(data) }`.
    ///
    /// Returns `false` without calling `f` if the state carries no data or
    /// the store is disposed. `f` runs outside the cell lock; if another
    /// write lands while it runs, that write wins and `false` is returned.
    pub fn update(&self, f: impl FnOnce(T) -> T) -> bool {
        let (data, generation) = {
            let cell = self.cell.read();
            if cell.changes.is_none() {
                return false;
            }
            match cell.state.data() {
                Some(data) => (data.clone(), cell.generation),
                None => return false,
            }
        };

        let data = f(data);

        let mut cell = self.cell.write();
        if cell.generation != generation {
            tracing::debug!("local update lost to a concurrent write");
            return false;
        }
        Self::write(&mut cell, ResourceState::Local { data })
    }

    /// Starts a load: writes `Loading`, unless the store has never been
    /// written and already holds its initial `Loading`.
    ///
    /// Returns `true` if a `Loading` state was published.
    pub(crate) fn begin_loading(&self) -> bool {
        let mut cell = self.cell.write();
        if cell.generation == 0 && cell.state.is_loading() {
            return false;
        }
        Self::write(&mut cell, ResourceState::Loading)
    }

    fn write(cell: &mut Cell<T>, state: ResourceState<T>) -> bool {
        let Some(changes) = &cell.changes else {
            tracing::warn!(status = %state.status(), "write to a disposed resource ignored");
            return false;
        };
        // No observers is not an error.
        changes.send(state.clone()).ok();
        cell.state = state;
        cell.generation += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::state::ResourceStatus;
    use futures::FutureExt;

    fn drain<T>(stream: &mut StateStream<T>) -> Vec<ResourceState<T>> {
        let mut seen = Vec::new();
        while let Some(Some(state)) = stream.next().now_or_never() {
            seen.push(state);
        }
        seen
    }

    #[test]
    fn starts_loading() {
        let store = StateStore::<i32>::new(4);
        assert_eq!(store.read(), ResourceState::Loading);
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn set_then_read_returns_local() {
        let store = StateStore::new(4);
        assert!(store.set(7));
        assert_eq!(store.read(), ResourceState::Local { data: 7 });
    }

    #[test]
    fn update_applies_to_loaded_data() {
        let store = StateStore::new(4);
        store.replace(ResourceState::Loaded { data: vec![1, 2, 3] });

        assert!(store.update(|items| items.into_iter().filter(|n| *n != 2).collect()));
        assert_eq!(store.read(), ResourceState::Local { data: vec![1, 3] });
    }

    #[test]
    fn update_without_data_is_a_noop() {
        let store = StateStore::<i32>::new(4);
        let mut called = false;
        assert!(!store.update(|n| {
            called = true;
            n + 1
        }));
        assert!(!called);
        assert_eq!(store.generation(), 0);

        store.replace(ResourceState::Error {
            error: LoadError::loader("down"),
        });
        assert!(!store.update(|n| n + 1));
        assert_eq!(store.read().status(), ResourceStatus::Error);
    }

    #[test]
    fn observe_replays_current_then_changes() {
        let store = StateStore::new(4);
        store.replace(ResourceState::Loaded { data: 1 });

        let mut observer = store.observe();
        store.set(2);
        store.replace(ResourceState::Loading);

        assert_eq!(
            drain(&mut observer),
            vec![
                ResourceState::Loaded { data: 1 },
                ResourceState::Local { data: 2 },
                ResourceState::Loading,
            ]
        );
    }

    #[test]
    fn observers_see_the_same_changes() {
        let store = StateStore::new(4);
        let mut first = store.observe();
        let mut second = store.observe();
        store.set(1);

        assert_eq!(drain(&mut first), drain(&mut second));
    }

    #[test]
    fn begin_loading_adopts_initial_state_once() {
        let store = StateStore::<i32>::new(4);
        let mut observer = store.observe();

        assert!(!store.begin_loading(), "initial Loading is adopted");
        store.replace(ResourceState::Loaded { data: 1 });
        assert!(store.begin_loading());

        assert_eq!(
            drain(&mut observer),
            vec![
                ResourceState::Loading,
                ResourceState::Loaded { data: 1 },
                ResourceState::Loading,
            ]
        );
    }

    #[test]
    fn begin_loading_after_local_write_publishes() {
        let store = StateStore::new(4);
        store.set(3);
        assert!(store.begin_loading());
        assert!(store.read().is_loading());
    }

    #[test]
    fn dispose_ends_observers_and_rejects_writes() {
        let store = StateStore::new(4);
        let mut observer = store.observe();

        assert!(store.dispose());
        assert!(!store.dispose());
        assert!(store.is_disposed());
        assert!(!store.set(1));
        assert!(!store.replace(ResourceState::Loaded { data: 2 }));

        assert_eq!(observer.next().now_or_never(), Some(Some(ResourceState::Loading)));
        assert_eq!(observer.next().now_or_never(), Some(None));
        assert_eq!(store.read(), ResourceState::Loading);
    }

    #[test]
    fn observe_after_dispose_yields_final_state_only() {
        let store = StateStore::new(4);
        store.set(5);
        store.dispose();

        let mut observer = store.observe();
        assert_eq!(
            observer.next().now_or_never(),
            Some(Some(ResourceState::Local { data: 5 }))
        );
        assert_eq!(observer.next().now_or_never(), Some(None));
    }

    #[test]
    fn lagging_observer_skips_to_retained_changes() {
        let store = StateStore::new(2);
        let mut observer = store.observe();
        for n in 0..5 {
            store.set(n);
        }

        let seen = drain(&mut observer);
        assert_eq!(seen.first(), Some(&ResourceState::Loading));
        assert_eq!(
            &seen[1..],
            &[ResourceState::Local { data: 3 }, ResourceState::Local { data: 4 }]
        );
    }

    #[test]
    fn update_loses_to_concurrent_write() {
        let store = std::sync::Arc::new(StateStore::new(4));
        store.set(1);

        let inner = std::sync::Arc::clone(&store);
        assert!(!store.update(move |n| {
            inner.replace(ResourceState::Loaded { data: 100 });
            n + 1
        }));
        assert_eq!(store.read(), ResourceState::Loaded { data: 100 });
    }
}
