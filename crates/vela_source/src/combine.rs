//! Combine-latest join over tuples of sources.
//!
//! [`RequestSources`] is implemented for tuples of 1 to 8 [`Source`]s. Joining
//! a tuple yields a [`Combined`], which produces the tuple of latest values:
//!
//! - nothing until **every** source has produced at least one value
//! - then a new tuple whenever **any** source produces a new value
//!
//! This is neither a zip (which pairs values up positionally) nor a merge
//! (which forwards each source's values on their own).
//!
//! A source that closes keeps contributing its last value. The join ends once
//! every source has closed.

use futures::future::{self, BoxFuture};
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;
use variadics_please::all_tuples;

use crate::signal::Source;

/// Stream of combined request tuples, see [`Combined::into_stream`].
pub type CombinedStream<V> = BoxStream<'static, V>;

/// A fixed-arity tuple of sources that can be joined into one request tuple.
///
/// Per-slot typing is preserved: joining `(Signal<u32>, Signal<String>)`
/// yields `(u32, String)` tuples.
pub trait RequestSources: Send + Sync + 'static {
    /// The tuple of value types, one slot per source.
    type Values: Clone + Send + Sync + 'static;

    /// Subscribes to every source and returns the join.
    fn combine(&self) -> Combined<Self::Values>;

    /// Returns the tuple of latest values, or `None` while any source is cold.
    fn current(&self) -> Option<Self::Values>;
}

/// Type-erased subscription set behind a [`Combined`].
trait Join: Send {
    type Values;

    /// Latest tuple without marking anything as seen.
    fn peek(&self) -> Option<Self::Values>;

    /// Latest tuple, marking every slot as seen.
    fn snapshot(&mut self) -> Option<Self::Values>;

    /// Resolves with `true` when any open slot changes, `false` once all are closed.
    fn changed(&mut self) -> BoxFuture<'_, bool>;
}

/// The receivers of one joined tuple plus per-slot closed flags.
struct TupleJoin<R> {
    receivers: R,
    closed: Vec<bool>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Combined
// ─────────────────────────────────────────────────────────────────────────────

/// A live combine-latest join.
///
/// Created by [`RequestSources::combine`].
pub struct Combined<V> {
    join: Box<dyn Join<Values = V>>,
    primed: bool,
}

impl<V> Combined<V> {
    fn new(join: impl Join<Values = V> + 'static) -> Self {
        Self {
            join: Box::new(join),
            primed: false,
        }
    }

    /// Returns the latest tuple, or `None` while any source is cold.
    ///
    /// Does not consume a pending change: a later [`next`](Self::next) still
    /// reports it.
    #[must_use]
    pub fn current(&self) -> Option<V> {
        self.join.peek()
    }

    /// Returns the latest tuple and marks every pending change as seen.
    ///
    /// Unlike [`current`](Self::current), a following [`next`](Self::next)
    /// waits for a change made after this call.
    pub fn take_latest(&mut self) -> Option<V> {
        self.primed = true;
        self.join.snapshot()
    }

    /// Waits for the next combined tuple.
    ///
    /// The first call returns immediately if every source is already warm.
    /// Returns `None` once every source has closed.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. A change observed by a dropped call is
    /// reported by the next one.
    pub async fn next(&mut self) -> Option<V> {
        if !self.primed {
            self.primed = true;
            if let Some(values) = self.join.snapshot() {
                return Some(values);
            }
        }

        loop {
            if !self.join.changed().await {
                return None;
            }
            if let Some(values) = self.join.snapshot() {
                return Some(values);
            }
        }
    }

    /// Converts the join into a stream of tuples.
    #[must_use]
    pub fn into_stream(self) -> CombinedStream<V>
    where
        V: Send + 'static,
    {
        stream::unfold(self, |mut combined| async move {
            let values = combined.next().await?;
            Some((values, combined))
        })
        .boxed()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tuple implementations
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! replace_expr {
    ($_t:tt $sub:expr) => {
        $sub
    };
}

macro_rules! impl_request_sources {
    ($(($S:ident, $s:ident)),*) => {
        impl<$($S: Source),*> RequestSources for ($($S,)*) {
            type Values = ($(<$S as Source>::Value,)*);

            fn combine(&self) -> Combined<Self::Values> {
                let ($($s,)*) = self;
                Combined::new(TupleJoin {
                    receivers: ($($s.subscribe(),)*),
                    closed: vec![$(replace_expr!($s false)),*],
                })
            }

            fn current(&self) -> Option<Self::Values> {
                let ($($s,)*) = self;
                Some(($($s.latest()?,)*))
            }
        }

        impl<$($S: Clone + Send + Sync + 'static),*> Join
            for TupleJoin<($(watch::Receiver<Option<$S>>,)*)>
        {
            type Values = ($($S,)*);

            fn peek(&self) -> Option<Self::Values> {
                let ($($s,)*) = &self.receivers;
                Some(($($s.borrow().clone()?,)*))
            }

            fn snapshot(&mut self) -> Option<Self::Values> {
                let ($($s,)*) = &mut self.receivers;
                // Every slot is marked seen, even when an earlier one is still cold.
                $(let $s = $s.borrow_and_update().clone();)*
                Some(($($s?,)*))
            }

            fn changed(&mut self) -> BoxFuture<'_, bool> {
                let Self { receivers, closed } = self;
                Box::pin(async move {
                    loop {
                        let ($($s,)*) = &mut *receivers;
                        let mut pending: Vec<BoxFuture<'_, (usize, bool)>> = Vec::new();
                        let mut slot = 0_usize;
                        $(
                            if !closed[slot] {
                                let index = slot;
                                pending.push(Box::pin(async move {
                                    (index, $s.changed().await.is_ok())
                                }));
                            }
                            slot += 1;
                        )*
                        debug_assert_eq!(slot, closed.len());

                        if pending.is_empty() {
                            return false;
                        }

                        let ((index, open), _, _) = future::select_all(pending).await;
                        if open {
                            return true;
                        }
                        closed[index] = true;
                    }
                })
            }
        }
    };
}

all_tuples!(impl_request_sources, 1, 8, S, s);
