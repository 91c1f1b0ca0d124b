//! The execution scheduler.
//!
//! Each resource runs one scheduler actor: a spawned task that owns the
//! combined request sources and decides, for every trigger, whether to start
//! a loader invocation, drop the trigger, or supersede the running
//! invocation.
//!
//! A trigger is either a new combined request tuple, or a reload command
//! paired with the latest tuple. Nothing is triggered until every source is
//! warm, and reloads received before that are ignored.
//!
//! Invocations run as their own tasks and report back with a settlement
//! tagged by [`InvocationId`]. The actor applies a settlement only if it
//! belongs to the invocation it is waiting for, so a result from a superseded
//! invocation can never reach the store.

use core::panic::AssertUnwindSafe;
use core::time::Duration;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::Instrument;
use vela_source::{Combined, RequestSources};

use crate::config::{ConcurrencyPolicy, ResourceConfig};
use crate::error::LoadError;
use crate::hooks::{ResourceEvent, ResourceHooks};
use crate::id::{InvocationId, ResourceId};
use crate::loader::Loader;
use crate::state::ResourceState;
use crate::store::StateStore;

/// Commands sent by the controller to its scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    /// Re-run the loader with the latest request tuple.
    Reload,
}

/// The outcome of one invocation, sent back to the actor.
struct Settlement<T> {
    invocation: InvocationId,
    result: Result<T, LoadError>,
    attempts: u32,
}

/// The invocation the actor is waiting for. Dropping it aborts the task.
struct Running {
    id: InvocationId,
    started: Instant,
    task: AbortHandle,
}

impl Drop for Running {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// What an invocation task needs besides the request.
struct InvocationContext<R, T> {
    resource: ResourceId,
    invocation: InvocationId,
    loader: Arc<dyn Loader<R, T>>,
    hooks: Arc<ResourceHooks>,
    max_attempts: u32,
    timeout: Option<Duration>,
    retry_delay: Duration,
}

// ─────────────────────────────────────────────────────────────────────────────
// Scheduler
// ─────────────────────────────────────────────────────────────────────────────

/// State owned by the scheduler actor.
pub(crate) struct Scheduler<S, T>
where
    S: RequestSources,
{
    resource: ResourceId,
    sources: S,
    loader: Arc<dyn Loader<S::Values, T>>,
    store: Arc<StateStore<T>>,
    hooks: Arc<ResourceHooks>,
    config: ResourceConfig,
    last_invocation: InvocationId,
    running: Option<Running>,
    /// A trigger arrived while busy under [`ConcurrencyPolicy::ExhaustLatest`].
    deferred: bool,
}

impl<S, T> Scheduler<S, T>
where
    S: RequestSources,
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        resource: ResourceId,
        sources: S,
        loader: Arc<dyn Loader<S::Values, T>>,
        store: Arc<StateStore<T>>,
        hooks: Arc<ResourceHooks>,
        config: ResourceConfig,
    ) -> Self {
        Self {
            resource,
            sources,
            loader,
            store,
            hooks,
            config,
            last_invocation: InvocationId::new(0),
            running: None,
            deferred: false,
        }
    }

    /// Runs the actor until the controller drops its command sender.
    ///
    /// Aborting the task that runs this future aborts the in-flight
    /// invocation with it.
    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut combined = self.sources.combine();
        let (settle_tx, mut settlements) = mpsc::unbounded_channel::<Settlement<T>>();
        let mut sources_open = true;

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(Command::Reload) => self.on_reload(&mut combined, &settle_tx),
                    None => break,
                },
                Some(settlement) = settlements.recv() => {
                    self.on_settlement(settlement, &mut combined, &settle_tx);
                }
                values = combined.next(), if sources_open => match values {
                    Some(request) => self.on_trigger(request, &settle_tx),
                    None => {
                        tracing::debug!("all request sources closed");
                        sources_open = false;
                    }
                },
            }
        }

        tracing::debug!("scheduler stopped");
    }

    fn on_reload(
        &mut self,
        combined: &mut Combined<S::Values>,
        settle_tx: &mpsc::UnboundedSender<Settlement<T>>,
    ) {
        match combined.take_latest() {
            Some(request) => self.on_trigger(request, settle_tx),
            None => tracing::debug!("reload ignored, request sources are not all warm yet"),
        }
    }

    fn on_trigger(&mut self, request: S::Values, settle_tx: &mpsc::UnboundedSender<Settlement<T>>) {
        let Some(in_flight) = self.running.as_ref().map(|running| running.id) else {
            self.start(request, settle_tx);
            return;
        };

        match self.config.policy {
            ConcurrencyPolicy::Exhaust => self.drop_trigger(in_flight, false),
            ConcurrencyPolicy::ExhaustLatest => {
                self.deferred = true;
                self.drop_trigger(in_flight, true);
            }
            ConcurrencyPolicy::Switch => {
                tracing::debug!(superseded = %in_flight, "switching to a new invocation");
                self.running = None;
                self.start(request, settle_tx);
            }
        }
    }

    fn drop_trigger(&self, in_flight: InvocationId, deferred: bool) {
        tracing::debug!(%in_flight, deferred, "trigger dropped while busy");
        self.hooks.invoke(&ResourceEvent::TriggerDropped {
            resource: self.resource.clone(),
            in_flight,
            deferred,
        });
    }

    fn start(&mut self, request: S::Values, settle_tx: &mpsc::UnboundedSender<Settlement<T>>) {
        self.last_invocation = self.last_invocation.next();
        let invocation = self.last_invocation;

        self.store.begin_loading();
        tracing::info!(%invocation, "invocation started");
        self.hooks.invoke(&ResourceEvent::InvocationStart {
            resource: self.resource.clone(),
            invocation,
        });

        let context = InvocationContext {
            resource: self.resource.clone(),
            invocation,
            loader: Arc::clone(&self.loader),
            hooks: Arc::clone(&self.hooks),
            max_attempts: self.config.max_attempts(),
            timeout: self.config.timeout,
            retry_delay: self.config.retry_delay,
        };
        let settle_tx = settle_tx.clone();
        let span = tracing::info_span!("invocation", %invocation);
        let task = tokio::spawn(
            async move {
                let (result, attempts) = invoke(context, request).await;
                // The actor is gone once the resource is disposed.
                settle_tx
                    .send(Settlement {
                        invocation,
                        result,
                        attempts,
                    })
                    .ok();
            }
            .instrument(span),
        );

        self.running = Some(Running {
            id: invocation,
            started: Instant::now(),
            task: task.abort_handle(),
        });
    }

    fn on_settlement(
        &mut self,
        settlement: Settlement<T>,
        combined: &mut Combined<S::Values>,
        settle_tx: &mpsc::UnboundedSender<Settlement<T>>,
    ) {
        let current = self.running.as_ref().map(|running| running.id);
        if current != Some(settlement.invocation) {
            tracing::debug!(invocation = %settlement.invocation, "stale result discarded");
            self.hooks.invoke(&ResourceEvent::StaleResult {
                resource: self.resource.clone(),
                invocation: settlement.invocation,
                current,
            });
            return;
        }
        let Some(running) = self.running.take() else {
            return;
        };

        let state = match settlement.result {
            Ok(data) => ResourceState::Loaded { data },
            Err(error) => ResourceState::Error { error },
        };
        let status = state.status();
        let duration = running.started.elapsed();
        self.store.replace(state);

        tracing::info!(
            invocation = %running.id,
            %status,
            attempts = settlement.attempts,
            ?duration,
            "invocation settled"
        );
        self.hooks.invoke(&ResourceEvent::InvocationSettled {
            resource: self.resource.clone(),
            invocation: running.id,
            status,
            attempts: settlement.attempts,
            duration,
        });

        if core::mem::take(&mut self.deferred) {
            match combined.take_latest() {
                Some(request) => self.start(request, settle_tx),
                None => tracing::debug!("deferred trigger lost, request sources went cold"),
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Invocation
// ─────────────────────────────────────────────────────────────────────────────

/// Runs one invocation: up to `max_attempts` attempts with the same request.
///
/// Returns the final result and the number of attempts made.
async fn invoke<R, T>(context: InvocationContext<R, T>, request: R) -> (Result<T, LoadError>, u32)
where
    R: Clone + Send + 'static,
    T: Send + 'static,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let error = match attempt_once(&*context.loader, request.clone(), context.timeout).await {
            Ok(data) => return (Ok(data), attempt),
            Err(error) => error,
        };

        tracing::warn!(
            attempt,
            max_attempts = context.max_attempts,
            %error,
            "loader attempt failed"
        );
        context.hooks.invoke(&ResourceEvent::AttemptFailed {
            resource: context.resource.clone(),
            invocation: context.invocation,
            attempt,
            max_attempts: context.max_attempts,
            error: error.clone(),
        });

        if attempt >= context.max_attempts {
            return (Err(error), attempt);
        }
        if !context.retry_delay.is_zero() {
            tokio::time::sleep(context.retry_delay).await;
        }
    }
}

/// Runs one attempt under the optional deadline. A panicking loader counts as
/// a failed attempt.
async fn attempt_once<R, T>(
    loader: &dyn Loader<R, T>,
    request: R,
    timeout: Option<Duration>,
) -> Result<T, LoadError>
where
    R: 'static,
    T: 'static,
{
    let future = match std::panic::catch_unwind(AssertUnwindSafe(|| loader.load(request))) {
        Ok(future) => AssertUnwindSafe(future).catch_unwind(),
        Err(payload) => return Err(LoadError::panicked(payload)),
    };

    let outcome = match timeout {
        Some(after) => match tokio::time::timeout(after, future).await {
            Ok(outcome) => outcome,
            Err(_) => return Err(LoadError::Timeout { after }),
        },
        None => future.await,
    };

    match outcome {
        Ok(Ok(data)) => Ok(data),
        Ok(Err(error)) => Err(LoadError::Loader(Arc::from(error))),
        Err(payload) => Err(LoadError::panicked(payload)),
    }
}
