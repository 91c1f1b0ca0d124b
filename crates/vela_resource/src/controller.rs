//! The resource controller and its builder.
//!
//! [`create_resource`] (or [`ResourceBuilder`] for non-default settings)
//! spawns a scheduler actor for a tuple of request sources and a loader, and
//! returns the [`ResourceController`] that reads, mutates and tears it down.

use core::fmt;
use core::future::Future;
use core::time::Duration;
use std::sync::Arc;

use futures::StreamExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::Instrument;
use vela_source::RequestSources;

use crate::config::{ConcurrencyPolicy, ResourceConfig};
use crate::error::{BoxError, LoadError, ResourceError};
use crate::hooks::{LocalMutation, ResourceEvent, ResourceHooks};
use crate::id::ResourceId;
use crate::loader::Loader;
use crate::scheduler::{Command, Scheduler};
use crate::state::{ResourceState, ResourceStatus};
use crate::store::{StateStream, StateStore};

/// Creates a resource with the default configuration.
///
/// The controller starts in `Loading`. The loader is first invoked as soon as
/// every source holds a value, and again whenever any source changes or
/// [`reload`](ResourceController::reload) is called.
///
/// ```
/// use vela_resource::create_resource;
/// use vela_source::Signal;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let limit = Signal::with_value(2_u32);
/// let todos = create_resource((limit.clone(),), |(limit,)| async move {
///     Ok::<_, std::io::Error>((1..=limit).collect::<Vec<_>>())
/// });
///
/// assert_eq!(todos.settled().await.into_data(), Some(vec![1, 2]));
/// # }
/// ```
///
/// # Panics
///
/// Panics if called outside of a Tokio runtime, like `tokio::spawn`. Use
/// [`ResourceBuilder::spawn`] to get an error instead.
pub fn create_resource<S, T, F, Fut, E>(sources: S, loader: F) -> ResourceController<T>
where
    S: RequestSources,
    T: Clone + Send + Sync + 'static,
    F: Fn(S::Values) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: Into<BoxError>,
{
    match ResourceBuilder::new(sources, loader).spawn() {
        Ok(controller) => controller,
        Err(error) => panic!("create_resource: {error}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ResourceBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for a [`ResourceController`] with non-default settings.
///
/// ```
/// use std::time::Duration;
/// use vela_resource::{ConcurrencyPolicy, ResourceBuilder};
/// use vela_source::Signal;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), vela_resource::ResourceError> {
/// let query = Signal::with_value("rust".to_owned());
/// let search = ResourceBuilder::new((query,), |(query,): (String,)| async move {
///     Ok::<_, std::io::Error>(query.len())
/// })
/// .name("search")
/// .retries(0)
/// .timeout(Duration::from_secs(1))
/// .policy(ConcurrencyPolicy::Switch)
/// .spawn()?;
///
/// assert_eq!(search.settled().await.into_data(), Some(4));
/// # Ok(())
/// # }
/// ```
pub struct ResourceBuilder<S, T>
where
    S: RequestSources,
{
    sources: S,
    loader: Arc<dyn Loader<S::Values, T>>,
    name: Option<String>,
    config: ResourceConfig,
    hooks: Option<Arc<ResourceHooks>>,
}

impl<S, T> ResourceBuilder<S, T>
where
    S: RequestSources,
    T: Clone + Send + Sync + 'static,
{
    /// Starts building a resource from sources and a loader closure.
    #[must_use]
    pub fn new<F, Fut, E>(sources: S, loader: F) -> Self
    where
        F: Fn(S::Values) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self::with_loader(sources, loader)
    }

    /// Starts building a resource from sources and any [`Loader`].
    #[must_use]
    pub fn with_loader(sources: S, loader: impl Loader<S::Values, T>) -> Self {
        Self {
            sources,
            loader: Arc::new(loader),
            name: None,
            config: ResourceConfig::default(),
            hooks: None,
        }
    }

    /// Sets a human-readable name, recorded in tracing spans.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ResourceConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the number of retries after a failed attempt.
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Sets the per-attempt deadline.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Disables the per-attempt deadline.
    #[must_use]
    pub fn no_timeout(mut self) -> Self {
        self.config.timeout = None;
        self
    }

    /// Sets the pause between attempts.
    #[must_use]
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    /// Sets the concurrency policy.
    #[must_use]
    pub fn policy(mut self, policy: ConcurrencyPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Sets how many changes an observer may fall behind by.
    #[must_use]
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.config.history_capacity = capacity;
        self
    }

    /// Attaches a hooks registry. Registries may be shared between resources.
    #[must_use]
    pub fn hooks(mut self, hooks: Arc<ResourceHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Spawns the scheduler on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::InvalidConfig`] if the configuration is rejected
    /// - [`ResourceError::NoRuntime`] if called outside of a Tokio runtime
    pub fn spawn(self) -> Result<ResourceController<T>, ResourceError> {
        self.config.validate()?;
        let runtime = Handle::try_current().map_err(|_| ResourceError::NoRuntime)?;

        let id = ResourceId::new();
        let store = Arc::new(StateStore::new(self.config.history_capacity));
        let hooks = self.hooks.unwrap_or_default();
        let (commands, receiver) = mpsc::unbounded_channel();

        let span = tracing::info_span!(
            "resource",
            id = %id,
            name = self.name.as_deref().unwrap_or_default()
        );
        let scheduler = Scheduler::new(
            id.clone(),
            self.sources,
            self.loader,
            Arc::clone(&store),
            Arc::clone(&hooks),
            self.config,
        );
        let actor = runtime
            .spawn(scheduler.run(receiver).instrument(span))
            .abort_handle();

        tracing::debug!(resource = %id, name = ?self.name, "resource spawned");
        Ok(ResourceController {
            id,
            name: self.name,
            store,
            commands,
            hooks,
            actor,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ResourceController
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to a running resource.
///
/// Reads are synchronous and always reflect the latest state. Dropping the
/// controller disposes the resource.
pub struct ResourceController<T> {
    id: ResourceId,
    name: Option<String>,
    store: Arc<StateStore<T>>,
    commands: mpsc::UnboundedSender<Command>,
    hooks: Arc<ResourceHooks>,
    actor: AbortHandle,
}

impl<T> ResourceController<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Asks the scheduler to run the loader again with the latest request.
    ///
    /// Ignored while an invocation is in flight under the default policy,
    /// while any source is still cold, and after disposal.
    pub fn reload(&self) {
        if self.commands.send(Command::Reload).is_err() {
            tracing::debug!(resource = %self.id, "reload on a disposed resource ignored");
        }
    }

    /// Returns the current data, if the state carries any.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.store.inspect(|state| state.data().cloned())
    }

    /// Returns the current failure, if the state is `Error`.
    #[must_use]
    pub fn error(&self) -> Option<LoadError> {
        self.store.inspect(|state| state.error().cloned())
    }

    /// Returns `true` while the state is `Loading`.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.store.inspect(ResourceState::is_loading)
    }

    /// Returns `true` if the state carries data.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.store.inspect(ResourceState::has_value)
    }

    /// Returns a clone of the current state.
    #[must_use]
    pub fn state(&self) -> ResourceState<T> {
        self.store.read()
    }

    /// Returns the current state's tag.
    #[must_use]
    pub fn status(&self) -> ResourceStatus {
        self.store.inspect(ResourceState::status)
    }

    /// Replaces the value locally; the state becomes `Local { data }`.
    ///
    /// An in-flight invocation still overwrites it when it settles.
    pub fn set(&self, data: T) {
        if self.store.set(data) {
            self.emit_local(LocalMutation::Set);
        }
    }

    /// Replaces the current data with `f(data)`, tagged `Local`.
    ///
    /// Does nothing while the state is `Loading` or `Error`. Returns whether
    /// the update was applied.
    pub fn update(&self, f: impl FnOnce(T) -> T) -> bool {
        let applied = self.store.update(f);
        if applied {
            self.emit_local(LocalMutation::Update);
        }
        applied
    }

    /// Returns a stream of the current state followed by every change.
    ///
    /// The stream ends when the resource is disposed.
    #[must_use]
    pub fn observe_state(&self) -> StateStream<T> {
        self.store.observe()
    }

    /// Waits until the state is anything but `Loading` and returns it.
    ///
    /// Returns the current state immediately if it is not `Loading`. If the
    /// resource is disposed while loading, returns `Loading`.
    pub async fn settled(&self) -> ResourceState<T> {
        let mut states = self.observe_state();
        while let Some(state) = states.next().await {
            if !state.is_loading() {
                return state;
            }
        }
        self.store.read()
    }

    fn emit_local(&self, mutation: LocalMutation) {
        tracing::debug!(resource = %self.id, %mutation, "local mutation");
        self.hooks.invoke(&ResourceEvent::LocalMutation {
            resource: self.id.clone(),
            mutation,
        });
    }
}

impl<T> ResourceController<T> {
    /// Stops the scheduler and freezes the state.
    ///
    /// The in-flight invocation is aborted, observers' streams end, and later
    /// writes are ignored. Calling it again does nothing.
    pub fn dispose(&self) {
        if !self.store.dispose() {
            return;
        }
        self.actor.abort();
        tracing::info!(resource = %self.id, "resource disposed");
        self.hooks.invoke(&ResourceEvent::Disposed {
            resource: self.id.clone(),
        });
    }

    /// Returns `true` once the resource has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.store.is_disposed()
    }

    /// Returns the resource's unique ID.
    #[must_use]
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Returns the name given to the builder, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the hooks registry events are sent to.
    #[must_use]
    pub fn hooks(&self) -> &Arc<ResourceHooks> {
        &self.hooks
    }
}

impl<T> Drop for ResourceController<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T> fmt::Debug for ResourceController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceController")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("status", &self.store.inspect(ResourceState::status))
            .field("disposed", &self.store.is_disposed())
            .finish()
    }
}
