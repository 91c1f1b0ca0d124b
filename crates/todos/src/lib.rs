//! Todo list demo for Vela resources.
//!
//! A `limit` signal drives a resource whose loader asks an in-memory todo
//! API for the first `limit` todos. The API answers after a delay and fails
//! for one configured limit, so the demo walks through every state a
//! resource can be in.

use core::time::Duration;
use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use vela::resource::{
    ResourceBuilder, ResourceController, ResourceError, ResourceState, StateStream,
};
use vela::source::Signal;
use vela::telemetry::{TracingFormat, TracingSetup};

/// The fixture served by [`TodoApi::fixture`].
const FIXTURE: &str = include_str!("../fixtures/todos.json");

/// Default answer delay of the in-memory API.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

/// Default limit the API refuses to serve.
pub const DEFAULT_FAILING_LIMIT: usize = 8;

// ─────────────────────────────────────────────────────────────────────────────
// Model
// ─────────────────────────────────────────────────────────────────────────────

/// A todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u32,
    pub title: String,
    pub completed: bool,
}

/// Errors from the demo API and its configuration.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// The API refused the request.
    #[error("error happened on the server")]
    Server,
    /// The todo fixture could not be parsed.
    #[error("malformed todo fixture: {0}")]
    Fixture(#[from] serde_json::Error),
    /// An environment variable held an unusable value.
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Demo settings, read from the environment (and `.env`).
///
/// | Variable | Default |
/// |----------|---------|
/// | `TODOS_DELAY_MS` | `1000` |
/// | `TODOS_FAILING_LIMIT` | `8` |
/// | `TODOS_LOG` | unset, log level `info` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    pub delay: Duration,
    pub failing_limit: usize,
    pub log_filter: Option<String>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            failing_limit: DEFAULT_FAILING_LIMIT,
            log_filter: None,
        }
    }
}

impl DemoConfig {
    /// Reads the settings from the process environment.
    pub fn from_env() -> Result<Self, DemoError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the settings through `lookup`, falling back to defaults for
    /// unset variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DemoError> {
        let mut config = Self::default();
        if let Some(value) = lookup("TODOS_DELAY_MS") {
            let millis = parse("TODOS_DELAY_MS", value)?;
            config.delay = Duration::from_millis(millis);
        }
        if let Some(value) = lookup("TODOS_FAILING_LIMIT") {
            config.failing_limit = parse("TODOS_FAILING_LIMIT", value)?;
        }
        config.log_filter = lookup("TODOS_LOG").filter(|filter| !filter.trim().is_empty());
        Ok(config)
    }
}

/// Builds the demo's subscriber setup.
///
/// Takes the config parse result as is, so the subscriber can be installed
/// before a config error is reported. `TODOS_LOG` applies only when the
/// config parsed.
#[must_use]
pub fn tracing_setup(config: &Result<DemoConfig, DemoError>) -> TracingSetup {
    let setup = TracingSetup::new()
        .with_format(TracingFormat::Compact)
        .with_default_env(true);
    match config.as_ref().ok().and_then(|config| config.log_filter.clone()) {
        Some(filter) => setup.with_env_filter(filter),
        None => setup,
    }
}

fn parse<N: core::str::FromStr>(key: &'static str, value: String) -> Result<N, DemoError> {
    value
        .trim()
        .parse()
        .map_err(|_| DemoError::InvalidEnv { key, value })
}

// ─────────────────────────────────────────────────────────────────────────────
// TodoApi
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory stand-in for a remote todo service.
#[derive(Debug, Clone)]
pub struct TodoApi {
    todos: Vec<Todo>,
    delay: Duration,
    failing_limit: usize,
}

impl TodoApi {
    /// Creates an API serving `todos` with the default delay and failing limit.
    #[must_use]
    pub fn new(todos: Vec<Todo>) -> Self {
        Self {
            todos,
            delay: DEFAULT_DELAY,
            failing_limit: DEFAULT_FAILING_LIMIT,
        }
    }

    /// Creates an API serving the bundled fixture.
    pub fn fixture() -> Result<Self, DemoError> {
        Self::from_json(FIXTURE)
    }

    /// Creates an API serving todos parsed from a JSON array.
    pub fn from_json(json: &str) -> Result<Self, DemoError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Sets how long every answer takes.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the limit the API refuses to serve.
    #[must_use]
    pub fn with_failing_limit(mut self, limit: usize) -> Self {
        self.failing_limit = limit;
        self
    }

    /// Applies the delay and failing limit from `config`.
    #[must_use]
    pub fn configured(self, config: &DemoConfig) -> Self {
        self.with_delay(config.delay)
            .with_failing_limit(config.failing_limit)
    }

    /// Number of todos the API holds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.todos.len()
    }

    /// Whether the API holds no todos.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Returns the first `limit` todos after the configured delay.
    ///
    /// The failing limit is rejected immediately.
    pub async fn fetch(&self, limit: usize) -> Result<Vec<Todo>, DemoError> {
        tracing::debug!(limit, "fetching todos");
        if limit == self.failing_limit {
            return Err(DemoError::Server);
        }
        tokio::time::sleep(self.delay).await;
        Ok(self.todos.iter().take(limit).cloned().collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resource wiring
// ─────────────────────────────────────────────────────────────────────────────

/// Spawns the `todos` resource over `limit`.
pub fn todos_resource(
    api: Arc<TodoApi>,
    limit: &Signal<usize>,
) -> Result<ResourceController<Vec<Todo>>, ResourceError> {
    ResourceBuilder::new((limit.clone(),), move |(limit,): (usize,)| {
        let api = Arc::clone(&api);
        async move { api.fetch(limit).await }
    })
    .name("todos")
    .spawn()
}

/// Removes the todo with `id` from the cached list without asking the API.
///
/// Returns `false` if the resource holds no list.
pub fn remove_todo(todos: &ResourceController<Vec<Todo>>, id: u32) -> bool {
    todos.update(|list| list.into_iter().filter(|todo| todo.id != id).collect())
}

/// Waits for the next load to finish.
///
/// Skips states until a `Loading` has been seen, then returns the first state
/// after it. Returns `None` if the stream ends first.
pub async fn next_load<T>(states: &mut StateStream<T>) -> Option<ResourceState<T>> {
    let mut loading = false;
    while let Some(state) = states.next().await {
        if state.is_loading() {
            loading = true;
        } else if loading {
            return Some(state);
        }
    }
    None
}

/// Renders a todo list state as display lines.
#[must_use]
pub fn render(state: &ResourceState<Vec<Todo>>) -> Vec<String> {
    match state {
        ResourceState::Loading => vec!["Loading...".to_owned()],
        ResourceState::Loaded { data } | ResourceState::Local { data } => data
            .iter()
            .map(|todo| {
                let mark = if todo.completed { "x" } else { " " };
                format!("[{mark}] {} - {}", todo.id, todo.title)
            })
            .collect(),
        ResourceState::Error { error } => vec![format!("error: {error}")],
    }
}
