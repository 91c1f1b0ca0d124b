//! Todo list demo CLI.
//!
//! Loads todos from an in-memory API through a Vela resource, removes one
//! locally, reloads, then asks for the limit the API refuses.
//!
//! # Usage
//!
//! ```bash
//! todos [limit]
//! ```
//!
//! `limit` defaults to 5. Settings are read from the environment and `.env`:
//! `TODOS_DELAY_MS`, `TODOS_FAILING_LIMIT` and `TODOS_LOG`.

use std::sync::Arc;

use futures::StreamExt;
use todos::{
    DemoConfig, Todo, TodoApi, next_load, remove_todo, render, todos_resource, tracing_setup,
};
use vela::resource::{ResourceController, ResourceState};
use vela::source::Signal;

const DEFAULT_LIMIT: usize = 5;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // The subscriber goes in before any config error is reported.
    let config = DemoConfig::from_env();
    tracing_setup(&config).init();

    let config = config.unwrap_or_else(|err| {
        tracing::error!("Error: {}", err);
        std::process::exit(1);
    });

    let limit = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<usize>().unwrap_or_else(|_| {
            tracing::error!("Usage: todos [limit]");
            tracing::error!("Error: '{}' is not a number", arg);
            std::process::exit(1);
        }),
        None => DEFAULT_LIMIT,
    };

    let api = TodoApi::fixture()
        .map(|api| api.configured(&config))
        .unwrap_or_else(|err| {
            tracing::error!("Error: {}", err);
            std::process::exit(1);
        });
    let limit_signal = Signal::with_value(limit);
    let todos = todos_resource(Arc::new(api), &limit_signal).unwrap_or_else(|err| {
        tracing::error!("Error: {}", err);
        std::process::exit(1);
    });

    let mut status_log = todos.observe_state();
    let watcher = tokio::spawn(async move {
        while let Some(state) = status_log.next().await {
            tracing::info!(status = %state.status(), "todos changed");
        }
    });

    // Initial load.
    let state = todos.settled().await;
    show(&format!("limit {limit}"), &state);

    // Remove the first todo locally.
    if let Some(first) = todos.value().and_then(|list| list.first().map(|todo| todo.id)) {
        remove_todo(&todos, first);
        show(&format!("removed todo {first}"), &todos.state());
    }

    // Reload discards the local edit.
    let mut states = todos.observe_state();
    todos.reload();
    report(&todos, "reload", next_load(&mut states).await);

    // The API refuses this limit.
    limit_signal.set(config.failing_limit);
    report(
        &todos,
        &format!("limit {}", config.failing_limit),
        next_load(&mut states).await,
    );

    // Back to a limit it accepts.
    limit_signal.set(limit);
    report(&todos, &format!("limit {limit}"), next_load(&mut states).await);

    todos.dispose();
    let _ = watcher.await;
}

fn report(
    todos: &ResourceController<Vec<Todo>>,
    step: &str,
    state: Option<ResourceState<Vec<Todo>>>,
) {
    match state {
        Some(state) => show(step, &state),
        None => tracing::warn!(resource = %todos.id(), step, "resource stopped before loading"),
    }
}

fn show(step: &str, state: &ResourceState<Vec<Todo>>) {
    tracing::info!(step, status = %state.status(), "todos");
    for line in render(state) {
        tracing::info!("  {}", line);
    }
}
