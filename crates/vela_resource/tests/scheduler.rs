//! Concurrency policy tests for the scheduler.
//!
//! All tests run on a paused clock: loaders sleep or wait on gates, and the
//! test advances time to let the scheduler make progress.


use core::time::Duration;
use std::sync::{Arc, Mutex};

use test_utils::{Calls, Gates, ServerError, advance, drain, event_names, record_events};
use vela_resource::hooks::{ResourceEvent, ResourceHooks};
use vela_resource::{ConcurrencyPolicy, ResourceBuilder, ResourceController, ResourceState};
use vela_source::Signal;

/// A resource over one `u32` signal whose loader sleeps `delay_ms` and returns
/// the request. Every request is logged.
fn sleepy(
    limit: &Signal<u32>,
    policy: ConcurrencyPolicy,
    delay_ms: u64,
    hooks: &Arc<ResourceHooks>,
) -> (ResourceController<u32>, Arc<Mutex<Vec<u32>>>, Calls) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let calls = Calls::default();

    let log = Arc::clone(&requests);
    let loader_calls = calls.clone();
    let controller = ResourceBuilder::new((limit.clone(),), move |(n,): (u32,)| {
        log.lock().unwrap().push(n);
        let guard = loader_calls.enter();
        async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            drop(guard);
            Ok::<_, ServerError>(n)
        }
    })
    .policy(policy)
    .hooks(Arc::clone(hooks))
    .spawn()
    .expect("valid config");

    (controller, requests, calls)
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXHAUST
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn back_to_back_reloads_start_one_invocation() {
    let hooks = Arc::new(ResourceHooks::new());
    let limit = Signal::with_value(5);
    let (todos, _, calls) = sleepy(&limit, ConcurrencyPolicy::Exhaust, 100, &hooks);
    todos.settled().await;
    let events = record_events(&hooks);

    todos.reload();
    todos.reload();
    advance(1000).await;

    assert_eq!(calls.count(), 2, "initial load plus one reload");
    assert_eq!(
        event_names(&events),
        vec!["OnInvocationStart", "OnTriggerDropped", "OnInvocationSettled"]
    );
}

#[tokio::test(start_paused = true)]
async fn exhaust_drops_changes_while_busy() {
    let hooks = Arc::new(ResourceHooks::new());
    let limit = Signal::with_value(1);
    let (todos, requests, calls) = sleepy(&limit, ConcurrencyPolicy::Exhaust, 100, &hooks);
    todos.settled().await;

    limit.set(2);
    advance(10).await;
    limit.set(3);
    advance(10).await;
    limit.set(4);
    advance(1000).await;

    assert_eq!(*requests.lock().unwrap(), vec![1, 2]);
    assert_eq!(todos.state(), ResourceState::Loaded { data: 2 });
    assert_eq!(calls.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn exhaust_accepts_triggers_again_after_settlement() {
    let hooks = Arc::new(ResourceHooks::new());
    let limit = Signal::with_value(1);
    let (todos, requests, _) = sleepy(&limit, ConcurrencyPolicy::Exhaust, 100, &hooks);
    todos.settled().await;

    limit.set(2);
    advance(500).await;
    limit.set(3);
    advance(500).await;

    assert_eq!(*requests.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(todos.state(), ResourceState::Loaded { data: 3 });
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXHAUST LATEST
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn exhaust_latest_runs_one_trailing_invocation() {
    let hooks = Arc::new(ResourceHooks::new());
    let events = record_events(&hooks);
    let limit = Signal::with_value(1);
    let (todos, requests, calls) = sleepy(&limit, ConcurrencyPolicy::ExhaustLatest, 100, &hooks);
    todos.settled().await;

    limit.set(2);
    advance(10).await;
    limit.set(3);
    advance(10).await;
    limit.set(4);
    advance(1000).await;

    assert_eq!(*requests.lock().unwrap(), vec![1, 2, 4]);
    assert_eq!(todos.state(), ResourceState::Loaded { data: 4 });
    assert_eq!(calls.max_in_flight(), 1);

    let deferred = events
        .lock()
        .unwrap()
        .iter()
        .filter(|event| matches!(event, ResourceEvent::TriggerDropped { deferred: true, .. }))
        .count();
    assert_eq!(deferred, 2);
}

#[tokio::test(start_paused = true)]
async fn exhaust_latest_back_to_back_reloads_collapse() {
    let hooks = Arc::new(ResourceHooks::new());
    let limit = Signal::with_value(1);
    let (todos, _, calls) = sleepy(&limit, ConcurrencyPolicy::ExhaustLatest, 100, &hooks);
    todos.settled().await;

    todos.reload();
    todos.reload();
    todos.reload();
    advance(1000).await;

    assert_eq!(calls.count(), 3, "initial, first reload, one trailing run");
}

// ═══════════════════════════════════════════════════════════════════════════════
// SWITCH
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn switch_restarts_with_latest_request() {
    let hooks = Arc::new(ResourceHooks::new());
    let limit = Signal::with_value(1);
    let (todos, requests, _) = sleepy(&limit, ConcurrencyPolicy::Switch, 100, &hooks);
    todos.settled().await;
    let mut states = todos.observe_state();

    limit.set(2);
    advance(10).await;
    limit.set(3);
    advance(1000).await;

    assert_eq!(*requests.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(
        drain(&mut states),
        vec![
            ResourceState::Loaded { data: 1 },
            ResourceState::Loading,
            ResourceState::Loading,
            ResourceState::Loaded { data: 3 },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn switch_never_applies_superseded_results() {
    let hooks = Arc::new(ResourceHooks::new());
    let events = record_events(&hooks);
    let gates = Gates::default();
    let limit = Signal::with_value(1_u32);

    let loader_gates = gates.clone();
    let todos = ResourceBuilder::new((limit.clone(),), move |(n,): (u32,)| {
        let gates = loader_gates.clone();
        async move {
            gates.wait(n).await;
            Ok::<_, ServerError>(n)
        }
    })
    .policy(ConcurrencyPolicy::Switch)
    .hooks(Arc::clone(&hooks))
    .spawn()
    .unwrap();

    gates.open(1);
    todos.settled().await;
    let mut states = todos.observe_state();

    limit.set(2);
    advance(10).await;
    // Release the running invocation and supersede it in the same tick. The
    // reload command is handled before any settlement.
    gates.open(2);
    limit.set(3);
    todos.reload();
    advance(10).await;
    gates.open(3);
    advance(10).await;

    assert_eq!(todos.state(), ResourceState::Loaded { data: 3 });
    let seen = drain(&mut states);
    assert!(
        !seen.contains(&ResourceState::Loaded { data: 2 }),
        "superseded result landed: {seen:?}"
    );

    let stale = events
        .lock()
        .unwrap()
        .iter()
        .filter(|event| matches!(event, ResourceEvent::StaleResult { .. }))
        .count();
    assert!(stale <= 1);
}
