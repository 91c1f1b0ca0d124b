//! Integration tests for the combine-latest join.
//!
//! These run the join on a real runtime with writers living in other tasks.

use core::time::Duration;

use futures::StreamExt;
use vela_source::{Constant, RequestSources, Signal, Source};

#[derive(Debug, Clone, PartialEq)]
struct Filter {
    n: u32,
}

/// Heterogeneous slots keep their own types in the combined tuple.
#[tokio::test]
async fn three_heterogeneous_sources_join_into_a_typed_tuple() {
    let page = Signal::with_value(1_u32);
    let tag = Signal::with_value("a".to_owned());
    let filter = Constant::new(Filter { n: 1 });

    let mut combined = (page, tag, filter).combine();
    let (page, tag, filter): (u32, String, Filter) =
        combined.next().await.expect("all sources are warm");

    assert_eq!(page, 1);
    assert_eq!(tag, "a");
    assert_eq!(filter, Filter { n: 1 });
}

/// Writes from another task wake the join.
#[tokio::test(start_paused = true)]
async fn writer_task_drives_the_stream() {
    let limit = Signal::<u32>::new();
    let writer = limit.clone();

    let stream = (limit,).combine().into_stream();

    let producer = tokio::spawn(async move {
        for value in [5, 6, 7] {
            tokio::time::sleep(Duration::from_millis(10)).await;
            writer.set(value);
        }
    });

    let values: Vec<u32> = stream.map(|(v,)| v).take(3).collect().await;
    producer.await.expect("producer task");

    assert_eq!(values, vec![5, 6, 7]);
}

/// The stream ends once every source is gone.
#[tokio::test]
async fn stream_ends_when_sources_are_dropped() {
    let a = Signal::with_value(1);
    let b = Signal::with_value(2);
    let stream = (a.clone(), b.clone()).combine().into_stream();
    drop((a, b));

    let values: Vec<(i32, i32)> = stream.collect().await;
    assert_eq!(values, vec![(1, 2)]);
}

/// The maximum arity is supported.
#[tokio::test]
async fn eight_sources_combine() {
    let sources = (
        Constant::new(0_u8),
        Constant::new(1_u16),
        Constant::new(2_u32),
        Constant::new(3_u64),
        Constant::new(4_i8),
        Constant::new(5_i16),
        Constant::new(6_i32),
        Signal::with_value(7_i64),
    );

    assert_eq!(sources.current(), Some((0, 1, 2, 3, 4, 5, 6, 7)));
    assert_eq!(sources.7.latest(), Some(7));
    let mut combined = sources.combine();
    assert_eq!(combined.next().await, Some((0, 1, 2, 3, 4, 5, 6, 7)));
}
