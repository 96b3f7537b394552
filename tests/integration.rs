//! Integration tests for fan-out / fan-in pipelines

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use faninout::prelude::*;
use futures::future::join_all;
use tokio::time::timeout;

const SETTLE: Duration = Duration::from_secs(5);

fn sorted<T: Ord>(mut items: Vec<T>) -> Vec<T> {
    items.sort();
    items
}

#[tokio::test]
async fn test_pipe_maps_every_value_in_order() {
    let cancel = CancellationToken::new();
    let input: Vec<u32> = (0..200).collect();
    let expected: Vec<u32> = input.iter().map(|x| x * 3 + 1).collect();

    let mut out = Stream::iter(&cancel, input).pipe(&cancel, |x| x * 3 + 1);
    assert_eq!(out.collect_all(&cancel).await, expected);
    assert_eq!(out.recv(&cancel).await, None);
}

#[tokio::test]
async fn test_filter_is_an_ordered_subsequence() {
    let cancel = CancellationToken::new();
    let out = Stream::iter(&cancel, 1..=5)
        .filter(&cancel, |x| x % 2 == 0)
        .collect_all(&cancel)
        .await;
    assert_eq!(out, vec![2, 4]);
}

#[tokio::test]
async fn test_chained_stages() {
    let cancel = CancellationToken::new();
    let out = Stream::iter(&cancel, 1..=20)
        .filter(&cancel, |x| x % 2 == 0)
        .pipe(&cancel, |x| x * 3)
        .collect(&cancel, 3)
        .await;
    assert_eq!(out, vec![6, 12, 18]);
}

#[tokio::test]
async fn test_fan_out_then_fan_in_doubles() {
    let cancel = CancellationToken::new();
    let merged = Stream::iter(&cancel, vec![1, 2, 3, 4, 5, 6])
        .fan_out(&cancel, 2, |x| x * 2)
        .fan_in(&cancel)
        .collect_all(&cancel)
        .await;
    assert_eq!(sorted(merged), vec![2, 4, 6, 8, 10, 12]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fan_out_delivers_each_value_once() {
    for workers in 1..=6 {
        let cancel = CancellationToken::new();
        let group = Stream::iter(&cancel, 0..500u32).fan_out(&cancel, workers, |x| x);
        assert_eq!(group.len(), workers);

        let mut streams = group.into_streams();
        let per_worker = join_all(streams.iter_mut().map(|s| s.collect_all(&cancel))).await;

        let mut seen: HashMap<u32, usize> = HashMap::new();
        for value in per_worker.into_iter().flatten() {
            *seen.entry(value).or_default() += 1;
        }
        assert_eq!(seen.len(), 500, "workers = {workers}");
        assert!(seen.values().all(|&count| count == 1), "workers = {workers}");
    }
}

#[tokio::test]
async fn test_fan_in_waits_for_every_member() {
    let cancel = CancellationToken::new();
    let pipeline = Pipeline::new();
    let group: Group<usize> = [4usize, 7, 2]
        .into_iter()
        .map(|len| pipeline.iter(&cancel, 0..len))
        .collect();

    let merged = group.fan_in(&cancel).collect_all(&cancel).await;
    assert_eq!(merged.len(), 13);
}

#[tokio::test]
async fn test_fan_in_stays_open_while_a_member_is_open() {
    let cancel = CancellationToken::new();
    let pipeline = Pipeline::new();
    let (feeder, open) = pipeline.channel::<i32>();
    let done = pipeline.iter(&cancel, vec![1, 2]);

    let mut merged = Group::from_iter([done, open]).fan_in(&cancel);
    assert_eq!(sorted(merged.collect(&cancel, 2).await), vec![1, 2]);

    // nothing more arrives, but the merged stream must not close yet
    assert!(timeout(Duration::from_millis(50), merged.recv(&cancel))
        .await
        .is_err());

    feeder.send(&cancel, 3).await.unwrap();
    drop(feeder);
    assert_eq!(merged.collect_all(&cancel).await, vec![3]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fan_matches_fan_out_fan_in() {
    let cancel = CancellationToken::new();
    let square = |x: u64| x * x;

    let composed = Stream::iter(&cancel, 0..100u64)
        .fan(&cancel, 3, square)
        .collect_all(&cancel)
        .await;
    let manual = Stream::iter(&cancel, 0..100u64)
        .fan_out(&cancel, 3, square)
        .fan_in(&cancel)
        .collect_all(&cancel)
        .await;

    assert_eq!(composed.len(), 100);
    assert_eq!(sorted(composed), sorted(manual));
}

#[tokio::test]
async fn test_group_stages_before_fan_in() {
    let cancel = CancellationToken::new();
    let merged = Stream::iter(&cancel, 1..=12)
        .fan_out(&cancel, 3, |x| x * 10)
        .filter(&cancel, |x| x % 20 == 0)
        .pipe(&cancel, |x| x + 1)
        .fan_in(&cancel)
        .collect_all(&cancel)
        .await;
    assert_eq!(sorted(merged), vec![21, 41, 61, 81, 101, 121]);
}

#[tokio::test]
async fn test_collect_bounds() {
    let cancel = CancellationToken::new();
    let mut short = Stream::iter(&cancel, vec![10, 20]);
    assert_eq!(short.collect(&cancel, 3).await, vec![10, 20]);

    let mut long = Stream::iter(&cancel, 0..50);
    assert_eq!(long.collect(&cancel, 7).await.len(), 7);
}

#[tokio::test]
async fn test_collect_after_cancel_returns_nothing_more() {
    let cancel = CancellationToken::new();
    let mut stream = Pipeline::new().source(&cancel, RepeatSource::new('x'));
    assert_eq!(stream.collect(&cancel, 2).await, vec!['x', 'x']);

    cancel.cancel();
    let rest = timeout(SETTLE, stream.collect(&cancel, 100)).await.unwrap();
    assert!(rest.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_stops_every_task() {
    let pipeline = Pipeline::new().name("cancel-test");
    let cancel = CancellationToken::new();

    let mut merged = pipeline
        .source(&cancel, RepeatSource::new(1u64))
        .pipe(&cancel, |x| x + 1)
        .fan_out(&cancel, 4, |x| x * 2)
        .filter(&cancel, |_| true)
        .fan_in(&cancel)
        .filter(&cancel, |x| *x == 4);

    assert_eq!(merged.collect(&cancel, 10).await, vec![4; 10]);
    assert!(pipeline.active_tasks() > 0);

    cancel.cancel();
    timeout(SETTLE, pipeline.join())
        .await
        .expect("tasks still running after cancel");
    assert_eq!(pipeline.active_tasks(), 0);

    // whatever was buffered drains, then the stream is closed
    let fresh = CancellationToken::new();
    let leftover = timeout(SETTLE, merged.collect_all(&fresh)).await.unwrap();
    assert!(leftover.len() <= 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dropping_the_tail_releases_the_pipeline() {
    let pipeline = Pipeline::new();
    let cancel = CancellationToken::new();

    let mut merged = pipeline
        .iter(&cancel, 0u64..)
        .fan(&cancel, 3, |x| x + 1);
    assert_eq!(merged.collect(&cancel, 5).await.len(), 5);
    drop(merged);

    timeout(SETTLE, pipeline.join())
        .await
        .expect("tasks still running after the tail was dropped");
    assert!(!cancel.is_cancelled());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_transform_runs_once_per_value() {
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let merged = Stream::iter(&cancel, 0..300)
        .fan(&cancel, 5, move |x| {
            counter.fetch_add(1, Ordering::SeqCst);
            x
        })
        .collect_all(&cancel)
        .await;

    assert_eq!(merged.len(), 300);
    assert_eq!(calls.load(Ordering::SeqCst), 300);
}

#[tokio::test]
async fn test_buffer_size_is_configurable() {
    let cancel = CancellationToken::new();
    let pipeline = Pipeline::with_config(PipelineConfig {
        buffer_size: 64,
        name: "buffered".to_string(),
    });
    let (feeder, mut stream) = pipeline.channel();

    // 64 sends complete with nobody receiving
    for i in 0..64 {
        feeder.send(&cancel, i).await.unwrap();
    }
    drop(feeder);
    assert_eq!(stream.collect_all(&cancel).await, (0..64).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_empty_source() {
    let cancel = CancellationToken::new();
    let merged = Stream::iter(&cancel, Vec::<i32>::new())
        .fan(&cancel, 4, |x| x)
        .collect_all(&cancel)
        .await;
    assert!(merged.is_empty());
}
