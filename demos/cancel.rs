//! Stop an endless pipeline with a cancellation token.
//!
//! Run with: cargo run --example cancel

use std::time::Duration;

use faninout::prelude::*;

#[tokio::main]
async fn main() {
    let cancel = CancellationToken::new();
    let pipeline = Pipeline::new().name("ticker");

    let ticks = IntervalSource::new(RangeSource::new(0..i64::MAX), Duration::from_millis(20));
    let mut labelled = pipeline
        .source(&cancel, ticks)
        .fan(&cancel, 3, |tick| format!("tick-{tick}"));

    let first = labelled.collect(&cancel, 5).await;
    println!("First ticks: {:?}", first);

    println!("Cancelling with {} tasks running", pipeline.active_tasks());
    cancel.cancel();

    let rest = labelled.collect(&cancel, 100).await;
    println!("After cancel: {} more", rest.len());

    pipeline.join().await;
    println!("Pipeline stopped cleanly");
}
