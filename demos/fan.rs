//! Square numbers across a pool of workers, then keep the odd results.
//!
//! Run with: cargo run --example fan

use faninout::prelude::*;

#[tokio::main]
async fn main() {
    let cancel = CancellationToken::new();
    let pipeline = Pipeline::new().name("squares").buffer_size(4);

    let workers = pipeline
        .source(&cancel, RangeSource::new(1..21))
        .fan_out(&cancel, 4, |x| x * x);
    println!("Fanned out over {} workers", workers.len());

    let mut odd = workers
        .filter(&cancel, |x| x % 2 == 1)
        .fan_in(&cancel);

    let mut results = odd.collect_all(&cancel).await;
    results.sort();
    println!("Odd squares: {:?}", results);

    pipeline.join().await;
    println!("All {} tasks finished", pipeline.active_tasks());
}
