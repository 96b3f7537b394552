//! Stage counters exported through the `metrics` facade.

/// A stage handed one value downstream.
pub(crate) fn record_emitted(kind: &'static str) {
    metrics::counter!("faninout_items_emitted_total", "kind" => kind).increment(1);
}

/// A stage dropped a value it had already taken because cancellation fired
/// before the hand-off completed.
pub(crate) fn record_dropped(kind: &'static str) {
    metrics::counter!("faninout_items_dropped_total", "kind" => kind).increment(1);
}
