//! Batcher: partitions the chunk sequence into contiguous batches, one
//! store write per batch.

/// Split `items` into `batch_count` contiguous batches.
///
/// Each batch holds `len / batch_count` items except the last, which also
/// takes the remainder. When there are fewer items than batches everything
/// goes into a single batch. Concatenating the result always yields the
/// input, and no batch is empty.
pub fn partition<T>(items: Vec<T>, batch_count: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }

    let batch_count = batch_count.max(1);
    let step = items.len() / batch_count;
    if step == 0 {
        tracing::warn!(
            items = items.len(),
            batch_count,
            "fewer items than batches, writing a single batch"
        );
        return vec![items];
    }

    let mut batches = Vec::with_capacity(batch_count);
    let mut rest = items.into_iter();
    for _ in 0..batch_count - 1 {
        batches.push(rest.by_ref().take(step).collect());
    }
    batches.push(rest.collect());
    batches
}
