//! Terminal consumers. These run on the caller's task and spawn nothing.

use tokio_util::sync::CancellationToken;

use crate::stream::Stream;
use crate::util::Recv;

impl<T> Stream<T> {
    /// Pull up to `count` values.
    ///
    /// Returns early with what it has when the stream closes or `cancel`
    /// fires. Neither case is an error.
    pub async fn collect(&mut self, cancel: &CancellationToken, count: usize) -> Vec<T> {
        let mut items = Vec::with_capacity(count.min(64));
        while items.len() < count {
            match self.next_item(cancel).await {
                Recv::Item(item) => items.push(item),
                Recv::Closed | Recv::Cancelled => break,
            }
        }
        items
    }

    /// Pull every value until the stream closes or `cancel` fires.
    pub async fn collect_all(&mut self, cancel: &CancellationToken) -> Vec<T> {
        self.collect(cancel, usize::MAX).await
    }

    /// Call `f` on every value until the stream closes or `cancel` fires.
    /// Returns how many values were visited.
    pub async fn for_each<F>(&mut self, cancel: &CancellationToken, mut f: F) -> usize
    where
        F: FnMut(T),
    {
        let mut visited = 0;
        while let Recv::Item(item) = self.next_item(cancel).await {
            f(item);
            visited += 1;
        }
        visited
    }
}
