//! Fan-out/fan-in over a bounded channel

use std::future::Future;
use std::ops::AddAssign;
use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};

/// Counts from one pool run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolTally {
    /// Items taken off the input
    pub processed: usize,
    /// Results sent on the output
    pub emitted: usize,
}

impl AddAssign for PoolTally {
    fn add_assign(&mut self, other: Self) {
        self.processed += other.processed;
        self.emitted += other.emitted;
    }
}

/// Applies `f` to every input item on `workers` concurrent tasks
///
/// Each worker pulls the next item as soon as it is free, so output order
/// follows completion, not input. `None` results are dropped. The output
/// channel closes once every worker has exited, which happens when the
/// input is exhausted. The returned handle yields the combined tally.
///
/// # Example
///
/// ```
/// use property_trawler::crawler::parallel_map;
/// use tokio::sync::mpsc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let (tx, rx) = mpsc::channel(8);
/// let (mut doubled, handle) = parallel_map(3, rx, 8, |n: u32| async move { Some(n * 2) });
///
/// for n in 1..=4 {
///     tx.send(n).await.unwrap();
/// }
/// drop(tx);
///
/// let mut results = Vec::new();
/// while let Some(n) = doubled.recv().await {
///     results.push(n);
/// }
/// results.sort();
/// assert_eq!(results, vec![2, 4, 6, 8]);
/// assert_eq!(handle.await.unwrap().emitted, 4);
/// # }
/// ```
pub fn parallel_map<T, U, F, Fut>(
    workers: usize,
    input: Receiver<T>,
    capacity: usize,
    f: F,
) -> (Receiver<U>, JoinHandle<PoolTally>)
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<U>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let input = Arc::new(Mutex::new(input));
    let f = Arc::new(f);
    let mut set = JoinSet::new();

    for id in 0..workers.max(1) {
        let input = Arc::clone(&input);
        let tx = tx.clone();
        let f = Arc::clone(&f);

        set.spawn(async move {
            let mut tally = PoolTally::default();
            loop {
                // The lock is only held while waiting for the next item
                let item = input.lock().await.recv().await;
                let Some(item) = item else { break };

                tally.processed += 1;
                if let Some(result) = (*f)(item).await {
                    if tx.send(result).await.is_err() {
                        tracing::warn!("Worker {}: output closed", id);
                        break;
                    }
                    tally.emitted += 1;
                }
            }
            tracing::debug!(
                "Worker {} finished: {} processed, {} emitted",
                id,
                tally.processed,
                tally.emitted
            );
            tally
        });
    }

    // Only the workers hold senders now
    drop(tx);

    let handle = tokio::spawn(async move {
        let mut total = PoolTally::default();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(tally) => total += tally,
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }
        total
    });

    (rx, handle)
}
