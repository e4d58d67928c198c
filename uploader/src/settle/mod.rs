//! Settle-all combinator.
//!
//! Drives a batch of independent fallible futures to completion and splits
//! the results into successes and failures. Unlike `try_join_all`, an error
//! never short-circuits the batch: every future is polled until it settles.
//!
//! Futures run concurrently on the calling task; nothing is spawned.
//!
//! ```rust,ignore
//! use uploader::settle::settle_all;
//!
//! let settled = settle_all(files.iter().map(|f| (f.id, uploader.upload(f, &target)))).await;
//! println!("{} ok, {} failed", settled.succeeded.len(), settled.failed.len());
//! ```

use futures::future::join_all;
use std::future::Future;

/// Partitioned results of [`settle_all`], each side in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled<K, T, E> {
    pub succeeded: Vec<(K, T)>,
    pub failed: Vec<(K, E)>,
}

impl<K, T, E> Settled<K, T, E> {
    /// Number of settled tasks.
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when nothing failed.
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<K, T, E> Default for Settled<K, T, E> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Await every `(key, future)` pair and partition by outcome.
pub async fn settle_all<I, K, F, T, E>(tasks: I) -> Settled<K, T, E>
where
    I: IntoIterator<Item = (K, F)>,
    F: Future<Output = Result<T, E>>,
{
    let (keys, futures): (Vec<K>, Vec<F>) = tasks.into_iter().unzip();
    let results = join_all(futures).await;

    let mut settled = Settled::default();
    for (key, result) in keys.into_iter().zip(results) {
        match result {
            Ok(value) => settled.succeeded.push((key, value)),
            Err(err) => settled.failed.push((key, err)),
        }
    }
    settled
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use tokio::sync::oneshot;

    type Task = BoxFuture<'static, Result<u32, String>>;

    fn pending(rx: oneshot::Receiver<Result<u32, String>>) -> Task {
        async move { rx.await.unwrap_or_else(|_| Err("dropped".into())) }.boxed()
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let settled: Settled<u8, u32, String> = settle_all(Vec::<(u8, Task)>::new()).await;
        assert!(settled.is_empty());
        assert!(settled.all_succeeded());
    }

    #[tokio::test]
    async fn test_partitions_in_input_order() {
        let tasks: Vec<(&str, Task)> = vec![
            ("a", async { Ok::<u32, String>(1) }.boxed()),
            ("b", async { Err::<u32, String>("boom".to_string()) }.boxed()),
            ("c", async { Ok::<u32, String>(3) }.boxed()),
        ];

        let settled = settle_all(tasks).await;
        assert_eq!(settled.succeeded, vec![("a", 1), ("c", 3)]);
        assert_eq!(settled.failed, vec![("b", "boom".to_string())]);
        assert!(!settled.all_succeeded());
    }

    #[tokio::test]
    async fn test_completion_order_does_not_matter() {
        let (tx_a, rx_a) = oneshot::channel();
        let (tx_b, rx_b) = oneshot::channel();
        let (tx_c, rx_c) = oneshot::channel();

        let handle = tokio::spawn(settle_all(vec![
            ("a", pending(rx_a)),
            ("b", pending(rx_b)),
            ("c", pending(rx_c)),
        ]));

        tx_c.send(Ok(3)).unwrap();
        tx_b.send(Err("late".into())).unwrap();
        tx_a.send(Ok(1)).unwrap();

        let settled = handle.await.unwrap();
        assert_eq!(settled.succeeded, vec![("a", 1), ("c", 3)]);
        assert_eq!(settled.failed, vec![("b", "late".to_string())]);
    }

    #[tokio::test]
    async fn test_failure_does_not_cancel_siblings() {
        let (tx, rx) = oneshot::channel();

        let handle = tokio::spawn(settle_all(vec![
            (1, async { Err::<u32, String>("fast failure".into()) }.boxed()),
            (2, pending(rx)),
        ]));

        tokio::task::yield_now().await;
        assert!(!handle.is_finished());

        tx.send(Ok(7)).unwrap();
        let settled = handle.await.unwrap();
        assert_eq!(settled.len(), 2);
        assert_eq!(settled.succeeded, vec![(2, 7)]);
    }
}
