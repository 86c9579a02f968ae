//! Live-query subscription with polling fallback.
//!
//! A subscription has exactly two states:
//!
//! - `Live` - consuming pushed frames from the store's watch channel;
//! - `Polling` - re-running the plain read on a fixed interval.
//!
//! The only transition is `Live -> Polling`, taken when the live channel
//! errors or closes; there is no reverse transition. Exactly one channel
//! (push or poll) is active at any time, channel failure is never
//! surfaced to the caller, and poll failures are logged and skipped.
//!
//! [`Subscription`] is the cancellation handle: `cancel()` aborts
//! whichever channel is currently active, is idempotent, and dropping the
//! handle cancels too.

use std::future::Future;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::Result;

/// Fixed poll interval used after the live channel fails.
pub(crate) const POLL_PERIOD: Duration = Duration::from_secs(30);

/// Handle to an active subscription.
///
/// The subscription runs until cancelled; dropping the handle cancels it.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    /// Spawn a subscription task.
    pub(crate) fn spawn(fut: impl Future<Output = ()> + Send + 'static) -> Self {
        Self {
            task: tokio::spawn(fut),
        }
    }

    /// Cancel the subscription, stopping whichever channel is active.
    ///
    /// Safe to call any number of times.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Whether the subscription is still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Drive one subscription to completion (it never completes on its own;
/// the caller cancels via task abort).
///
/// `live` is the already-opened push channel, or `None` when opening it
/// failed and the subscription starts out polling. Each update - pushed
/// or polled - is handed to `on_update` already normalized and sorted by
/// the caller-supplied closures.
pub(crate) async fn drive<T, S, P, Fut, F>(live: Option<S>, poll: P, period: Duration, mut on_update: F)
where
    S: Stream<Item = Result<Vec<T>>>,
    P: Fn() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
    F: FnMut(Vec<T>),
{
    if let Some(live) = live {
        let mut live = std::pin::pin!(live);
        loop {
            match live.next().await {
                Some(Ok(items)) => on_update(items),
                Some(Err(e)) => {
                    warn!(error = %e, "live channel failed, downgrading to polling");
                    break;
                }
                None => {
                    debug!("live channel closed, downgrading to polling");
                    break;
                }
            }
        }
    }

    // Polling state. No reverse transition: once here, stay here.
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        match poll().await {
            Ok(items) => on_update(items),
            Err(e) => {
                // Poll failures are skipped, not surfaced; the next tick
                // tries again.
                warn!(error = %e, "poll failed");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::ClientError;

    fn collector() -> (Arc<Mutex<Vec<Vec<u32>>>>, impl FnMut(Vec<u32>)) {
        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = updates.clone();
        (updates, move |items| sink.lock().unwrap().push(items))
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_error_downgrades_to_polling() {
        let (updates, on_update) = collector();
        let poll_calls = Arc::new(AtomicUsize::new(0));

        let live = futures::stream::iter(vec![
            Ok(vec![1]),
            Ok(vec![1, 2]),
            Err(ClientError::Conflict("channel torn down".to_string())),
        ]);

        let calls = poll_calls.clone();
        let poll = move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![9])
            }
        };

        // Bound the never-ending driver with virtual time
        let _ = tokio::time::timeout(
            Duration::from_secs(65),
            drive(Some(live), poll, Duration::from_secs(30), on_update),
        )
        .await;

        let updates = updates.lock().unwrap();
        // Two pushed frames, then polls at t=0s, 30s, 60s
        assert_eq!(updates[0], vec![1]);
        assert_eq!(updates[1], vec![1, 2]);
        assert!(updates[2..].iter().all(|u| u == &vec![9]));
        assert_eq!(poll_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_channel_also_downgrades() {
        let (updates, on_update) = collector();
        let live = futures::stream::iter(vec![Ok(vec![4])]);

        let _ = tokio::time::timeout(
            Duration::from_secs(35),
            drive(
                Some(live),
                || async { Ok(vec![5]) },
                Duration::from_secs(30),
                on_update,
            ),
        )
        .await;

        let updates = updates.lock().unwrap();
        assert_eq!(*updates, vec![vec![4], vec![5], vec![5]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_live_channel_starts_polling() {
        let (updates, on_update) = collector();
        let live: Option<futures::stream::Iter<std::vec::IntoIter<Result<Vec<u32>>>>> = None;

        let _ = tokio::time::timeout(
            Duration::from_secs(35),
            drive(live, || async { Ok(vec![3]) }, Duration::from_secs(30), on_update),
        )
        .await;

        assert_eq!(*updates.lock().unwrap(), vec![vec![3], vec![3]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_errors_are_skipped() {
        let (updates, on_update) = collector();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let poll = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n % 2 == 0 {
                    Err(ClientError::Conflict("flaky".to_string()))
                } else {
                    Ok(vec![n as u32])
                }
            }
        };

        let live: Option<futures::stream::Iter<std::vec::IntoIter<Result<Vec<u32>>>>> = None;
        let _ = tokio::time::timeout(
            Duration::from_secs(95),
            drive(live, poll, Duration::from_secs(30), on_update),
        )
        .await;

        // Ticks at 0s, 30s, 60s, 90s; even ticks fail and are skipped
        assert_eq!(*updates.lock().unwrap(), vec![vec![1], vec![3]]);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let sub = Subscription::spawn(async {
            loop {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        });
        assert!(sub.is_active());

        sub.cancel();
        sub.cancel();
        sub.cancel();

        // Abort is asynchronous; yield until the task settles
        for _ in 0..50 {
            if !sub.is_active() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(!sub.is_active());
    }
}
