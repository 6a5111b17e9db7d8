//! Single-flight coordination of access-token refreshes.
//!
//! Requests that fail with 401 subscribe to the queue. The first subscriber
//! while no refresh is running becomes the leader and starts the refresh;
//! everyone else waits. When the refresh resolves, subscribers are released
//! in the order they arrived and the queue is reset.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::error::{ApiError, ApiResult};

/// Result of a refresh: the new access token, or why there is none.
pub type RefreshOutcome = ApiResult<String>;

/// A queued wait for the in-flight refresh.
pub struct Subscription {
    receiver: oneshot::Receiver<RefreshOutcome>,
    leader: bool,
}

impl Subscription {
    /// True if this subscriber must start the refresh.
    pub fn is_leader(&self) -> bool {
        self.leader
    }

    /// Waits for the refresh to resolve.
    ///
    /// # Errors
    /// Returns the refresh failure, or a network error if the refresh was
    /// abandoned without resolving.
    pub async fn wait(self) -> RefreshOutcome {
        self.receiver
            .await
            .unwrap_or_else(|_closed| Err(ApiError::network("Token refresh was interrupted")))
    }
}

#[derive(Default)]
struct QueueState {
    in_flight: bool,
    subscribers: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Subscriber queue for the in-flight refresh.
#[derive(Default)]
pub struct RefreshQueue {
    state: Mutex<QueueState>,
    started: AtomicU64,
}

impl RefreshQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the queue, becoming leader if no refresh is in flight.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = oneshot::channel();
        let mut state = self.lock();
        let leader = !state.in_flight;
        state.in_flight = true;
        state.subscribers.push(sender);
        drop(state);

        if leader {
            self.started.fetch_add(1, Ordering::Relaxed);
        }
        Subscription { receiver, leader }
    }

    /// Releases every subscriber with `outcome`, oldest first, and resets the queue.
    pub fn resolve(&self, outcome: &RefreshOutcome) {
        let subscribers = {
            let mut state = self.lock();
            state.in_flight = false;
            std::mem::take(&mut state.subscribers)
        };

        tracing::debug!(
            subscribers = subscribers.len(),
            ok = outcome.is_ok(),
            "releasing refresh subscribers"
        );
        for subscriber in subscribers {
            // A dropped receiver just means that caller went away.
            let _ = subscriber.send(outcome.clone());
        }
    }

    /// Guard that resolves the queue with an error if dropped unresolved.
    pub fn guard(&self) -> RefreshGuard<'_> {
        RefreshGuard {
            queue: self,
            resolved: false,
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().in_flight
    }

    /// Number of subscribers waiting on the current refresh.
    pub fn pending(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// How many refreshes have been started since creation.
    pub fn refreshes_started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held by the task running the refresh.
pub struct RefreshGuard<'a> {
    queue: &'a RefreshQueue,
    resolved: bool,
}

impl RefreshGuard<'_> {
    pub fn finish(mut self, outcome: &RefreshOutcome) {
        self.resolved = true;
        self.queue.resolve(outcome);
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            self.queue
                .resolve(&Err(ApiError::network("Token refresh was interrupted")));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::ApiErrorKind;

    #[tokio::test]
    async fn test_first_subscriber_leads() {
        let queue = RefreshQueue::new();
        let first = queue.subscribe();
        let second = queue.subscribe();
        let third = queue.subscribe();

        assert!(first.is_leader());
        assert!(!second.is_leader());
        assert!(!third.is_leader());
        assert_eq!(queue.pending(), 3);
        assert_eq!(queue.refreshes_started(), 1);

        queue.resolve(&Ok("new-token".to_string()));

        for sub in [first, second, third] {
            assert_eq!(sub.wait().await.unwrap(), "new-token");
        }
        assert!(!queue.is_refreshing());
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_released_in_arrival_order() {
        let queue = RefreshQueue::new();
        let released = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for index in 0..5 {
            let subscription = queue.subscribe();
            let released = Arc::clone(&released);
            handles.push(tokio::spawn(async move {
                let token = subscription.wait().await.unwrap();
                released.lock().unwrap().push((index, token));
            }));
        }
        // Let every waiter park on its receiver first.
        tokio::task::yield_now().await;
        assert!(released.lock().unwrap().is_empty());

        queue.resolve(&Ok("fresh".to_string()));
        for handle in handles {
            handle.await.unwrap();
        }

        let released = released.lock().unwrap();
        let order: Vec<usize> = released.iter().map(|(index, _)| *index).collect();
        assert_eq!(order, [0, 1, 2, 3, 4]);
        assert!(released.iter().all(|(_, token)| token == "fresh"));
    }

    #[tokio::test]
    async fn test_queue_resets_after_resolve() {
        let queue = RefreshQueue::new();
        let first = queue.subscribe();
        queue.resolve(&Ok("a".to_string()));
        assert_eq!(first.wait().await.unwrap(), "a");

        let next = queue.subscribe();
        assert!(next.is_leader());
        assert_eq!(queue.refreshes_started(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_shared_by_all_subscribers() {
        let queue = RefreshQueue::new();
        let first = queue.subscribe();
        let second = queue.subscribe();
        queue.resolve(&Err(ApiError::session_expired()));

        assert_eq!(
            first.wait().await.unwrap_err().kind,
            ApiErrorKind::SessionExpired
        );
        assert_eq!(
            second.wait().await.unwrap_err().kind,
            ApiErrorKind::SessionExpired
        );
    }

    #[tokio::test]
    async fn test_dropped_guard_releases_waiters() {
        let queue = RefreshQueue::new();
        let leader = queue.subscribe();
        let follower = queue.subscribe();
        {
            let _guard = queue.guard();
        }
        assert!(!queue.is_refreshing());
        assert_eq!(leader.wait().await.unwrap_err().kind, ApiErrorKind::Network);
        assert_eq!(
            follower.wait().await.unwrap_err().kind,
            ApiErrorKind::Network
        );
    }

    #[tokio::test]
    async fn test_finished_guard_does_not_resolve_twice() {
        let queue = RefreshQueue::new();
        let sub = queue.subscribe();
        queue.guard().finish(&Ok("tok".to_string()));
        assert_eq!(sub.wait().await.unwrap(), "tok");
    }
}
