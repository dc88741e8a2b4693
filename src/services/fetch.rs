use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Debounced, last-request-wins coordinator for item retrieval.
///
/// Every call claims a new generation. The fetch only starts after the
/// debounce delay, and only if no newer call has claimed a generation in the
/// meantime; a response that arrives after being superseded is discarded.
/// This keeps a burst of priority edits from issuing one upstream request
/// per interaction step.
pub struct FetchCoordinator {
    generation: AtomicU64,
    debounce: Duration,
}

impl FetchCoordinator {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            generation: AtomicU64::new(0),
            debounce: Duration::from_millis(debounce_ms),
        }
    }

    /// Run a fetch under last-request-wins semantics. Returns `None` when a
    /// newer request superseded this one, either during the debounce window
    /// or while the fetch was in flight.
    pub async fn run<T, E, F, Fut>(&self, fetch: F) -> Option<Result<T, E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let claimed = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.debounce).await;
        if self.generation.load(Ordering::SeqCst) != claimed {
            return None;
        }

        let result = fetch().await;

        // Stale responses are discarded on arrival.
        if self.generation.load(Ordering::SeqCst) != claimed {
            return None;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_newest_request_wins() {
        let coordinator = FetchCoordinator::new(50);

        let first = coordinator.run(|| async { Ok::<_, ()>("old") });
        let second = coordinator.run(|| async { Ok::<_, ()>("new") });

        let (first, second) = tokio::join!(first, second);

        assert!(first.is_none());
        assert_eq!(second, Some(Ok("new")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_request_completes() {
        let coordinator = FetchCoordinator::new(50);

        let result = coordinator.run(|| async { Ok::<_, ()>(42) }).await;
        assert_eq!(result, Some(Ok(42)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_fetch_discarded_when_superseded() {
        let coordinator = FetchCoordinator::new(10);

        // Claim a generation, debounce, and start a slow fetch.
        let slow = coordinator.run(|| async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, ()>("slow")
        });

        // A second request that arrives while the first fetch is in flight.
        let fast = async {
            tokio::time::sleep(Duration::from_millis(40)).await;
            coordinator.run(|| async { Ok::<_, ()>("fast") }).await
        };

        let (slow, fast) = tokio::join!(slow, fast);

        assert!(slow.is_none());
        assert_eq!(fast, Some(Ok("fast")));
    }
}
