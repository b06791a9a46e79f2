//! Monitored query: an instrumented, cache-backed fetch that answers retry events

use std::future::Future;
use tracing::{debug, info};

use super::RecoveryListener;
use crate::config::defaults::DEFAULT_MAX_RETRIES;
use crate::healing::{HealingBus, HealingEvent, HealingSubscription};
use crate::tracker::ErrorTracker;

/// Fetch wrapper keyed by endpoint.
///
/// A successful fetch is cached until a retry event for the same endpoint
/// invalidates it. That event also arms a retry budget: the next
/// [`MonitoredQuery::fetch`] makes up to `max_retries` attempts instead of one.
#[derive(Debug)]
pub struct MonitoredQuery<T> {
    key: String,
    tracker: ErrorTracker,
    subscription: HealingSubscription,
    cached: Option<T>,
    retry_budget: Option<u32>,
}

impl<T: Clone> MonitoredQuery<T> {
    pub fn new(key: impl Into<String>, tracker: ErrorTracker, bus: &HealingBus) -> Self {
        Self {
            key: key.into(),
            tracker,
            subscription: bus.subscribe(),
            cached: None,
            retry_budget: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn cached(&self) -> Option<&T> {
        self.cached.as_ref()
    }

    /// True when the next fetch will hit the network.
    pub const fn is_stale(&self) -> bool {
        self.cached.is_none()
    }

    /// Attempts the next fetch will make, if a retry event armed it.
    pub const fn armed_retries(&self) -> Option<u32> {
        self.retry_budget
    }

    /// Drop the cached value so the next fetch re-issues the request.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Return cached data, or run `call` (instrumented) and cache the result.
    ///
    /// Errors are tracked as API errors and handed back unchanged.
    pub async fn fetch<E, F, Fut>(&mut self, mut call: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + 'static,
    {
        self.poll_events();
        if let Some(value) = &self.cached {
            return Ok(value.clone());
        }

        let attempts = self.retry_budget.take().unwrap_or(1).max(1);
        let mut attempt = 1;
        loop {
            match self.tracker.instrument(&self.key, call()).await {
                Ok(value) => {
                    self.cached = Some(value.clone());
                    return Ok(value);
                }
                Err(e) if attempt < attempts => {
                    debug!(key = %self.key, attempt, attempts, error = %e, "Query attempt failed, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<T: Clone> RecoveryListener for MonitoredQuery<T> {
    fn target(&self) -> &str {
        &self.key
    }

    fn handle_event(&mut self, event: &HealingEvent) -> bool {
        match event {
            HealingEvent::Retry {
                endpoint,
                max_retries,
            } if *endpoint == self.key => {
                let budget = max_retries.unwrap_or(DEFAULT_MAX_RETRIES);
                info!(key = %self.key, max_retries = budget, "Retry event received, invalidating query");
                self.invalidate();
                self.retry_budget = Some(budget);
                true
            }
            _ => false,
        }
    }

    fn subscription_mut(&mut self) -> &mut HealingSubscription {
        &mut self.subscription
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MetricsStore;
    use std::cell::Cell;

    #[derive(Debug, thiserror::Error)]
    #[error("timeout fetching {0}")]
    struct FetchError(&'static str);

    fn setup() -> (ErrorTracker, HealingBus) {
        (ErrorTracker::new(MetricsStore::new(10)), HealingBus::new(16))
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let (tracker, bus) = setup();
        let mut query = MonitoredQuery::new("sales", tracker, &bus);
        let calls = Cell::new(0);

        for _ in 0..2 {
            let rows = query
                .fetch(|| {
                    calls.set(calls.get() + 1);
                    async { Ok::<_, FetchError>(vec![1, 2]) }
                })
                .await
                .unwrap();
            assert_eq!(rows, vec![1, 2]);
        }
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn retry_event_invalidates_and_reissues() {
        let (tracker, bus) = setup();
        let mut query = MonitoredQuery::new("sales", tracker, &bus);
        query.fetch(|| async { Ok::<_, FetchError>(1) }).await.unwrap();

        bus.publish(HealingEvent::Retry { endpoint: "customers".to_string(), max_retries: None });
        query.poll_events();
        assert!(!query.is_stale());

        bus.publish(HealingEvent::Retry { endpoint: "sales".to_string(), max_retries: None });
        let fresh = query.fetch(|| async { Ok::<_, FetchError>(2) }).await.unwrap();
        assert_eq!(fresh, 2);
    }

    #[tokio::test]
    async fn armed_budget_allows_several_attempts() {
        let (tracker, bus) = setup();
        let mut query: MonitoredQuery<u32> = MonitoredQuery::new("sales", tracker.clone(), &bus);

        bus.publish(HealingEvent::Retry { endpoint: "sales".to_string(), max_retries: Some(3) });
        query.poll_events();
        assert_eq!(query.armed_retries(), Some(3));

        let calls = Cell::new(0u32);
        let value = query
            .fetch(|| {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        Err(FetchError("sales"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(query.armed_retries(), None);
        assert_eq!(tracker.store().snapshot().api_errors.len(), 2);
    }

    #[tokio::test]
    async fn unarmed_failure_is_returned_after_one_attempt() {
        let (tracker, bus) = setup();
        let mut query: MonitoredQuery<u32> = MonitoredQuery::new("sales", tracker.clone(), &bus);
        let calls = Cell::new(0);

        let err = query
            .fetch(|| {
                calls.set(calls.get() + 1);
                async { Err(FetchError("sales")) }
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "timeout fetching sales");
        assert_eq!(calls.get(), 1);
        let snapshot = tracker.store().snapshot();
        assert_eq!(snapshot.api_errors.last().unwrap().endpoint, "sales");
    }
}
