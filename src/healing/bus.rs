//! Healing event bus
//!
//! A `tokio::sync::broadcast` channel of [`HealingEvent`]s. Every subscriber
//! sees every event; filtering by target is the subscriber's job. A
//! [`HealingSubscription`] deregisters itself when dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use super::events::HealingEvent;

/// Publish side of the healing channel. Clones share one channel.
#[derive(Debug, Clone)]
pub struct HealingBus {
    tx: broadcast::Sender<HealingEvent>,
    stats: Arc<BusCounters>,
}

#[derive(Debug, Default)]
struct BusCounters {
    published: AtomicU64,
    undelivered: AtomicU64,
}

/// Point-in-time bus statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct BusStats {
    pub published: u64,
    /// Events published while nobody was listening
    pub undelivered: u64,
    pub listeners: usize,
}

impl HealingBus {
    /// `capacity` is how many events a slow subscriber may fall behind
    /// before it starts losing the oldest ones.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            stats: Arc::new(BusCounters::default()),
        }
    }

    /// Broadcast `event`, returning how many subscribers it reached.
    ///
    /// Having no subscribers is not an error.
    pub fn publish(&self, event: HealingEvent) -> usize {
        self.stats.published.fetch_add(1, Ordering::Relaxed);
        match self.tx.send(event) {
            Ok(n) => n,
            Err(broadcast::error::SendError(event)) => {
                self.stats.undelivered.fetch_add(1, Ordering::Relaxed);
                debug!(event = %event, "Healing event published with no listeners");
                0
            }
        }
    }

    pub fn subscribe(&self) -> HealingSubscription {
        HealingSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn stats(&self) -> BusStats {
        BusStats {
            published: self.stats.published.load(Ordering::Relaxed),
            undelivered: self.stats.undelivered.load(Ordering::Relaxed),
            listeners: self.listener_count(),
        }
    }
}

impl Default for HealingBus {
    fn default() -> Self {
        Self::new(crate::config::defaults::EVENT_CHANNEL_CAPACITY)
    }
}

/// A registered listener. Dropping it unregisters.
#[derive(Debug)]
pub struct HealingSubscription {
    rx: broadcast::Receiver<HealingEvent>,
}

impl HealingSubscription {
    /// Next event, waiting if none is buffered. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<HealingEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Healing subscriber lagged, oldest events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next buffered event without waiting.
    pub fn try_next(&mut self) -> Option<HealingEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Healing subscriber lagged, oldest events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Everything buffered right now, oldest first.
    pub fn drain(&mut self) -> Vec<HealingEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Convert into a stream (lag errors surface as `Err` items).
    pub fn into_stream(self) -> BroadcastStream<HealingEvent> {
        BroadcastStream::new(self.rx)
    }
}
