//! Event subscribers: UI wrappers that react to healing events
//!
//! Each wrapper owns a [`HealingSubscription`] for its whole lifetime, so it
//! is registered on construction and unregistered on drop. Events are applied
//! whenever the wrapper is next used (or when [`RecoveryListener::poll_events`]
//! is called); only events aimed at the wrapper's own target have an effect.
//!
//! - [`ErrorBoundary`]: reload events, Healthy/Failed render state
//! - [`MonitoredQuery`]: retry events, invalidate and re-issue a fetch
//! - [`FallbackView`]: load-fallback events, swap to default data

pub mod boundary;
pub mod fallback;
pub mod query;

pub use boundary::{BoundaryState, ErrorBoundary, FallbackPanel, Rendered};
pub use fallback::FallbackView;
pub use query::MonitoredQuery;

use crate::healing::{HealingEvent, HealingSubscription};

/// A wrapper that consumes healing events addressed to it.
pub trait RecoveryListener {
    /// Component name or endpoint key this listener answers to.
    fn target(&self) -> &str;

    /// Apply one event. Returns true if it was addressed to this listener
    /// and changed something.
    fn handle_event(&mut self, event: &HealingEvent) -> bool;

    fn subscription_mut(&mut self) -> &mut HealingSubscription;

    /// Apply every buffered event, returning how many took effect.
    fn poll_events(&mut self) -> usize {
        let events = self.subscription_mut().drain();
        events.iter().filter(|e| self.handle_event(e)).count()
    }
}
