//! Fallback view: live data with a default to fall back on

use tracing::info;

use super::RecoveryListener;
use crate::healing::{HealingBus, HealingEvent, HealingSubscription};

/// Data-display wrapper. A load-fallback event for its component switches it
/// to the default data until fresh live data is supplied.
#[derive(Debug)]
pub struct FallbackView<T> {
    component: String,
    live: Option<T>,
    fallback: T,
    using_fallback: bool,
    subscription: HealingSubscription,
}

impl<T> FallbackView<T> {
    pub fn new(component: impl Into<String>, fallback: T, bus: &HealingBus) -> Self {
        Self {
            component: component.into(),
            live: None,
            fallback,
            using_fallback: false,
            subscription: bus.subscribe(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    /// New live data; leaves fallback mode.
    pub fn set_live(&mut self, data: T) {
        self.live = Some(data);
        self.using_fallback = false;
    }

    /// Data to display: live data unless a fallback was requested or none
    /// has arrived yet.
    pub fn current(&mut self) -> &T {
        self.poll_events();
        match &self.live {
            Some(live) if !self.using_fallback => live,
            _ => &self.fallback,
        }
    }

    pub const fn is_using_fallback(&self) -> bool {
        self.using_fallback
    }
}

impl<T> RecoveryListener for FallbackView<T> {
    fn target(&self) -> &str {
        &self.component
    }

    fn handle_event(&mut self, event: &HealingEvent) -> bool {
        match event {
            HealingEvent::LoadFallback { target } if *target == self.component => {
                info!(component = %self.component, "Load-fallback event received");
                self.using_fallback = true;
                true
            }
            _ => false,
        }
    }

    fn subscription_mut(&mut self) -> &mut HealingSubscription {
        &mut self.subscription
    }
}
