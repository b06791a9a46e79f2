//! Error boundary around a renderable component

use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::info;

use super::RecoveryListener;
use crate::healing::{HealingBus, HealingEvent, HealingSubscription};
use crate::tracker::ErrorTracker;

/// Render state of a boundary. Starts Healthy; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum BoundaryState {
    Healthy,
    Failed,
}

/// What a failed boundary shows instead of its content.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FallbackPanel {
    pub component: String,
    pub message: String,
    /// Label of the manual retry action
    pub retry_label: &'static str,
}

impl FallbackPanel {
    fn for_component(component: &str) -> Self {
        Self {
            component: component.to_string(),
            message: format!("Something went wrong in {component}"),
            retry_label: "Try again",
        }
    }
}

/// Result of a render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    Content(T),
    Fallback(FallbackPanel),
}

impl<T> Rendered<T> {
    pub fn content(self) -> Option<T> {
        match self {
            Self::Content(v) => Some(v),
            Self::Fallback(_) => None,
        }
    }

    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Contains render failures of one component so they never escape to the
/// caller, tracks them, and recovers on a matching reload event.
#[derive(Debug)]
pub struct ErrorBoundary {
    component: String,
    state: BoundaryState,
    tracker: ErrorTracker,
    subscription: HealingSubscription,
}

impl ErrorBoundary {
    pub fn new(component: impl Into<String>, tracker: ErrorTracker, bus: &HealingBus) -> Self {
        Self {
            component: component.into(),
            state: BoundaryState::Healthy,
            tracker,
            subscription: bus.subscribe(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub const fn state(&self) -> BoundaryState {
        self.state
    }

    /// Render through the boundary.
    ///
    /// Pending events are applied first. While Failed, `render` is not called
    /// and the fallback panel is returned. A render that returns `Err` or
    /// panics is tracked and moves the boundary to Failed.
    pub fn render<T, E, F>(&mut self, render: F) -> Rendered<T>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::error::Error + 'static,
    {
        self.poll_events();
        if self.state == BoundaryState::Failed {
            return self.fallback();
        }

        match catch_unwind(AssertUnwindSafe(render)) {
            Ok(Ok(content)) => Rendered::Content(content),
            Ok(Err(e)) => {
                self.tracker.track_render_error(&self.component, &e);
                self.fail()
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                self.tracker
                    .track_render_failure(&self.component, message, Some("panicked during render".to_string()));
                self.fail()
            }
        }
    }

    /// User-initiated retry from the fallback panel.
    pub fn retry(&mut self) {
        self.state = BoundaryState::Healthy;
    }

    /// Wait for a reload aimed at this boundary, then reset to Healthy.
    ///
    /// Returns false if the bus shut down first.
    pub async fn wait_for_reload(&mut self) -> bool {
        while let Some(event) = self.subscription.recv().await {
            if self.handle_event(&event) {
                return true;
            }
        }
        false
    }

    fn fail<T>(&mut self) -> Rendered<T> {
        self.state = BoundaryState::Failed;
        self.fallback()
    }

    fn fallback<T>(&self) -> Rendered<T> {
        Rendered::Fallback(FallbackPanel::for_component(&self.component))
    }
}

impl RecoveryListener for ErrorBoundary {
    fn target(&self) -> &str {
        &self.component
    }

    fn handle_event(&mut self, event: &HealingEvent) -> bool {
        match event {
            HealingEvent::Reload { target } if *target == self.component => {
                if self.state == BoundaryState::Failed {
                    info!(component = %self.component, "Reload event received, resetting boundary");
                }
                self.state = BoundaryState::Healthy;
                true
            }
            _ => false,
        }
    }

    fn subscription_mut(&mut self) -> &mut HealingSubscription {
        &mut self.subscription
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "render panicked".to_string()
    }
}
