//! Healing Dispatcher: recommendations in, typed events out

use serde_json::Value;
use tracing::{debug, info, warn};

use super::bus::HealingBus;
use super::events::HealingEvent;
use super::recommendation::{parse_recommendations, Recommendation};

/// Outcome of dispatching one batch of raw recommendations.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct DispatchReport {
    /// Events broadcast
    pub dispatched: usize,
    /// Entries that failed validation
    pub rejected: usize,
}

/// Fans recommendations out onto the [`HealingBus`]. No acknowledgement is
/// collected from listeners.
#[derive(Debug, Clone)]
pub struct HealingDispatcher {
    bus: HealingBus,
}

impl HealingDispatcher {
    pub fn new(bus: HealingBus) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &HealingBus {
        &self.bus
    }

    /// Broadcast one event per recommendation, in order.
    pub fn apply_healing_recommendations(&self, recommendations: Vec<Recommendation>) -> usize {
        let count = recommendations.len();
        for rec in recommendations {
            let event = HealingEvent::from(rec);
            let reached = self.bus.publish(event.clone());
            debug!(event = %event, listeners = reached, "Healing event dispatched");
        }
        count
    }

    /// Validate raw service output, log and skip what fails, dispatch the rest.
    pub fn apply_raw(&self, raw: &[Value]) -> DispatchReport {
        let (accepted, rejected) = parse_recommendations(raw);
        for err in &rejected {
            warn!(error = %err, "Ignoring healing recommendation");
        }
        let dispatched = self.apply_healing_recommendations(accepted);
        if dispatched > 0 {
            info!(dispatched, rejected = rejected.len(), "Applied healing recommendations");
        }
        DispatchReport {
            dispatched,
            rejected: rejected.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn each_kind_maps_to_its_event() {
        let bus = HealingBus::new(16);
        let mut sub = bus.subscribe();
        let dispatcher = HealingDispatcher::new(bus);

        let report = dispatcher.apply_raw(&[
            json!({"action": "reload_component", "target": "SalesChart"}),
            json!({"action": "retry_request", "target": "sales", "maxRetries": 2}),
            json!({"action": "load_fallback_data", "target": "CustomerTable"}),
        ]);
        assert_eq!(report, DispatchReport { dispatched: 3, rejected: 0 });

        assert_eq!(
            sub.drain(),
            vec![
                HealingEvent::Reload { target: "SalesChart".to_string() },
                HealingEvent::Retry { endpoint: "sales".to_string(), max_retries: Some(2) },
                HealingEvent::LoadFallback { target: "CustomerTable".to_string() },
            ]
        );
    }

    #[test]
    fn unknown_kinds_are_skipped_quietly() {
        let bus = HealingBus::new(16);
        let mut sub = bus.subscribe();
        let dispatcher = HealingDispatcher::new(bus);

        let report = dispatcher.apply_raw(&[
            json!({"action": "format_disk", "target": "/"}),
            json!({"action": "reload_component", "target": "A"}),
            json!(42),
        ]);
        assert_eq!(report, DispatchReport { dispatched: 1, rejected: 2 });
        assert_eq!(sub.drain().len(), 1);
    }

    #[test]
    fn dispatch_with_no_listeners_still_succeeds() {
        let dispatcher = HealingDispatcher::new(HealingBus::new(4));
        let sent = dispatcher.apply_healing_recommendations(vec![Recommendation::ReloadComponent {
            target: "A".to_string(),
        }]);
        assert_eq!(sent, 1);
        assert_eq!(dispatcher.bus().stats().undelivered, 1);
    }
}
