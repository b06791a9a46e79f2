//! Self-healing: recommendation parsing, typed recovery events and their bus
//!
//! ## Flow
//!
//! - **Recommendation**: validated action from the analysis service
//! - **HealingDispatcher**: one [`HealingEvent`] per recommendation
//! - **HealingBus**: broadcast to every [`HealingSubscription`]

pub mod bus;
pub mod dispatcher;
pub mod events;
pub mod recommendation;

pub use bus::{BusStats, HealingBus, HealingSubscription};
pub use dispatcher::{DispatchReport, HealingDispatcher};
pub use events::HealingEvent;
pub use recommendation::{parse_recommendations, Recommendation, RecommendationError};
