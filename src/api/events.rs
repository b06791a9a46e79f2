//! Server-Sent Events stream of healing events
//!
//! Each connected dashboard tab gets its own bus subscription, released when
//! the client disconnects. The SSE `event:` field carries the event name so
//! browsers can use `addEventListener("dashboard:reload-component", ...)`.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use tracing::{info, warn};

use crate::service::DashboardIntelligence;

/// GET /api/v1/events
pub async fn event_stream(
    State(intel): State<DashboardIntelligence>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(listeners = intel.bus().listener_count() + 1, "Healing event stream connected");

    let stream = intel
        .bus()
        .subscribe()
        .into_stream()
        .filter_map(|result| async move {
            match result {
                Ok(event) => match Event::default().event(event.name()).json_data(&event) {
                    Ok(sse) => Some(Ok(sse)),
                    Err(e) => {
                        warn!(error = %e, "Failed to serialize healing event");
                        None
                    }
                },
                Err(e) => {
                    warn!(error = %e, "Healing event stream lagged");
                    None
                }
            }
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
