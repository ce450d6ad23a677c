//! Server-Sent Events support

use crate::runtime::SessionUpdate;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert a session subscription into an SSE stream
pub fn sse_stream(
    init_event: SessionUpdate,
    broadcast_rx: tokio::sync::broadcast::Receiver<SessionUpdate>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Create stream that starts with init event then broadcasts
    let init = futures::stream::once(async move { Ok(to_sse_event(&init_event)) });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(update) => Some(Ok(to_sse_event(&update))),
        Err(_) => None, // Skip lagged messages
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn to_sse_event(update: &SessionUpdate) -> Event {
    let data = serde_json::to_string(update).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialize session update");
        String::from("{}")
    });
    Event::default().event(update.event_type()).data(data)
}
