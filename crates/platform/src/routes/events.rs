//! Sync event stream.
//!
//! Browsers subscribe to `GET /api/events` and re-fetch whatever an event
//! names. A subscriber that falls behind receives a single `RELOAD` event
//! instead of the skipped ones.

use std::convert::Infallible;

use async_stream::stream;
use axum::{
    extract::{Query, State},
    response::{
        Sse,
        sse::{Event, KeepAlive},
    },
};
use futures::Stream;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use bazaar_core::StoreId;

use crate::services::SyncMessage;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsQuery {
    /// Only forward events about this store.
    pub store_id: Option<StoreId>,
}

fn wanted(message: &SyncMessage, store_id: Option<&StoreId>) -> bool {
    store_id.is_none_or(|wanted| message.event.store_id() == Some(wanted))
}

/// Stream sync events as SSE `data:` frames.
///
/// GET /api/events
pub async fn stream(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.sync().subscribe();
    let store_id = query.store_id;
    debug!(store_id = ?store_id, "Sync subscriber connected");

    let events = stream! {
        loop {
            match rx.recv().await {
                Ok(message) if wanted(&message, store_id.as_ref()) => {
                    let json = serde_json::to_string(&message).unwrap_or_else(|_| {
                        r#"{"type":"ERROR","message":"Failed to serialize event"}"#.to_string()
                    });
                    yield Ok::<_, Infallible>(Event::default().data(json));
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    let reload = json!({ "type": "RELOAD", "skipped": skipped });
                    yield Ok::<_, Infallible>(Event::default().data(reload.to_string()));
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(events).keep_alive(KeepAlive::default())
}
