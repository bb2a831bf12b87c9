//! Server-Sent Events stream of run progress.

use std::convert::Infallible;
use std::time::Duration;

use autovote_runner::LogPayload;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::state::AppState;

/// GET /api/logs - one `data:` event per log line, from connection onwards.
pub async fn logs_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.log.subscribe();
    debug!(observers = state.log.observers(), "log client connected");

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(line) => {
                    let payload = LogPayload::from(&line);
                    if let Ok(json) = serde_json::to_string(&payload) {
                        yield Ok(Event::default().data(json));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "log client lagged, some lines dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping"))
}
