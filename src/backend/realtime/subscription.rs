/**
 * Real-time Subscription Handler
 *
 * Server-Sent Events stream for `GET /api/realtime`. The caller's identity
 * comes from the bearer token, so a device only ever sees events addressed
 * to its own user.
 *
 * # Connection Management
 *
 * - Connections are kept alive using the SSE keep-alive mechanism
 * - Lagged receivers skip ahead; the next event makes the device pull anyway
 * - The stream ends when the broadcast channel closes
 */
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream;
use tokio::sync::broadcast::error::RecvError;
use tokio_stream::Stream;

use crate::backend::middleware::auth::AuthUser;
use crate::backend::realtime::broadcast::RealtimeEventBroadcast;

/// Handle real-time subscription (GET /api/realtime)
///
/// # Example Response
///
/// ```http
/// HTTP/1.1 200 OK
/// Content-Type: text/event-stream
///
/// event: operations_available
/// data: {"event_type":"operations_available","payload":{"channels":["regular"]},"timestamp":"..."}
/// ```
pub async fn handle_realtime_subscription(
    State(broadcast_tx): State<RealtimeEventBroadcast>,
    AuthUser(user): AuthUser,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    tracing::info!(
        "[Realtime] Device {} of user {} subscribed",
        user.device_id,
        user.user_id
    );

    let broadcast_rx = broadcast_tx.subscribe();
    let user_id = user.user_id;
    let device_id = user.device_id;

    // Only yield addressed events; keep-alive comments hold the connection
    let stream = stream::unfold(broadcast_rx, move |mut rx| {
        let device_id = device_id.clone();
        async move {
            loop {
                match rx.recv().await {
                    Ok(addressed) => {
                        if !addressed.is_for(user_id, &device_id) {
                            continue;
                        }

                        let event_data = match serde_json::to_string(&addressed.event) {
                            Ok(data) => data,
                            Err(e) => {
                                tracing::error!("[Realtime] Failed to serialize event: {:?}", e);
                                continue;
                            }
                        };

                        let sse_event = Event::default()
                            .event(addressed.event.event_type.name())
                            .data(event_data);
                        return Some((Ok::<Event, axum::Error>(sse_event), rx));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("[Realtime] Receiver lagged, skipped {} events", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => {
                        tracing::warn!("[Realtime] Broadcast channel closed, ending stream");
                        return None;
                    }
                }
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
