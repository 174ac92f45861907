use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::live::Subscription;
use crate::state::SharedState;

/// Poll cadence for one relay loop.
struct RelayTuning {
    /// Bounded wait for the next published message.
    poll_wait: Duration,
    /// Pause between polls so a busy channel cannot monopolize the scheduler.
    idle_pause: Duration,
}

const MATCH_TUNING: RelayTuning = RelayTuning {
    poll_wait: Duration::from_secs(5),
    idle_pause: Duration::from_millis(200),
};

const NOTIFY_TUNING: RelayTuning = RelayTuning {
    poll_wait: Duration::from_secs(5),
    idle_pause: Duration::from_millis(300),
};

/// Live updates for one match: every event published on
/// `live:match:{match_id}` is forwarded verbatim as a text frame.
pub async fn match_updates(
    ws: WebSocketUpgrade,
    Path(match_id): Path<i64>,
    State(state): State<SharedState>,
) -> Response {
    let subscription = state.bus.subscribe(&crate::live::match_channel(match_id));
    ws.on_upgrade(move |socket| relay(socket, subscription, MATCH_TUNING))
}

/// Personal notifications for one user over `notify:user:{user_id}`.
pub async fn user_notifications(
    ws: WebSocketUpgrade,
    Path(user_id): Path<i64>,
    State(state): State<SharedState>,
) -> Response {
    let subscription = state.bus.subscribe(&crate::live::user_channel(user_id));
    ws.on_upgrade(move |socket| relay(socket, subscription, NOTIFY_TUNING))
}

/// The per-connection relay loop.
///
/// Polls the subscription with a bounded wait and forwards each message in
/// publish order; a short pause between polls keeps the loop cooperative.
/// Exits on client disconnect, send failure or bus shutdown. The
/// subscription itself is released by `Drop` no matter how the loop exits.
async fn relay(socket: WebSocket, mut subscription: Subscription, tuning: RelayTuning) {
    debug!("WebSocket connected to {}", subscription.channel());

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            polled = timeout(tuning.poll_wait, subscription.recv()) => {
                match polled {
                    Ok(Some(payload)) => {
                        if sink.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    // The bus has shut down; nothing more will ever arrive.
                    Ok(None) => break,
                    // Poll window elapsed without a message.
                    Err(_) => {}
                }
                sleep(tuning.idle_pause).await;
            }
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Inbound frames from viewers carry nothing we act on.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    debug!("WebSocket disconnected from {}", subscription.channel());
}
