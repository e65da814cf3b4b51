//! Push endpoint
//!
//! Long-lived WebSocket connections at `GET /ws/state`. On upgrade the
//! subscriber is registered and immediately sent a snapshot of the current
//! state (plus the current selection, if any); after that it only ever
//! receives broadcasts. The channel is push-only: the sole inbound frame the
//! server answers is a text `"ping"`, with `"pong"`.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use tokio::time::{interval_at, Instant};

use super::AppState;
use crate::session::SubscriberSession;

/// GET /ws/state
pub(super) async fn ws_state(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_subscriber(app, socket))
}

async fn handle_subscriber(app: AppState, mut socket: WebSocket) {
    let (handle, mut rx, snapshot) = app.connect_subscriber().await;
    let mut session = SubscriberSession::new(handle);

    tracing::debug!(subscriber_id = handle.id(), "Push connection established");

    // Immediate snapshot so late joiners are never stale
    for message in snapshot {
        if !send_message(&mut socket, &message, &mut session).await {
            teardown(&app, &mut session).await;
            return;
        }
    }
    session.open();

    let period = app.ping_interval();
    let mut ping = interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            broadcast = rx.recv() => {
                match broadcast {
                    Some(message) => {
                        if !send_message(&mut socket, &message, &mut session).await {
                            break;
                        }
                    }
                    // Registry dropped us (full buffer); close our side too
                    None => break,
                }
            }
            _ = ping.tick() => {
                if socket.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if text.trim().eq_ignore_ascii_case("ping")
                            && socket.send(Message::Text("pong".into())).await.is_err()
                        {
                            break;
                        }
                        // Any other client traffic is ignored
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(
                            subscriber_id = session.handle.id(),
                            error = %e,
                            "Push connection error"
                        );
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    teardown(&app, &mut session).await;
}

/// Forward one message; returns false if the connection is gone.
async fn send_message(
    socket: &mut WebSocket,
    message: &crate::message::PushMessage,
    session: &mut SubscriberSession,
) -> bool {
    let text = match message.to_text() {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode push message");
            return true;
        }
    };

    match socket.send(Message::Text(text.into())).await {
        Ok(()) => {
            session.messages_forwarded += 1;
            true
        }
        Err(_) => false,
    }
}

async fn teardown(app: &AppState, session: &mut SubscriberSession) {
    if session.close() {
        app.registry().unregister(session.handle).await;
        tracing::info!(
            subscriber_id = session.handle.id(),
            forwarded = session.messages_forwarded,
            duration_ms = session.duration().as_millis() as u64,
            "Push connection closed"
        );
    }
}
