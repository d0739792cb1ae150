//! WebSocket session handler
//!
//! Per-connection lifecycle: subscribe to the hub, push one `initial_state`
//! built from the latest published snapshot, then forward `stream_update`s
//! in tick order. Inbound `ai_question`s are answered out of band to this
//! session only; `ping` yields `pong`; malformed input closes this session
//! and nothing else.
//!
//! Backpressure: every outbound message goes through a bounded queue
//! drained by a single writer task. A full queue drops the current update
//! for this session only — the broadcaster never blocks on a slow viewer.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::handlers::DashboardState;
use crate::config::defaults::SESSION_OUTBOUND_CAPACITY;
use crate::types::{ClientMessage, ServerMessage};

/// GET /ws - Upgrade to the duplex viewer channel
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<DashboardState>) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, state))
}

/// Session states: Connecting (handshake) -> Active (forwarding) ->
/// Closed (removed from fan-out). Dropping the hub guard on any exit path
/// performs the Closed transition.
async fn run_session(socket: WebSocket, state: DashboardState) {
    // Subscribe BEFORE snapshotting so no tick can fall between the
    // handshake and the first forwarded update.
    let (mut updates, _guard) = state.hub.subscribe();
    let initial = state.dashboard.read().await.clone();

    info!(clients = state.hub.client_count(), "[WS] Session connected");

    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerMessage>(SESSION_OUTBOUND_CAPACITY);

    // Single writer: everything this session sends flows through one queue,
    // preserving per-session ordering.
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(t) => t,
                Err(e) => {
                    warn!(error = %e, "[WS] Failed to encode outbound message");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Handshake: exactly one initial_state, reflecting live state at
    // connect time.
    let handshake = ServerMessage::InitialState {
        trucks: initial.latest.trucks.clone(),
        alerts: initial.alerts.clone(),
        kpi: initial.latest.kpi.clone(),
        fleet_risk: initial.latest.fleet_risk.clone(),
        fleet_stats: initial.latest.fleet_stats.clone(),
        eta_history: initial.eta_history.clone(),
        speed_history: initial.speed_history.clone(),
        risk_history: initial.risk_history.clone(),
    };
    let handshake_tick = initial.latest.tick;
    if outbound_tx.send(handshake).await.is_err() {
        writer.abort();
        return;
    }

    loop {
        tokio::select! {
            update = updates.recv() => {
                match update {
                    Ok(snapshot) => {
                        // The handshake already covered this tick
                        if snapshot.tick <= handshake_tick {
                            continue;
                        }
                        let message = ServerMessage::StreamUpdate {
                            trucks: snapshot.trucks.clone(),
                            alerts: snapshot.new_alerts.clone(),
                            kpi: snapshot.kpi.clone(),
                            fleet_risk: snapshot.fleet_risk.clone(),
                            fleet_stats: snapshot.fleet_stats.clone(),
                        };
                        // Slow consumer: drop this update rather than block
                        if outbound_tx.try_send(message).is_err() {
                            debug!(tick = snapshot.tick, "[WS] Outbound queue full — dropping update");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Missed ticks are simply skipped; no replay
                        debug!(skipped, "[WS] Session lagged behind the hub");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::AiQuestion { question }) => {
                                // Out of band: a slow collaborator must not
                                // stall this loop or any other session
                                let assistant = state.assistant.clone();
                                let reply_tx = outbound_tx.clone();
                                tokio::spawn(async move {
                                    let reply = assistant.ask(&question).await;
                                    let _ = reply_tx.send(reply).await;
                                });
                            }
                            Ok(ClientMessage::Ping) => {
                                let _ = outbound_tx.try_send(ServerMessage::Pong);
                            }
                            Err(e) => {
                                warn!(error = %e, "[WS] Malformed inbound message — closing session");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // binary/ping/pong frames ignored
                    Some(Err(e)) => {
                        debug!(error = %e, "[WS] Receive error — closing session");
                        break;
                    }
                }
            }
        }
    }

    // Cancel only this session's in-flight send
    writer.abort();
    info!(
        clients = state.hub.client_count().saturating_sub(1),
        "[WS] Session closed"
    );
}
