//! The Subscriber Hub (distilled spec §4.H): accepts WebSocket connections
//! at `/ws`, pushes the current snapshot on connect, relays every
//! state-changing update, and pings for liveness. Grounded on the
//! split-sender/receiver + bounded-forwarder-channel shape of
//! `examples/Lowband21-ferrex/ferrex-server/src/handlers/handle_websocket.rs`
//! (the teacher has no real-time transport of its own).

pub mod wire;

use crate::store::ActivityStore;
use crate::types::session::Session;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};
use wire::{ServerMessage, SessionWire};

/// Shared hub state: a handle to the live store (for the initial snapshot
/// on connect) plus the broadcast channel the Expiry/Archiver and
/// Grouping Rules publish state-changing snapshots on.
#[derive(Clone)]
pub struct HubState {
    pub store: ActivityStore,
    pub updates: broadcast::Sender<Vec<Session>>,
    pub ping_interval: Duration,
}

impl HubState {
    pub fn new(store: ActivityStore, updates: broadcast::Sender<Vec<Session>>, ping_interval_secs: u64) -> Self {
        Self {
            store,
            updates,
            ping_interval: Duration::from_secs(ping_interval_secs),
        }
    }
}

pub fn router(state: Arc<HubState>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<Arc<HubState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn snapshot_message(sessions: &[Session]) -> Message {
    let wire: Vec<SessionWire> = sessions.iter().map(SessionWire::from).collect();
    let payload = ServerMessage::ActivityUpdate { data: wire };
    match serde_json::to_string(&payload) {
        Ok(text) => Message::Text(text),
        Err(e) => {
            warn!(error = %e, "failed to serialize activity update, sending empty snapshot");
            Message::Text("{\"type\":\"activityUpdate\",\"data\":[]}".to_string())
        }
    }
}

/// Waits for the next state change, draining any further updates that
/// arrived while we were behind so only the newest reaches the client
/// (distilled spec §4.H: "drop intermediate snapshots, latest-wins").
async fn recv_latest(rx: &mut broadcast::Receiver<Vec<Session>>) -> Option<Vec<Session>> {
    let mut latest = loop {
        match rx.recv().await {
            Ok(v) => break v,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "subscriber lagged, catching up to latest snapshot");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    };
    while let Ok(v) = rx.try_recv() {
        latest = v;
    }
    Some(latest)
}

async fn handle_socket(socket: WebSocket, state: Arc<HubState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(4);

    let initial = state.store.snapshot().await;
    if tx.send(snapshot_message(&initial)).await.is_err() {
        return;
    }

    let forwarder = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let last_pong = Arc::new(Mutex::new(Instant::now()));

    let update_task = {
        let tx = tx.clone();
        let mut updates = state.updates.subscribe();
        tokio::spawn(async move {
            while let Some(sessions) = recv_latest(&mut updates).await {
                if tx.send(snapshot_message(&sessions)).await.is_err() {
                    break;
                }
            }
        })
    };

    let ping_task = {
        let tx = tx.clone();
        let last_pong = Arc::clone(&last_pong);
        let interval = state.ping_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately, skip it
            loop {
                ticker.tick().await;
                if tx.send(Message::Text("ping".to_string())).await.is_err() {
                    return;
                }
                let elapsed = last_pong.lock().unwrap_or_else(|e| e.into_inner()).elapsed();
                if elapsed > interval * 2 {
                    warn!("subscriber missed pong within liveness window, closing");
                    return;
                }
            }
        })
    };

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) if text == "pong" => {
                *last_pong.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "subscriber socket error");
                break;
            }
        }
    }

    forwarder.abort();
    update_task.abort();
    ping_task.abort();
}
