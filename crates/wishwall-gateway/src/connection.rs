use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use wishwall_types::events::{GatewayCommand, GatewayEvent};

use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// One wall page needs one subscription; this only bounds abuse.
const MAX_SUBSCRIPTIONS: usize = 64;

type Subscriptions = Arc<RwLock<HashSet<Uuid>>>;

/// Handle an upgraded WebSocket. `viewer` is the authenticated user, if the
/// upgrade request carried a valid token.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher, viewer: Option<Uuid>) {
    let _guard = dispatcher.track_connection();
    let (mut sender, receiver) = socket.split();

    let conn_id = Uuid::new_v4();
    info!("gateway connection {} opened (viewer: {:?})", conn_id, viewer);

    if send_event(&mut sender, &GatewayEvent::Ready { user_id: viewer }).await.is_err() {
        return;
    }

    run_connection_loop(sender, receiver, dispatcher, viewer, conn_id).await;
    info!("gateway connection {} closed", conn_id);
}

async fn run_connection_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut receiver: SplitStream<WebSocket>,
    dispatcher: Dispatcher,
    viewer: Option<Uuid>,
    conn_id: Uuid,
) {
    let mut broadcast_rx = dispatcher.subscribe();

    let subscribed: Subscriptions = Arc::new(RwLock::new(HashSet::new()));
    let send_subscriptions = subscribed.clone();

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Replies to commands go through the send task, which owns the sink
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<GatewayEvent>();

    // Forward subscribed inserts -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = broadcast_rx.recv() => {
                    let msg = match result {
                        Ok(msg) => msg,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            warn!("gateway connection {} lagged by {} events", conn_id, n);
                            continue;
                        }
                        Err(_) => break,
                    };

                    let wanted = send_subscriptions
                        .read()
                        .map(|subs| subs.contains(&msg.wall_id()))
                        .unwrap_or(false);
                    if !wanted {
                        continue;
                    }

                    if send_event(&mut sender, &msg.event_for(viewer)).await.is_err() {
                        break;
                    }
                }
                reply = reply_rx.recv() => {
                    let Some(reply) = reply else { break };
                    if send_event(&mut sender, &reply).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("gateway connection {} missed {} pongs, dropping", conn_id, missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read commands from client
    let recv_subscriptions = subscribed.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(cmd) => {
                        if let Some(reply) = handle_command(cmd, &recv_subscriptions, conn_id) {
                            if reply_tx.send(reply).is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        warn!(
                            "gateway connection {} bad command: {} -- raw: {}",
                            conn_id,
                            e,
                            text.chars().take(200).collect::<String>()
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Whichever side finishes first tears the other down
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

/// Apply a command to the connection's subscriptions, returning the reply to
/// send back, if any.
fn handle_command(cmd: GatewayCommand, subscriptions: &Subscriptions, conn_id: Uuid) -> Option<GatewayEvent> {
    let Ok(mut subs) = subscriptions.write() else {
        return None;
    };

    match cmd {
        GatewayCommand::Subscribe { wall_ids } => {
            let mut accepted = Vec::with_capacity(wall_ids.len());
            for id in wall_ids {
                if !subs.contains(&id) && subs.len() >= MAX_SUBSCRIPTIONS {
                    warn!("gateway connection {} hit the subscription limit", conn_id);
                    break;
                }
                subs.insert(id);
                accepted.push(id);
            }
            debug!("gateway connection {} now watching {} walls", conn_id, subs.len());
            Some(GatewayEvent::Subscribed { wall_ids: accepted })
        }
        GatewayCommand::Unsubscribe { wall_ids } => {
            for id in &wall_ids {
                subs.remove(id);
            }
            debug!("gateway connection {} now watching {} walls", conn_id, subs.len());
            None
        }
    }
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &GatewayEvent,
) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            warn!("failed to encode gateway event: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(text.into())).await
}
