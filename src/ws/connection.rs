//! WebSocket Connection Management - Gestione connessioni WebSocket

use crate::ws::{RATE_LIMITER_MILLIS, TIMEOUT_DURATION_SECONDS};
use crate::{
    AppState,
    dtos::{ClientEvent, ServerEvent},
    ws::{event_handlers::process_event, usermap::InternalSignal, utils::send_error},
};
use axum::extract::ws::Utf8Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::Duration;
use tokio::time::{interval, timeout};
use tokio_stream::StreamMap;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, error, info, instrument, warn};

#[instrument(skip(ws, state), fields(user_id))]
pub async fn handle_socket(ws: WebSocket, state: Arc<AppState>, user_id: i32) {
    info!("WebSocket connection established");

    // Dividiamo il WebSocket in due metà: sender e receiver
    let (ws_tx, ws_rx) = ws.split();

    // Canale unbounded per la comunicazione interna verso il task di scrittura
    let (int_tx, int_rx) = unbounded_channel::<InternalSignal>();

    // Una eventuale connessione precedente dello stesso utente riceve Shutdown
    state.users_online.register_online(user_id, int_tx.clone());
    info!("User registered as online");

    // task in ascolto del websocket
    tokio::spawn(listen_ws(user_id, ws_rx, int_tx, state.clone()));

    // task in ascolto dei canali broadcast delle stanze e dei segnali interni
    tokio::spawn(write_ws(user_id, ws_tx, int_rx, state));
}

#[instrument(skip(websocket_tx, internal_rx, state), fields(user_id))]
pub async fn write_ws(
    user_id: i32,
    mut websocket_tx: SplitSink<WebSocket, Message>,
    mut internal_rx: UnboundedReceiver<InternalSignal>,
    state: Arc<AppState>,
) {
    info!("Write task started");

    // Stanze ancora attive di cui l'utente è partecipante (riconnessione a partita in corso)
    let room_ids: Vec<i32> = match state.participant.find_live_room_ids(user_id).await {
        Ok(rooms) => {
            info!(room_count = rooms.len(), "User rooms loaded");
            rooms
        }
        Err(e) => {
            error!("Failed to load user rooms: {:?}", e);
            return; // Termina se DB fallisce
        }
    };

    let mut stream_map = StreamMap::new();
    for (room_id, rx) in state.rooms_online.subscribe_multiple(room_ids) {
        stream_map.insert(room_id, BroadcastStream::new(rx));
    }

    'external: loop {
        tokio::select! {
            Some((room_id, result)) = tokio_stream::StreamExt::next(&mut stream_map) => {
                match result {
                    Ok(event) => {
                        if send_event(&mut websocket_tx, &event).await.is_err() {
                            warn!("Failed to send room event, closing connection");
                            break 'external;
                        }
                        if matches!(*event, ServerEvent::RoomClosed { .. } | ServerEvent::GameEnded { .. }) {
                            debug!(room_id, "Room finished, dropping subscription");
                            stream_map.remove(&room_id);
                        }
                    }
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(room_id, skipped, "Client lagging behind room events");
                    }
                }
            }

            signal = internal_rx.recv() => {
                match signal {
                    Some(InternalSignal::Shutdown) => {
                        info!("Shutdown signal received");
                        break 'external;
                    }
                    Some(InternalSignal::SubscribeRoom(room_id)) => {
                        if !stream_map.contains_key(&room_id) {
                            info!(room_id, "Adding room subscription");
                            let rx = state.rooms_online.subscribe(room_id);
                            stream_map.insert(room_id, BroadcastStream::new(rx));
                        }
                    }
                    Some(InternalSignal::UnsubscribeRoom(room_id)) => {
                        info!(room_id, "Removing room subscription");
                        stream_map.remove(&room_id);
                    }
                    Some(InternalSignal::Event(event)) => {
                        if send_event(&mut websocket_tx, &event).await.is_err() {
                            warn!("Failed to send event, closing connection");
                            break 'external;
                        }
                    }
                    None => {
                        info!("Internal channel closed");
                        break 'external; // canale chiuso, quindi listener ws chiuso, quindi stacca tutto
                    }
                }
            }
        }
    }

    let _ = websocket_tx.close().await;
    info!("Write task terminated");
}

async fn send_event(
    websocket_tx: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).map_err(|e| {
        error!("Failed to serialize event: {:?}", e);
        axum::Error::new(e)
    })?;
    websocket_tx
        .send(Message::Text(Utf8Bytes::from(json)))
        .await
        .map_err(|e| {
            error!("Failed to send event through WebSocket: {:?}", e);
            e
        })
}

#[instrument(skip(websocket_rx, internal_tx, state), fields(user_id))]
pub async fn listen_ws(
    user_id: i32,
    mut websocket_rx: SplitStream<WebSocket>,
    internal_tx: UnboundedSender<InternalSignal>,
    state: Arc<AppState>,
) {
    info!("Listen task started");

    let mut rate_limiter = interval(Duration::from_millis(RATE_LIMITER_MILLIS));
    let timeout_duration = Duration::from_secs(TIMEOUT_DURATION_SECONDS);

    loop {
        match timeout(timeout_duration, StreamExt::next(&mut websocket_rx)).await {
            Ok(Some(msg_result)) => {
                rate_limiter.tick().await;

                let msg = match msg_result {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("WebSocket error: {:?}", e);
                        break;
                    }
                };

                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => {
                            debug!(?event, "Event received from client");
                            process_event(&state, user_id, event, &internal_tx).await;
                        }
                        Err(e) => {
                            warn!("Failed to deserialize client event: {}", e);
                            send_error(&internal_tx, 400, "Malformed event");
                        }
                    },
                    Message::Close(_) => {
                        info!("Close message received");
                        break;
                    }
                    _ => {}
                }
            }
            Ok(None) => {
                info!("WebSocket stream ended");
                break;
            }
            Err(_) => {
                warn!(timeout_secs = TIMEOUT_DURATION_SECONDS, "Connection timeout");
                break;
            }
        }
    }

    // Cleanup: rimuove solo la propria registrazione, non quella di una connessione più recente
    info!("Cleaning up connection");
    let _ = internal_tx.send(InternalSignal::Shutdown);
    state.users_online.remove_from_online(user_id, &internal_tx);
    info!("Listen task terminated");
}
