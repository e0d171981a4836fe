//! WebSocket Module - Gestione WebSocket per comunicazione real-time
//!
//! Questo modulo gestisce le connessioni WebSocket per il gioco multiplayer
//! e la chat in tempo reale. Include:
//! - Gestione upgrade HTTP -> WebSocket
//! - Gestione connessioni (split sender/receiver)
//! - Dispatch degli eventi del client verso la logica di gioco
//! - Mappe di presenza di utenti e stanze

pub mod connection;
pub mod event_handlers;
pub mod roommap;
pub mod usermap;
pub mod utils;

// Re-exports pubblici
pub use connection::handle_socket;
pub use utils::{broadcast_to_room, notify_user, send_error};

use crate::{AppState, entities::User};
use axum::{
    Extension,
    extract::{State, ws::WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;

/// Capacità dei canali broadcast di stanza; i client più lenti perdono gli eventi più vecchi
pub const BROADCAST_CHANNEL_CAPACITY: usize = 64;

/// Intervallo minimo tra due eventi letti dallo stesso client
pub const RATE_LIMITER_MILLIS: u64 = 50;

/// Chiusura della connessione dopo questo periodo senza traffico dal client
pub const TIMEOUT_DURATION_SECONDS: u64 = 300;

/// Entry point per gestire richieste di upgrade WebSocket
/// Operazioni:
/// 1. Estrarre user_id dall'autenticazione JWT
/// 2. Eseguire upgrade HTTP -> WebSocket
/// 3. Passare la connessione ad handle_socket
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione JWT
) -> Response {
    let user_id = current_user.user_id;

    // Gestisce automaticamente l'upgrade a WebSocket.
    // Se l'upgrade fallisce, ritorna un errore; altrimenti restituisce la nuova connessione al client.
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}
