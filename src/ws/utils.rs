//! WebSocket Utilities - Funzioni di supporto per l'invio di eventi

use crate::AppState;
use crate::dtos::{MessageDTO, ServerEvent};
use crate::entities::{Chat, ChatKind};
use crate::ws::usermap::InternalSignal;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, instrument};

/// Invia un evento a tutti i client iscritti al canale della stanza
pub fn broadcast_to_room(state: &AppState, room_id: i32, event: ServerEvent) -> usize {
    state.rooms_online.send(room_id, Arc::new(event))
}

/// Invia un evento a un singolo utente, se connesso
pub fn notify_user(state: &AppState, user_id: i32, event: ServerEvent) -> bool {
    state.users_online.send_event_if_online(user_id, Arc::new(event))
}

/// Invia un evento di errore sul canale della connessione che ha originato la richiesta
pub fn send_error(reply: &UnboundedSender<InternalSignal>, code: u16, message: impl Into<String>) {
    let event = ServerEvent::error(code, message);
    if reply.send(InternalSignal::Event(Arc::new(event))).is_err() {
        debug!("Connection already closed, error not delivered");
    }
}

/// Consegna un messaggio di chat appena salvato.
/// Le chat di stanza passano dal canale broadcast della stanza; le chat
/// dirette (o di stanze senza canale attivo) vanno a ogni membro online.
#[instrument(skip(state, chat, message), fields(chat_id = chat.chat_id))]
pub async fn deliver_chat_message(
    state: &AppState,
    chat: &Chat,
    message: MessageDTO,
) -> Result<usize, sqlx::Error> {
    let event = Arc::new(ServerEvent::NewMessage(message));

    if let (ChatKind::Room, Some(room_id)) = (chat.kind, chat.room_id) {
        let receivers = state.rooms_online.send(room_id, event.clone());
        if receivers > 0 {
            debug!(receivers, "Room chat message broadcast");
            return Ok(receivers);
        }
    }

    let members = state.chat.find_member_ids(chat.chat_id).await?;
    let mut sent_count = 0;
    for member_id in &members {
        if state.users_online.send_event_if_online(*member_id, event.clone()) {
            sent_count += 1;
        }
    }
    debug!(
        "Chat {}: {} online members reached out of {}",
        chat.chat_id,
        sent_count,
        members.len()
    );
    Ok(sent_count)
}
