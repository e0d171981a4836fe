//! WebSocket Event Handlers - Handler per eventi WebSocket
//!
//! Ogni evento del client viene tradotto nella stessa operazione esposta
//! dalle API REST. Gli aggiornamenti di stanza arrivano a tutti i partecipanti
//! tramite il canale broadcast della stanza; al mittente rispondiamo solo con
//! lo stato iniziale (join), l'esito della risposta o un evento di errore.

use crate::AppState;
use crate::core::AppError;
use crate::dtos::{ClientEvent, RoomAnswerDTO, ServerEvent};
use crate::gameplay;
use crate::services::chat::send_message_to_chat;
use crate::ws::usermap::InternalSignal;
use crate::ws::utils::send_error;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, instrument, warn};

/// Esegue un evento del client.
/// `reply` è il canale interno della connessione che ha inviato l'evento.
#[instrument(skip(state, event, reply), fields(user_id))]
pub async fn process_event(
    state: &AppState,
    user_id: i32,
    event: ClientEvent,
    reply: &UnboundedSender<InternalSignal>,
) {
    let result: Result<Option<ServerEvent>, AppError> = match event {
        ClientEvent::JoinRoom { room_id } => gameplay::join_room(state, user_id, room_id)
            .await
            .map(|details| Some(ServerEvent::RoomState(details))),

        ClientEvent::LeaveRoom { room_id } => gameplay::leave_room(state, user_id, room_id)
            .await
            .map(|_| None),

        ClientEvent::StartGame { room_id } => gameplay::start_game(state, user_id, room_id)
            .await
            .map(|_| None),

        ClientEvent::NextQuestion { room_id } => gameplay::next_question(state, user_id, room_id)
            .await
            .map(|_| None),

        ClientEvent::SubmitAnswer {
            room_id,
            question_id,
            selected_option_ids,
        } => {
            let answer = RoomAnswerDTO {
                question_id,
                selected_option_ids,
            };
            gameplay::submit_answer(state, user_id, room_id, answer)
                .await
                .map(|outcome| Some(ServerEvent::AnswerResult(outcome)))
        }

        ClientEvent::EndGame { room_id } => gameplay::end_game(state, user_id, room_id)
            .await
            .map(|_| None),

        // il messaggio torna anche al mittente come membro della chat
        ClientEvent::SendMessage { chat_id, content } => {
            send_message_to_chat(state, user_id, chat_id, content)
                .await
                .map(|_| None)
        }
    };

    match result {
        Ok(Some(event)) => {
            if reply.send(InternalSignal::Event(Arc::new(event))).is_err() {
                debug!("Connection closed before reply");
            }
        }
        Ok(None) => {}
        Err(err) => {
            warn!("Event rejected: {}", err);
            let message = match err.details() {
                Some(details) => format!("{}: {}", err.message(), details),
                None => err.message().to_string(),
            };
            send_error(reply, err.status().as_u16(), message);
        }
    }
}
