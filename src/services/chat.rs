//! Chat services - Chat dirette, chat di stanza e messaggi

use crate::core::{AppError, AppState};
use crate::dtos::{ChatDTO, CreateMessageDTO, MessageDTO, MessagesQuery, NewMessageDTO};
use crate::entities::{Chat, ChatKind, User};
use crate::repositories::{Create, Read};
use crate::ws::utils::deliver_chat_message;
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

const MESSAGES_PAGE_SIZE: i64 = 50;

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_chats(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<ChatDTO>>, AppError> {
    debug!("Listing chats for user");
    let chats = state.chat.find_many_by_user(current_user.user_id).await?;

    // membri di tutte le chat caricati in parallelo
    let members = futures::future::try_join_all(
        chats.iter().map(|chat| state.chat.find_member_ids(chat.chat_id)),
    )
    .await?;

    let result: Vec<ChatDTO> = chats
        .into_iter()
        .zip(members)
        .map(|(chat, member_ids)| ChatDTO::from(chat).with_members(member_ids))
        .collect();
    info!("Found {} chats", result.len());
    Ok(Json(result))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, other_id = %other_id))]
pub async fn open_direct_chat(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(other_id): Path<i32>, // l'altro utente della chat diretta
) -> Result<Json<ChatDTO>, AppError> {
    debug!("Opening direct chat");
    // 1. Nessuna chat con se stessi, l'altro utente deve esistere
    // 2. Le chat dirette sono consentite solo tra amici
    // 3. Ritornare la chat esistente oppure crearla
    if other_id == current_user.user_id {
        return Err(AppError::bad_request("Cannot open a chat with yourself"));
    }
    if state.user.read(&other_id).await?.is_none() {
        return Err(AppError::not_found("User not found"));
    }
    if !state.friendship.are_friends(current_user.user_id, other_id).await? {
        warn!("Direct chat refused: users are not friends");
        return Err(AppError::forbidden("Direct chats are only available between friends"));
    }

    let chat = match state
        .chat
        .find_direct_between(current_user.user_id, other_id)
        .await?
    {
        Some(chat) => chat,
        None => {
            let chat = state.chat.create_direct(current_user.user_id, other_id).await?;
            info!("Direct chat {} created", chat.chat_id);
            chat
        }
    };

    let members = state.chat.find_member_ids(chat.chat_id).await?;
    Ok(Json(ChatDTO::from(chat).with_members(members)))
}

#[instrument(skip(state, current_user, chat), fields(chat_id = %chat.chat_id, user_id = %current_user.user_id))]
pub async fn get_chat_messages(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Extension(chat): Extension<Chat>, // inserito da chat_membership_middleware
    Query(params): Query<MessagesQuery>, // query params /chats/{id}/messages?before_date=...
) -> Result<Json<Vec<MessageDTO>>, AppError> {
    debug!("Fetching messages");
    let messages = state
        .msg
        .find_many_paginated(chat.chat_id, params.before_date, MESSAGES_PAGE_SIZE)
        .await?;
    info!("Retrieved {} messages", messages.len());
    Ok(Json(messages.into_iter().map(MessageDTO::from).collect()))
}

#[instrument(skip(state, current_user, chat, body), fields(chat_id = %chat.chat_id, user_id = %current_user.user_id))]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Extension(chat): Extension<Chat>, // inserito da chat_membership_middleware
    Json(body): Json<CreateMessageDTO>,
) -> Result<impl IntoResponse, AppError> {
    let message = send_chat_message(&state, current_user.user_id, &chat, body.content).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Nelle chat dirette si scrive solo finché i due utenti restano amici
async fn ensure_direct_chat_allowed(state: &AppState, sender_id: i32, chat: &Chat) -> Result<(), AppError> {
    if chat.kind != ChatKind::Direct {
        return Ok(());
    }
    let member_ids = state.chat.find_member_ids(chat.chat_id).await?;
    let Some(other_id) = member_ids.into_iter().find(|id| *id != sender_id) else {
        return Err(AppError::forbidden("Direct chats are only available between friends"));
    };
    if !state.friendship.are_friends(sender_id, other_id).await? {
        warn!("Message refused: user {} and {} are no longer friends", sender_id, other_id);
        return Err(AppError::forbidden("Direct chats are only available between friends"));
    }
    Ok(())
}

/// Salva e consegna un messaggio. Il mittente deve già essere stato
/// verificato come membro della chat.
pub async fn send_chat_message(
    state: &AppState,
    sender_id: i32,
    chat: &Chat,
    content: String,
) -> Result<MessageDTO, AppError> {
    let body = CreateMessageDTO { content };
    body.validate()?;
    if body.content.trim().is_empty() {
        return Err(AppError::bad_request("Message content cannot be blank"));
    }
    ensure_direct_chat_allowed(state, sender_id, chat).await?;

    let message = state
        .msg
        .create(&NewMessageDTO {
            chat_id: chat.chat_id,
            sender_id,
            content: body.content,
        })
        .await?;
    let dto = MessageDTO::from(message);

    deliver_chat_message(state, chat, dto.clone()).await?;
    Ok(dto)
}

/// Variante usata dal canale WebSocket: verifica chat e membership a partire dall'id
#[instrument(skip(state, content))]
pub async fn send_message_to_chat(
    state: &AppState,
    sender_id: i32,
    chat_id: i32,
    content: String,
) -> Result<MessageDTO, AppError> {
    let chat = state
        .chat
        .read(&chat_id)
        .await?
        .ok_or_else(|| AppError::not_found("Chat not found"))?;
    if !state.chat.is_member(&chat_id, &sender_id).await? {
        warn!("User {} is not a member of chat {}", sender_id, chat_id);
        return Err(AppError::forbidden("You are not a member of this chat"));
    }
    send_chat_message(state, sender_id, &chat, content).await
}
