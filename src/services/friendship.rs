//! Friendship services - Richieste di amicizia e lista amici

use crate::core::{AppError, AppState};
use crate::dtos::{
    FriendAction, FriendDTO, FriendRequestDTO, FriendshipDTO, RespondFriendRequestDTO, ServerEvent,
};
use crate::entities::{FriendshipStatus, User};
use crate::repositories::{Delete, Read};
use crate::ws::utils::notify_user;
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_macros::debug_handler;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, target_id = %body.user_id))]
pub async fn send_friend_request(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<FriendRequestDTO>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Sending friend request");
    // 1. Nessuna richiesta a se stessi
    // 2. L'utente destinatario deve esistere
    // 3. Nessuna relazione già esistente, in nessuna delle due direzioni
    // 4. Creare la richiesta e notificare il destinatario se online
    if body.user_id == current_user.user_id {
        return Err(AppError::bad_request("You cannot send a friend request to yourself"));
    }

    if state.user.read(&body.user_id).await?.is_none() {
        warn!("Target user not found");
        return Err(AppError::not_found("User not found"));
    }

    if let Some(existing) = state
        .friendship
        .find_between(current_user.user_id, body.user_id)
        .await?
    {
        warn!("Friendship already exists with status {:?}", existing.status);
        return Err(AppError::conflict("A friendship or request already exists"));
    }

    // una richiesta incrociata concorrente viene fermata dall'indice sulla coppia
    let friendship = match state
        .friendship
        .create_request(current_user.user_id, body.user_id)
        .await
    {
        Ok(friendship) => friendship,
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            warn!("Concurrent friend request for the same pair");
            return Err(AppError::conflict("A friendship or request already exists"));
        }
        Err(e) => return Err(e.into()),
    };

    notify_user(
        &state,
        body.user_id,
        ServerEvent::FriendRequest(FriendDTO {
            friendship_id: friendship.friendship_id,
            user_id: current_user.user_id,
            username: current_user.username.clone(),
            status: friendship.status,
            created_at: friendship.created_at,
        }),
    );

    info!("Friend request {} created", friendship.friendship_id);
    Ok((StatusCode::CREATED, Json(FriendshipDTO::from(friendship))))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_friends(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<FriendDTO>>, AppError> {
    Ok(Json(state.friendship.find_friends(current_user.user_id).await?))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_incoming_requests(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<FriendDTO>>, AppError> {
    Ok(Json(state.friendship.find_incoming(current_user.user_id).await?))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_outgoing_requests(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<FriendDTO>>, AppError> {
    Ok(Json(state.friendship.find_outgoing(current_user.user_id).await?))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, friendship_id = %friendship_id, action = ?body.action))]
pub async fn respond_to_friend_request(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(friendship_id): Path<i32>,
    Json(body): Json<RespondFriendRequestDTO>,
) -> Result<Response, AppError> {
    debug!("Responding to friend request");
    // 1. La richiesta deve esistere ed essere indirizzata all'utente corrente
    // 2. Deve essere ancora pendente
    // 3. Accept: stato accepted e notifica al richiedente; Reject: la riga viene rimossa
    let friendship = state
        .friendship
        .read(&friendship_id)
        .await?
        .ok_or_else(|| AppError::not_found("Friend request not found"))?;

    if friendship.addressee_id != current_user.user_id {
        warn!("User is not the addressee of this request");
        return Err(AppError::forbidden("Only the addressee can respond to this request"));
    }
    if friendship.status != FriendshipStatus::Pending {
        return Err(AppError::conflict("Friend request already accepted"));
    }

    match body.action {
        FriendAction::Accept => {
            if !state.friendship.accept(friendship_id).await? {
                return Err(AppError::conflict("Friend request already accepted"));
            }
            notify_user(
                &state,
                friendship.requester_id,
                ServerEvent::FriendAccepted(FriendDTO {
                    friendship_id,
                    user_id: current_user.user_id,
                    username: current_user.username.clone(),
                    status: FriendshipStatus::Accepted,
                    created_at: friendship.created_at,
                }),
            );
            info!("Friend request accepted");

            let mut dto = FriendshipDTO::from(friendship);
            dto.status = FriendshipStatus::Accepted;
            Ok((StatusCode::OK, Json(dto)).into_response())
        }
        FriendAction::Reject => {
            state.friendship.delete(&friendship_id).await?;
            info!("Friend request rejected");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, friend_id = %friend_id))]
pub async fn remove_friend(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(friend_id): Path<i32>, // id dell'altro utente
) -> Result<impl IntoResponse, AppError> {
    // Rimuove la relazione con l'altro utente; vale anche per annullare una richiesta pendente
    let friendship = state
        .friendship
        .find_between(current_user.user_id, friend_id)
        .await?
        .ok_or_else(|| AppError::not_found("Friendship not found"))?;

    state.friendship.delete(&friendship.friendship_id).await?;
    info!("Friendship {} removed", friendship.friendship_id);
    Ok(StatusCode::NO_CONTENT)
}
