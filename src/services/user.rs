//! User services - Gestione utenti e profili

use crate::core::{AppError, AppState};
use crate::dtos::{AchievementDTO, MeDTO, UpdateUserDTO, UserDTO, UserSearchQuery};
use crate::entities::User;
use crate::repositories::{Delete, Read, Update};
use crate::ws::usermap::InternalSignal;
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

#[instrument(skip(state), fields(search = %params.search))]
pub async fn search_user_with_username(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Query(params): Query<UserSearchQuery>, // query params /users/search?search=username
) -> Result<Json<Vec<UserDTO>>, AppError> {
    debug!("Searching users with partial username");
    let search = params.search.trim();
    if search.is_empty() {
        return Err(AppError::bad_request("Search query cannot be empty"));
    }

    let users = state
        .user
        .search_by_username_partial(search, current_user.user_id)
        .await?;
    info!("Found {} users matching search criteria", users.len());
    Ok(Json(users.into_iter().map(UserDTO::from).collect()))
}

#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>, // parametro dalla URL /users/{user_id}
) -> Result<Json<UserDTO>, AppError> {
    debug!("Fetching user by ID");
    let user = state.user.read(&user_id).await?.ok_or_else(|| {
        warn!("User not found");
        AppError::not_found("User not found")
    })?;
    Ok(Json(UserDTO::from(user)))
}

#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn list_user_achievements(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<Vec<AchievementDTO>>, AppError> {
    if state.user.read(&user_id).await?.is_none() {
        return Err(AppError::not_found("User not found"));
    }
    let achievements = state.achievement.find_many_by_user(user_id).await?;
    Ok(Json(achievements.into_iter().map(AchievementDTO::from).collect()))
}

#[instrument(skip(current_user), fields(user_id = %current_user.user_id))]
pub async fn get_me(Extension(current_user): Extension<User>) -> Json<MeDTO> {
    Json(MeDTO::from(current_user))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione tramite token jwt
    Json(body): Json<UpdateUserDTO>,
) -> Result<Json<MeDTO>, AppError> {
    debug!("Updating profile");
    // 1. Validare i campi presenti
    // 2. Se viene cambiata la password, salvarne solo l'hash
    // 3. Aggiornare e ritornare il profilo
    body.validate()?;

    let mut update = body;
    if let Some(password) = update.password.take() {
        let hash = User::hash_password(&password).map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            AppError::internal_server_error("Failed to hash password")
        })?;
        update.password = Some(hash);
    }

    let user = state.user.update(&current_user.user_id, &update).await?;
    info!("Profile updated");
    Ok(Json(MeDTO::from(user)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, username = %current_user.username))]
pub async fn delete_my_account(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione tramite token jwt
) -> Result<impl IntoResponse, AppError> {
    info!("User account deletion initiated");
    // 1. Cancellare l'utente: quiz, submission, stanze ospitate, amicizie e messaggi seguono per cascata
    // 2. Chiudere l'eventuale connessione WebSocket dell'utente
    state.user.delete(&current_user.user_id).await?;
    state
        .users_online
        .send_if_online(current_user.user_id, InternalSignal::Shutdown);

    info!("User account deleted");
    Ok(StatusCode::NO_CONTENT)
}
