//! Room services - Endpoint HTTP per le stanze multiplayer
//!
//! La logica di gioco vive in `crate::gameplay` ed è condivisa con il canale
//! WebSocket: qui si estraggono solo i parametri della richiesta.

use crate::core::{AppError, AppState};
use crate::dtos::{
    AdvanceDTO, AnswerOutcomeDTO, CreateRoomDTO, CurrentQuestionDTO, JoinRoomDTO,
    LeaderboardEntryDTO, RoomAnswerDTO, RoomDTO, RoomDetailsDTO,
};
use crate::entities::User;
use crate::gameplay;
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

#[instrument(skip(state, _current_user))]
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    Extension(_current_user): Extension<User>,
) -> Result<Json<Vec<RoomDTO>>, AppError> {
    Ok(Json(gameplay::list_waiting_rooms(&state).await?))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateRoomDTO>,
) -> Result<impl IntoResponse, AppError> {
    let details = gameplay::create_room(&state, current_user.user_id, body).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

#[instrument(skip(state, _current_user), fields(room_id = %room_id))]
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Extension(_current_user): Extension<User>,
    Path(room_id): Path<i32>,
) -> Result<Json<RoomDetailsDTO>, AppError> {
    Ok(Json(gameplay::room_details(&state, room_id).await?))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn join_room_by_code(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<JoinRoomDTO>,
) -> Result<Json<RoomDetailsDTO>, AppError> {
    let details = gameplay::join_room_by_code(&state, current_user.user_id, &body.code).await?;
    Ok(Json(details))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, room_id = %room_id))]
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(room_id): Path<i32>,
) -> Result<Json<RoomDetailsDTO>, AppError> {
    Ok(Json(gameplay::join_room(&state, current_user.user_id, room_id).await?))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, room_id = %room_id))]
pub async fn leave_room(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(room_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    gameplay::leave_room(&state, current_user.user_id, room_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, room_id = %room_id))]
pub async fn start_game(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(room_id): Path<i32>,
) -> Result<Json<CurrentQuestionDTO>, AppError> {
    Ok(Json(gameplay::start_game(&state, current_user.user_id, room_id).await?))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, room_id = %room_id))]
pub async fn next_question(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(room_id): Path<i32>,
) -> Result<Json<AdvanceDTO>, AppError> {
    Ok(Json(gameplay::next_question(&state, current_user.user_id, room_id).await?))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, room_id = %room_id))]
pub async fn get_current_question(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(room_id): Path<i32>,
) -> Result<Json<CurrentQuestionDTO>, AppError> {
    Ok(Json(gameplay::current_question(&state, current_user.user_id, room_id).await?))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, room_id = %room_id))]
pub async fn submit_room_answer(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(room_id): Path<i32>,
    Json(body): Json<RoomAnswerDTO>,
) -> Result<Json<AnswerOutcomeDTO>, AppError> {
    let outcome = gameplay::submit_answer(&state, current_user.user_id, room_id, body).await?;
    Ok(Json(outcome))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, room_id = %room_id))]
pub async fn end_game(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(room_id): Path<i32>,
) -> Result<Json<Vec<LeaderboardEntryDTO>>, AppError> {
    Ok(Json(gameplay::end_game(&state, current_user.user_id, room_id).await?))
}

#[instrument(skip(state, _current_user), fields(room_id = %room_id))]
pub async fn get_room_leaderboard(
    State(state): State<Arc<AppState>>,
    Extension(_current_user): Extension<User>,
    Path(room_id): Path<i32>,
) -> Result<Json<Vec<LeaderboardEntryDTO>>, AppError> {
    Ok(Json(gameplay::leaderboard(&state, room_id).await?))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, room_id = %room_id))]
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(room_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    gameplay::delete_room(&state, current_user.user_id, room_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
