//! Quiz services - Creazione, consultazione e gestione dei quiz

use crate::core::{AppError, AppState};
use crate::dtos::{
    CreateQuizDTO, QuizDTO, QuizLeaderboardEntryDTO, QuizListQuery, QuizSummaryDTO, SubmissionDTO,
    UpdateQuizDTO,
};
use crate::entities::{AchievementKind, Quiz, User};
use crate::repositories::{Delete, Read, Update};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_macros::debug_handler;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const QUIZ_LEADERBOARD_LIMIT: i64 = 20;

/// Carica un quiz che l'utente corrente può vedere. I quiz privati di altri
/// utenti risultano inesistenti.
async fn load_visible_quiz(state: &AppState, quiz_id: i32, user_id: i32) -> Result<Quiz, AppError> {
    let quiz = state.quiz.read(&quiz_id).await?.ok_or_else(|| {
        warn!("Quiz {} not found", quiz_id);
        AppError::not_found("Quiz not found")
    })?;
    if !quiz.is_visible_to(user_id) {
        warn!("Quiz {} is private", quiz_id);
        return Err(AppError::not_found("Quiz not found"));
    }
    Ok(quiz)
}

/// Carica un quiz verificando che l'utente corrente ne sia il creatore
async fn load_owned_quiz(state: &AppState, quiz_id: i32, user_id: i32) -> Result<Quiz, AppError> {
    let quiz = load_visible_quiz(state, quiz_id, user_id).await?;
    if quiz.creator_id != user_id {
        warn!("User {} is not the creator of quiz {}", user_id, quiz_id);
        return Err(AppError::forbidden("Only the quiz creator can do this"));
    }
    Ok(quiz)
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, title = %body.title))]
pub async fn create_quiz(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateQuizDTO>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Creating quiz");
    // 1. Validare metadati e domande (almeno una domanda, ogni domanda con una risposta corretta)
    // 2. Salvare quiz, domande e opzioni in un'unica transazione
    // 3. Assegnare il traguardo QuizCreator al primo quiz
    body.check()?;

    let created = state
        .quiz
        .create_with_questions(current_user.user_id, &body)
        .await?;
    state
        .achievement
        .award(current_user.user_id, AchievementKind::QuizCreator)
        .await?;

    info!("Quiz {} created with {} questions", created.quiz.quiz_id, created.questions.len());
    Ok((StatusCode::CREATED, Json(QuizDTO::from_quiz(created, true))))
}

#[instrument(skip(state, _current_user))]
pub async fn list_quizzes(
    State(state): State<Arc<AppState>>,
    Extension(_current_user): Extension<User>,
    Query(params): Query<QuizListQuery>, // query params /quizzes?category=..&search=..
) -> Result<Json<Vec<QuizSummaryDTO>>, AppError> {
    let category = params.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let search = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let quizzes = state.quiz.find_many_public(category, search).await?;
    debug!("Found {} public quizzes", quizzes.len());
    Ok(Json(quizzes))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_my_quizzes(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<QuizSummaryDTO>>, AppError> {
    let quizzes = state.quiz.find_many_by_creator(current_user.user_id).await?;
    Ok(Json(quizzes))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, quiz_id = %quiz_id))]
pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(quiz_id): Path<i32>,
) -> Result<Json<QuizDTO>, AppError> {
    debug!("Fetching quiz");
    // Le risposte corrette sono visibili solo al creatore
    let quiz = state
        .quiz
        .read_with_questions(quiz_id)
        .await?
        .filter(|q| q.quiz.is_visible_to(current_user.user_id))
        .ok_or_else(|| AppError::not_found("Quiz not found"))?;

    let reveal = quiz.quiz.creator_id == current_user.user_id;
    Ok(Json(QuizDTO::from_quiz(quiz, reveal)))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, quiz_id = %quiz_id))]
pub async fn update_quiz(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(quiz_id): Path<i32>,
    Json(body): Json<UpdateQuizDTO>,
) -> Result<Json<QuizDTO>, AppError> {
    debug!("Updating quiz");
    // 1. Validare il DTO
    // 2. Solo il creatore può modificare il quiz
    // 3. Le domande non si toccano mentre una stanza le sta usando
    // 4. Aggiornare metadati ed eventualmente sostituire le domande
    body.check()?;
    if !body.has_metadata() && body.questions.is_none() {
        return Err(AppError::bad_request("Nothing to update"));
    }
    load_owned_quiz(&state, quiz_id, current_user.user_id).await?;
    if body.questions.is_some() && state.quiz.has_active_rooms(quiz_id).await? {
        warn!("Question replacement refused: quiz {} has active rooms", quiz_id);
        return Err(AppError::conflict("Quiz is in use by an active room"));
    }

    state.quiz.update(&quiz_id, &body).await?;
    let updated = state
        .quiz
        .read_with_questions(quiz_id)
        .await?
        .ok_or_else(|| AppError::not_found("Quiz not found"))?;

    info!("Quiz updated");
    Ok(Json(QuizDTO::from_quiz(updated, true)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, quiz_id = %quiz_id))]
pub async fn delete_quiz(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(quiz_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    load_owned_quiz(&state, quiz_id, current_user.user_id).await?;
    // submission e stanze del quiz vengono cancellate per cascata
    state.quiz.delete(&quiz_id).await?;
    info!("Quiz deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, quiz_id = %quiz_id))]
pub async fn list_quiz_submissions(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(quiz_id): Path<i32>,
) -> Result<Json<Vec<SubmissionDTO>>, AppError> {
    load_owned_quiz(&state, quiz_id, current_user.user_id).await?;
    let submissions = state.submission.find_many_by_quiz(quiz_id).await?;
    Ok(Json(submissions.into_iter().map(SubmissionDTO::from).collect()))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, quiz_id = %quiz_id))]
pub async fn get_quiz_leaderboard(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(quiz_id): Path<i32>,
) -> Result<Json<Vec<QuizLeaderboardEntryDTO>>, AppError> {
    load_visible_quiz(&state, quiz_id, current_user.user_id).await?;
    let board = state
        .submission
        .quiz_leaderboard(quiz_id, QUIZ_LEADERBOARD_LIMIT)
        .await?;
    Ok(Json(board))
}
