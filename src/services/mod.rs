//! Services module - Coordinatore per tutti i service handler HTTP
//!
//! Questo modulo organizza i service handlers in sotto-moduli separati per una migliore manutenibilità.
//! Ogni modulo gestisce gli endpoint HTTP per una specifica funzionalità.

pub mod auth;
pub mod chat;
pub mod friendship;
pub mod quiz;
pub mod room;
pub mod submission;
pub mod user;

// Re-exports per facilitare l'import
pub use auth::{login_user, register_user};
pub use chat::{get_chat_messages, list_chats, open_direct_chat, send_message};
pub use friendship::{
    list_friends, list_incoming_requests, list_outgoing_requests, remove_friend,
    respond_to_friend_request, send_friend_request,
};
pub use quiz::{
    create_quiz, delete_quiz, get_quiz, get_quiz_leaderboard, list_my_quizzes,
    list_quiz_submissions, list_quizzes, update_quiz,
};
pub use room::{
    create_room, delete_room, end_game, get_current_question, get_room, get_room_leaderboard,
    join_room, join_room_by_code, leave_room, list_rooms, next_question, start_game,
    submit_room_answer,
};
pub use submission::{get_submission, list_my_submissions, submit_quiz};
pub use user::{
    delete_my_account, get_me, get_user_by_id, list_user_achievements, search_user_with_username,
    update_me,
};

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// Root endpoint - health check
pub async fn root(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, "QuizWhiz is running!")
}
