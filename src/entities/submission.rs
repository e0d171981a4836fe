//! Submission entity - Tentativo di un utente su un quiz

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Submission {
    pub submission_id: i32,
    pub user_id: i32,
    pub quiz_id: i32,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub score: i32,
    pub percentage: f64,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct SubmissionAnswer {
    pub submission_id: i32,
    pub question_id: i32,
    pub selected_option_ids: Json<Vec<i32>>,
    pub is_correct: bool,
}
