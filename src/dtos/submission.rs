//! Submission DTOs - Data Transfer Objects per i tentativi sui quiz

use crate::dtos::AchievementDTO;
use crate::entities::{Submission, SubmissionAnswer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnswerDTO {
    pub question_id: i32,
    #[serde(default)]
    pub selected_option_ids: Vec<i32>,
}

/// DTO per inviare le risposte di un quiz
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SubmitQuizDTO {
    pub quiz_id: i32,
    pub answers: Vec<AnswerDTO>,
}

/// Submission già corretta, pronta per essere salvata
#[derive(Debug, Clone)]
pub struct NewSubmissionDTO {
    pub user_id: i32,
    pub quiz_id: i32,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub score: i32,
    pub percentage: f64,
    pub answers: Vec<AnswerResultDTO>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnswerResultDTO {
    pub question_id: i32,
    pub selected_option_ids: Vec<i32>,
    pub is_correct: bool,
}

impl From<SubmissionAnswer> for AnswerResultDTO {
    fn from(value: SubmissionAnswer) -> Self {
        Self {
            question_id: value.question_id,
            selected_option_ids: value.selected_option_ids.0,
            is_correct: value.is_correct,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SubmissionDTO {
    pub submission_id: i32,
    pub user_id: i32,
    pub quiz_id: i32,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub score: i32,
    pub percentage: f64,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub answers: Vec<AnswerResultDTO>,
    /// traguardi sbloccati da questa submission
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub new_achievements: Vec<AchievementDTO>,
}

impl From<Submission> for SubmissionDTO {
    fn from(value: Submission) -> Self {
        Self {
            submission_id: value.submission_id,
            user_id: value.user_id,
            quiz_id: value.quiz_id,
            correct_answers: value.correct_answers,
            total_questions: value.total_questions,
            score: value.score,
            percentage: value.percentage,
            submitted_at: value.submitted_at,
            answers: Vec::new(),
            new_achievements: Vec::new(),
        }
    }
}

impl SubmissionDTO {
    pub fn with_answers(mut self, answers: Vec<SubmissionAnswer>) -> Self {
        self.answers = answers.into_iter().map(AnswerResultDTO::from).collect();
        self
    }
}

/// Riga della classifica di un quiz: miglior tentativo per utente
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct QuizLeaderboardEntryDTO {
    pub user_id: i32,
    pub username: String,
    pub best_percentage: f64,
    pub best_score: i32,
    pub attempts: i64,
}
