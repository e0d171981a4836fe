//! Quiz entities - Quiz, domande e opzioni di risposta

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Quiz {
    pub quiz_id: i32,
    pub creator_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub is_public: bool,
    /// secondi concessi per ogni domanda nelle stanze multiplayer
    pub time_limit_secs: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quiz {
    pub fn is_visible_to(&self, user_id: i32) -> bool {
        self.is_public || self.creator_id == user_id
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Question {
    pub question_id: i32,
    pub quiz_id: i32,
    pub text: String,
    pub position: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct AnswerOption {
    pub option_id: i32,
    pub question_id: i32,
    pub text: String,
    pub is_correct: bool,
}

/// Domanda con le sue opzioni, nell'ordine di inserimento
#[derive(Debug, Clone)]
pub struct QuestionWithOptions {
    pub question: Question,
    pub options: Vec<AnswerOption>,
}

impl QuestionWithOptions {
    pub fn correct_option_ids(&self) -> Vec<i32> {
        self.options
            .iter()
            .filter(|o| o.is_correct)
            .map(|o| o.option_id)
            .collect()
    }
}

/// Quiz completo: metadati + domande ordinate per `position`
#[derive(Debug, Clone)]
pub struct QuizWithQuestions {
    pub quiz: Quiz,
    pub questions: Vec<QuestionWithOptions>,
}
