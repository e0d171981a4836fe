//! Quiz DTOs - Data Transfer Objects per quiz, domande e opzioni

use crate::core::AppError;
use crate::entities::{AnswerOption, QuestionWithOptions, Quiz, QuizWithQuestions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const MAX_QUESTIONS_PER_QUIZ: usize = 100;
pub const MAX_OPTIONS_PER_QUESTION: usize = 10;

fn default_true() -> bool {
    true
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateOptionDTO {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateQuestionDTO {
    pub text: String,
    pub options: Vec<CreateOptionDTO>,
}

/// Controlla la struttura delle domande: testo non vuoto, almeno due opzioni,
/// almeno un'opzione corretta
pub fn check_questions(questions: &[CreateQuestionDTO]) -> Result<(), AppError> {
    if questions.is_empty() {
        return Err(AppError::bad_request("A quiz needs at least one question"));
    }
    if questions.len() > MAX_QUESTIONS_PER_QUIZ {
        return Err(AppError::bad_request("Too many questions")
            .with_details(format!("At most {} questions are allowed", MAX_QUESTIONS_PER_QUIZ)));
    }
    for (index, question) in questions.iter().enumerate() {
        if question.text.trim().is_empty() {
            return Err(AppError::bad_request("Question text cannot be empty")
                .with_details(format!("Question {}", index + 1)));
        }
        if question.options.len() < 2 || question.options.len() > MAX_OPTIONS_PER_QUESTION {
            return Err(AppError::bad_request("Each question needs between 2 and 10 options")
                .with_details(format!("Question {}", index + 1)));
        }
        if question.options.iter().any(|o| o.text.trim().is_empty()) {
            return Err(AppError::bad_request("Option text cannot be empty")
                .with_details(format!("Question {}", index + 1)));
        }
        if !question.options.iter().any(|o| o.is_correct) {
            return Err(AppError::bad_request("Each question needs at least one correct option")
                .with_details(format!("Question {}", index + 1)));
        }
    }
    Ok(())
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateQuizDTO {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 64, message = "Category must be between 1 and 64 characters"))]
    pub category: String,

    #[serde(default = "default_true")]
    pub is_public: bool,

    #[validate(range(min = 5, max = 600, message = "Time limit must be between 5 and 600 seconds"))]
    pub time_limit_secs: Option<i32>,

    pub questions: Vec<CreateQuestionDTO>,
}

impl CreateQuizDTO {
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        check_questions(&self.questions)
    }
}

/// DTO per aggiornare un quiz: i metadati presenti vengono modificati,
/// se `questions` è presente le domande vengono sostituite in blocco
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateQuizDTO {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 64, message = "Category must be between 1 and 64 characters"))]
    pub category: Option<String>,

    pub is_public: Option<bool>,

    #[validate(range(min = 5, max = 600, message = "Time limit must be between 5 and 600 seconds"))]
    pub time_limit_secs: Option<i32>,

    pub questions: Option<Vec<CreateQuestionDTO>>,
}

impl UpdateQuizDTO {
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        match &self.questions {
            Some(questions) => check_questions(questions),
            None => Ok(()),
        }
    }

    pub fn has_metadata(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.category.is_some()
            || self.is_public.is_some()
            || self.time_limit_secs.is_some()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OptionDTO {
    pub option_id: i32,
    pub text: String,
    /// presente solo per il creatore del quiz
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub is_correct: Option<bool>,
}

impl OptionDTO {
    fn from_option(option: AnswerOption, reveal: bool) -> Self {
        Self {
            option_id: option.option_id,
            text: option.text,
            is_correct: reveal.then_some(option.is_correct),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QuestionDTO {
    pub question_id: i32,
    pub text: String,
    pub position: i32,
    pub options: Vec<OptionDTO>,
}

impl QuestionDTO {
    pub fn from_question(value: QuestionWithOptions, reveal: bool) -> Self {
        Self {
            question_id: value.question.question_id,
            text: value.question.text,
            position: value.question.position,
            options: value
                .options
                .into_iter()
                .map(|o| OptionDTO::from_option(o, reveal))
                .collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct QuizSummaryDTO {
    pub quiz_id: i32,
    pub creator_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub is_public: bool,
    pub time_limit_secs: Option<i32>,
    pub question_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuizSummaryDTO {
    pub fn from_quiz(quiz: Quiz, question_count: i64) -> Self {
        Self {
            quiz_id: quiz.quiz_id,
            creator_id: quiz.creator_id,
            title: quiz.title,
            description: quiz.description,
            category: quiz.category,
            is_public: quiz.is_public,
            time_limit_secs: quiz.time_limit_secs,
            question_count,
            created_at: quiz.created_at,
            updated_at: quiz.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QuizDTO {
    #[serde(flatten)]
    pub summary: QuizSummaryDTO,
    pub questions: Vec<QuestionDTO>,
}

impl QuizDTO {
    /// `reveal_answers` va passato a true solo per il creatore del quiz
    pub fn from_quiz(value: QuizWithQuestions, reveal_answers: bool) -> Self {
        let question_count = value.questions.len() as i64;
        Self {
            summary: QuizSummaryDTO::from_quiz(value.quiz, question_count),
            questions: value
                .questions
                .into_iter()
                .map(|q| QuestionDTO::from_question(q, reveal_answers))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str, options: &[(&str, bool)]) -> CreateQuestionDTO {
        CreateQuestionDTO {
            text: text.to_string(),
            options: options
                .iter()
                .map(|(t, c)| CreateOptionDTO {
                    text: t.to_string(),
                    is_correct: *c,
                })
                .collect(),
        }
    }

    #[test]
    fn test_check_questions_accepts_valid_quiz() {
        let questions = vec![
            question("2 + 2?", &[("4", true), ("5", false)]),
            question("Primes?", &[("2", true), ("3", true), ("4", false)]),
        ];
        assert!(check_questions(&questions).is_ok());
    }

    #[test]
    fn test_check_questions_rejects_bad_structure() {
        assert!(check_questions(&[]).is_err());
        assert!(check_questions(&[question("One option", &[("a", true)])]).is_err());
        assert!(check_questions(&[question("No correct", &[("a", false), ("b", false)])]).is_err());
        assert!(check_questions(&[question("  ", &[("a", true), ("b", false)])]).is_err());
        assert!(check_questions(&[question("Empty option", &[("a", true), ("", false)])]).is_err());
    }

    #[test]
    fn test_create_quiz_check_runs_validator() {
        let dto = CreateQuizDTO {
            title: String::new(),
            description: None,
            category: "science".to_string(),
            is_public: true,
            time_limit_secs: None,
            questions: vec![question("Q", &[("a", true), ("b", false)])],
        };
        let err = dto.check().unwrap_err();
        assert_eq!(err.message(), "Validation error");
    }
}
