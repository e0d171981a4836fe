//! QuizRepository - Repository per quiz, domande e opzioni

use super::{Delete, Read, Update};
use crate::dtos::{CreateQuestionDTO, CreateQuizDTO, QuizSummaryDTO, UpdateQuizDTO};
use crate::entities::{AnswerOption, Question, QuestionWithOptions, Quiz, QuizWithQuestions, RoomStatus};
use chrono::Utc;
use sqlx::{Error, Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

const QUIZ_COLUMNS: &str = "quiz_id, creator_id, title, description, category, is_public, \
     time_limit_secs, created_at, updated_at";

const SUMMARY_SELECT: &str = "SELECT q.quiz_id, q.creator_id, q.title, q.description, q.category, \
     q.is_public, q.time_limit_secs, q.created_at, q.updated_at, \
     (SELECT COUNT(*) FROM questions qs WHERE qs.quiz_id = q.quiz_id) AS question_count \
     FROM quizzes q";

// QUIZ REPO
pub struct QuizRepository {
    connection_pool: SqlitePool,
}

impl QuizRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Inserisce quiz, domande e opzioni in un'unica transazione
    #[instrument(skip(self, data), fields(title = %data.title, questions = data.questions.len()))]
    pub async fn create_with_questions(
        &self,
        creator_id: i32,
        data: &CreateQuizDTO,
    ) -> Result<QuizWithQuestions, Error> {
        debug!("Creating quiz with questions");
        let now = Utc::now();
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO quizzes
                (creator_id, title, description, category, is_public, time_limit_secs, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(creator_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.category)
        .bind(data.is_public)
        .bind(data.time_limit_secs)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let quiz_id = result.last_insert_rowid() as i32;

        let questions = Self::insert_questions(&mut tx, quiz_id, &data.questions).await?;
        tx.commit().await?;

        info!("Quiz created with id {}", quiz_id);
        Ok(QuizWithQuestions {
            quiz: Quiz {
                quiz_id,
                creator_id,
                title: data.title.clone(),
                description: data.description.clone(),
                category: data.category.clone(),
                is_public: data.is_public,
                time_limit_secs: data.time_limit_secs,
                created_at: now,
                updated_at: now,
            },
            questions,
        })
    }

    async fn insert_questions(
        tx: &mut Transaction<'_, Sqlite>,
        quiz_id: i32,
        questions: &[CreateQuestionDTO],
    ) -> Result<Vec<QuestionWithOptions>, Error> {
        let mut inserted = Vec::with_capacity(questions.len());
        for (position, question) in questions.iter().enumerate() {
            let position = position as i32;
            let result =
                sqlx::query("INSERT INTO questions (quiz_id, text, position) VALUES (?, ?, ?)")
                    .bind(quiz_id)
                    .bind(&question.text)
                    .bind(position)
                    .execute(&mut **tx)
                    .await?;
            let question_id = result.last_insert_rowid() as i32;

            let mut options = Vec::with_capacity(question.options.len());
            for option in &question.options {
                let result = sqlx::query(
                    "INSERT INTO answer_options (question_id, text, is_correct) VALUES (?, ?, ?)",
                )
                .bind(question_id)
                .bind(&option.text)
                .bind(option.is_correct)
                .execute(&mut **tx)
                .await?;
                options.push(AnswerOption {
                    option_id: result.last_insert_rowid() as i32,
                    question_id,
                    text: option.text.clone(),
                    is_correct: option.is_correct,
                });
            }

            inserted.push(QuestionWithOptions {
                question: Question {
                    question_id,
                    quiz_id,
                    text: question.text.clone(),
                    position,
                },
                options,
            });
        }
        Ok(inserted)
    }

    /// Quiz completo con domande (ordinate per posizione) e opzioni
    #[instrument(skip(self))]
    pub async fn read_with_questions(
        &self,
        quiz_id: i32,
    ) -> Result<Option<QuizWithQuestions>, Error> {
        let Some(quiz) = self.read(&quiz_id).await? else {
            debug!("Quiz not found");
            return Ok(None);
        };

        let questions = sqlx::query_as::<_, Question>(
            "SELECT question_id, quiz_id, text, position FROM questions WHERE quiz_id = ? ORDER BY position ASC",
        )
        .bind(quiz_id)
        .fetch_all(&self.connection_pool)
        .await?;

        let options = sqlx::query_as::<_, AnswerOption>(
            r#"
            SELECT o.option_id, o.question_id, o.text, o.is_correct
            FROM answer_options o
            INNER JOIN questions q ON q.question_id = o.question_id
            WHERE q.quiz_id = ?
            ORDER BY o.option_id ASC
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.connection_pool)
        .await?;

        let mut by_question: HashMap<i32, Vec<AnswerOption>> = HashMap::new();
        for option in options {
            by_question.entry(option.question_id).or_default().push(option);
        }

        let questions = questions
            .into_iter()
            .map(|question| {
                let options = by_question.remove(&question.question_id).unwrap_or_default();
                QuestionWithOptions { question, options }
            })
            .collect();

        Ok(Some(QuizWithQuestions { quiz, questions }))
    }

    /// Quiz pubblici, filtrati opzionalmente per categoria e titolo
    #[instrument(skip(self))]
    pub async fn find_many_public(
        &self,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Result<Vec<QuizSummaryDTO>, Error> {
        let mut query_builder = sqlx::QueryBuilder::<Sqlite>::new(SUMMARY_SELECT);
        query_builder.push(" WHERE q.is_public = 1");
        if let Some(category) = category {
            query_builder.push(" AND q.category = ");
            query_builder.push_bind(category);
        }
        if let Some(search) = search {
            query_builder.push(" AND q.title LIKE ");
            query_builder.push_bind(format!("%{}%", search));
        }
        query_builder.push(" ORDER BY q.created_at DESC LIMIT 100");

        let quizzes = query_builder
            .build_query_as::<QuizSummaryDTO>()
            .fetch_all(&self.connection_pool)
            .await?;
        debug!("Found {} public quizzes", quizzes.len());
        Ok(quizzes)
    }

    #[instrument(skip(self))]
    pub async fn find_many_by_creator(&self, creator_id: i32) -> Result<Vec<QuizSummaryDTO>, Error> {
        let query = format!("{} WHERE q.creator_id = ? ORDER BY q.created_at DESC", SUMMARY_SELECT);
        sqlx::query_as::<_, QuizSummaryDTO>(&query)
            .bind(creator_id)
            .fetch_all(&self.connection_pool)
            .await
    }

    #[instrument(skip(self))]
    pub async fn count_questions(&self, quiz_id: i32) -> Result<i64, Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE quiz_id = ?")
            .bind(quiz_id)
            .fetch_one(&self.connection_pool)
            .await
    }

    /// true se una stanza non ancora conclusa usa il quiz
    #[instrument(skip(self))]
    pub async fn has_active_rooms(&self, quiz_id: i32) -> Result<bool, Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM rooms WHERE quiz_id = ? AND status <> ?)")
            .bind(quiz_id)
            .bind(RoomStatus::Completed)
            .fetch_one(&self.connection_pool)
            .await
    }
}

impl Read<Quiz, i32> for QuizRepository {
    #[instrument(skip(self))]
    async fn read(&self, id: &i32) -> Result<Option<Quiz>, Error> {
        let query = format!("SELECT {} FROM quizzes WHERE quiz_id = ?", QUIZ_COLUMNS);
        sqlx::query_as::<_, Quiz>(&query)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

/// Aggiorna i metadati presenti; se `questions` è presente le domande
/// vengono sostituite in blocco nella stessa transazione
impl Update<Quiz, UpdateQuizDTO, i32> for QuizRepository {
    #[instrument(skip(self, data))]
    async fn update(&self, id: &i32, data: &UpdateQuizDTO) -> Result<Quiz, Error> {
        debug!("Updating quiz");
        self.read(id).await?.ok_or(sqlx::Error::RowNotFound)?;

        let mut tx = self.connection_pool.begin().await?;

        let mut query_builder = sqlx::QueryBuilder::new("UPDATE quizzes SET updated_at = ");
        query_builder.push_bind(Utc::now());
        if let Some(ref title) = data.title {
            query_builder.push(", title = ");
            query_builder.push_bind(title);
        }
        if let Some(ref description) = data.description {
            query_builder.push(", description = ");
            query_builder.push_bind(description);
        }
        if let Some(ref category) = data.category {
            query_builder.push(", category = ");
            query_builder.push_bind(category);
        }
        if let Some(is_public) = data.is_public {
            query_builder.push(", is_public = ");
            query_builder.push_bind(is_public);
        }
        if let Some(time_limit_secs) = data.time_limit_secs {
            query_builder.push(", time_limit_secs = ");
            query_builder.push_bind(time_limit_secs);
        }
        query_builder.push(" WHERE quiz_id = ");
        query_builder.push_bind(id);
        query_builder.build().execute(&mut *tx).await?;

        if let Some(ref questions) = data.questions {
            // le opzioni e le risposte salvate seguono le domande per cascata
            sqlx::query("DELETE FROM questions WHERE quiz_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            Self::insert_questions(&mut tx, *id, questions).await?;
            info!("Replaced quiz questions ({} questions)", questions.len());
        }

        tx.commit().await?;
        info!("Quiz updated");

        self.read(id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

impl Delete<i32> for QuizRepository {
    #[instrument(skip(self))]
    async fn delete(&self, id: &i32) -> Result<(), Error> {
        sqlx::query("DELETE FROM quizzes WHERE quiz_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;

        info!("Quiz deleted");
        Ok(())
    }
}
