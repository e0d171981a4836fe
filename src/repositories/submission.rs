//! SubmissionRepository - Repository per i tentativi sui quiz

use super::{Create, Read};
use crate::dtos::{NewSubmissionDTO, QuizLeaderboardEntryDTO};
use crate::entities::{Submission, SubmissionAnswer};
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{Error, SqlitePool};
use tracing::{debug, info, instrument};

const SUBMISSION_COLUMNS: &str = "submission_id, user_id, quiz_id, correct_answers, \
     total_questions, score, percentage, submitted_at";

pub struct SubmissionRepository {
    connection_pool: SqlitePool,
}

impl SubmissionRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    #[instrument(skip(self))]
    pub async fn find_answers(&self, submission_id: i32) -> Result<Vec<SubmissionAnswer>, Error> {
        sqlx::query_as::<_, SubmissionAnswer>(
            r#"
            SELECT sa.submission_id, sa.question_id, sa.selected_option_ids, sa.is_correct
            FROM submission_answers sa
            INNER JOIN questions q ON q.question_id = sa.question_id
            WHERE sa.submission_id = ?
            ORDER BY q.position ASC
            "#,
        )
        .bind(submission_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Submission dell'utente, dalla più recente
    #[instrument(skip(self))]
    pub async fn find_many_by_user(&self, user_id: i32) -> Result<Vec<Submission>, Error> {
        let query = format!(
            "SELECT {} FROM submissions WHERE user_id = ? ORDER BY submitted_at DESC, submission_id DESC",
            SUBMISSION_COLUMNS
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(user_id)
            .fetch_all(&self.connection_pool)
            .await
    }

    #[instrument(skip(self))]
    pub async fn find_many_by_quiz(&self, quiz_id: i32) -> Result<Vec<Submission>, Error> {
        let query = format!(
            "SELECT {} FROM submissions WHERE quiz_id = ? ORDER BY submitted_at DESC, submission_id DESC",
            SUBMISSION_COLUMNS
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(quiz_id)
            .fetch_all(&self.connection_pool)
            .await
    }

    /// Classifica del quiz: miglior percentuale per utente, a parità vince
    /// chi ci è arrivato prima
    #[instrument(skip(self))]
    pub async fn quiz_leaderboard(
        &self,
        quiz_id: i32,
        limit: i64,
    ) -> Result<Vec<QuizLeaderboardEntryDTO>, Error> {
        debug!("Computing quiz leaderboard");
        sqlx::query_as::<_, QuizLeaderboardEntryDTO>(
            r#"
            SELECT
                s.user_id,
                u.username,
                MAX(s.percentage) AS best_percentage,
                MAX(s.score) AS best_score,
                COUNT(*) AS attempts
            FROM submissions s
            INNER JOIN users u ON u.user_id = s.user_id
            WHERE s.quiz_id = ?
            GROUP BY s.user_id, u.username
            ORDER BY best_percentage DESC, best_score DESC, MIN(s.submitted_at) ASC
            LIMIT ?
            "#,
        )
        .bind(quiz_id)
        .bind(limit)
        .fetch_all(&self.connection_pool)
        .await
    }
}

/// Salva submission e risposte nella stessa transazione
impl Create<Submission, NewSubmissionDTO> for SubmissionRepository {
    #[instrument(skip(self, data), fields(user_id = data.user_id, quiz_id = data.quiz_id))]
    async fn create(&self, data: &NewSubmissionDTO) -> Result<Submission, Error> {
        debug!("Saving submission");
        let now = Utc::now();
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO submissions
                (user_id, quiz_id, correct_answers, total_questions, score, percentage, submitted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.user_id)
        .bind(data.quiz_id)
        .bind(data.correct_answers)
        .bind(data.total_questions)
        .bind(data.score)
        .bind(data.percentage)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let submission_id = result.last_insert_rowid() as i32;

        for answer in &data.answers {
            sqlx::query(
                r#"
                INSERT INTO submission_answers (submission_id, question_id, selected_option_ids, is_correct)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(submission_id)
            .bind(answer.question_id)
            .bind(Json(&answer.selected_option_ids))
            .bind(answer.is_correct)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Submission {} saved", submission_id);

        Ok(Submission {
            submission_id,
            user_id: data.user_id,
            quiz_id: data.quiz_id,
            correct_answers: data.correct_answers,
            total_questions: data.total_questions,
            score: data.score,
            percentage: data.percentage,
            submitted_at: now,
        })
    }
}

impl Read<Submission, i32> for SubmissionRepository {
    #[instrument(skip(self))]
    async fn read(&self, id: &i32) -> Result<Option<Submission>, Error> {
        let query = format!("SELECT {} FROM submissions WHERE submission_id = ?", SUBMISSION_COLUMNS);
        sqlx::query_as::<_, Submission>(&query)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}
