//! ParticipantRepository - Partecipanti delle stanze e loro risposte

use super::Read;
use crate::entities::{Participant, ParticipantWithUser, RoomStatus};
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{Error, SqlitePool};
use tracing::{debug, info, instrument};

/// Esito di un tentativo di ingresso in una stanza
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyJoined,
    /// stanza piena, non più in attesa o inesistente
    Rejected,
}

/// Esito della registrazione di una risposta
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    Recorded(Participant),
    AlreadyAnswered,
    /// la stanza è passata ad un'altra domanda o non è più in corso
    QuestionClosed,
}

pub struct ParticipantRepository {
    connection_pool: SqlitePool,
}

impl ParticipantRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Ingresso nella stanza. Il controllo di capienza e l'inserimento sono
    /// un'unica istruzione, quindi `max_participants` non può essere superato
    /// da richieste concorrenti. Aggiunge anche l'utente alla chat di stanza.
    #[instrument(skip(self))]
    pub async fn join_if_capacity(&self, room_id: i32, user_id: i32) -> Result<JoinOutcome, Error> {
        if self.read(&(room_id, user_id)).await?.is_some() {
            debug!("User already in room");
            return Ok(JoinOutcome::AlreadyJoined);
        }

        let now = Utc::now();
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO participants (room_id, user_id, score, correct_answers, joined_at)
            SELECT ?, ?, 0, 0, ?
            WHERE (SELECT COUNT(*) FROM participants WHERE room_id = ?)
                < (SELECT max_participants FROM rooms WHERE room_id = ? AND status = ?)
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .bind(now)
        .bind(room_id)
        .bind(room_id)
        .bind(RoomStatus::Waiting)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            debug!("Join rejected: room full or not waiting");
            return Ok(JoinOutcome::Rejected);
        }

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO chat_members (chat_id, user_id, joined_at)
            SELECT chat_id, ?, ? FROM chats WHERE room_id = ?
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(room_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("User {} joined room {}", user_id, room_id);
        Ok(JoinOutcome::Joined)
    }

    /// Rimuove il partecipante e la sua membership nella chat di stanza
    #[instrument(skip(self))]
    pub async fn leave(&self, room_id: i32, user_id: i32) -> Result<bool, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query("DELETE FROM participants WHERE room_id = ? AND user_id = ?")
            .bind(room_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "DELETE FROM chat_members WHERE user_id = ? AND chat_id IN (SELECT chat_id FROM chats WHERE room_id = ?)",
        )
        .bind(user_id)
        .bind(room_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() == 1)
    }

    /// Partecipanti in ordine di classifica: punteggio, risposte corrette,
    /// poi chi è entrato prima
    #[instrument(skip(self))]
    pub async fn find_many_with_users(&self, room_id: i32) -> Result<Vec<ParticipantWithUser>, Error> {
        sqlx::query_as::<_, ParticipantWithUser>(
            r#"
            SELECT p.room_id, p.user_id, u.username, p.score, p.correct_answers, p.joined_at
            FROM participants p
            INNER JOIN users u ON u.user_id = p.user_id
            WHERE p.room_id = ?
            ORDER BY p.score DESC, p.correct_answers DESC, p.joined_at ASC, p.user_id ASC
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    #[instrument(skip(self))]
    pub async fn read_with_user(
        &self,
        room_id: i32,
        user_id: i32,
    ) -> Result<Option<ParticipantWithUser>, Error> {
        sqlx::query_as::<_, ParticipantWithUser>(
            r#"
            SELECT p.room_id, p.user_id, u.username, p.score, p.correct_answers, p.joined_at
            FROM participants p
            INNER JOIN users u ON u.user_id = p.user_id
            WHERE p.room_id = ? AND p.user_id = ?
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(&self.connection_pool)
        .await
    }

    /// Registra la risposta solo se `question_index` è ancora la domanda
    /// corrente di una stanza in corso: controllo e inserimento sono una sola
    /// istruzione, come `RoomRepository::advance`. Il punteggio viene
    /// aggiornato nella stessa transazione.
    #[instrument(skip(self, selected_option_ids))]
    #[allow(clippy::too_many_arguments)]
    pub async fn record_answer(
        &self,
        room_id: i32,
        user_id: i32,
        question_index: i32,
        question_id: i32,
        selected_option_ids: &[i32],
        is_correct: bool,
        points: i32,
    ) -> Result<RecordOutcome, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO room_answers
                (room_id, user_id, question_id, selected_option_ids, is_correct, answered_at)
            SELECT ?, ?, ?, ?, ?, ?
            WHERE EXISTS (
                SELECT 1 FROM rooms
                WHERE room_id = ? AND status = ? AND current_question = ?
            )
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .bind(question_id)
        .bind(Json(selected_option_ids))
        .bind(is_correct)
        .bind(Utc::now())
        .bind(room_id)
        .bind(RoomStatus::InProgress)
        .bind(question_index)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let answered: Option<i32> = sqlx::query_scalar(
                "SELECT question_id FROM room_answers WHERE room_id = ? AND user_id = ? AND question_id = ?",
            )
            .bind(room_id)
            .bind(user_id)
            .bind(question_id)
            .fetch_optional(&mut *tx)
            .await?;

            return Ok(if answered.is_some() {
                debug!("Question already answered");
                RecordOutcome::AlreadyAnswered
            } else {
                debug!("Question {} is no longer current", question_index);
                RecordOutcome::QuestionClosed
            });
        }

        let participant = sqlx::query_as::<_, Participant>(
            r#"
            UPDATE participants
            SET score = score + ?, correct_answers = correct_answers + ?
            WHERE room_id = ? AND user_id = ?
            RETURNING room_id, user_id, score, correct_answers, joined_at
            "#,
        )
        .bind(points)
        .bind(i32::from(is_correct))
        .bind(room_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!("Answer recorded, score now {}", participant.score);
        Ok(RecordOutcome::Recorded(participant))
    }

    #[instrument(skip(self))]
    pub async fn count_answers(&self, room_id: i32, question_id: i32) -> Result<i64, Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM room_answers WHERE room_id = ? AND question_id = ?")
            .bind(room_id)
            .bind(question_id)
            .fetch_one(&self.connection_pool)
            .await
    }

    /// Stanze non concluse a cui l'utente partecipa
    #[instrument(skip(self))]
    pub async fn find_live_room_ids(&self, user_id: i32) -> Result<Vec<i32>, Error> {
        sqlx::query_scalar(
            r#"
            SELECT p.room_id
            FROM participants p
            INNER JOIN rooms r ON r.room_id = p.room_id
            WHERE p.user_id = ? AND r.status <> ?
            "#,
        )
        .bind(user_id)
        .bind(RoomStatus::Completed)
        .fetch_all(&self.connection_pool)
        .await
    }
}

impl Read<Participant, (i32, i32)> for ParticipantRepository {
    /// `id` è la coppia (room_id, user_id)
    #[instrument(skip(self))]
    async fn read(&self, id: &(i32, i32)) -> Result<Option<Participant>, Error> {
        sqlx::query_as::<_, Participant>(
            "SELECT room_id, user_id, score, correct_answers, joined_at FROM participants WHERE room_id = ? AND user_id = ?",
        )
        .bind(id.0)
        .bind(id.1)
        .fetch_optional(&self.connection_pool)
        .await
    }
}
