//! RoomRepository - Repository per le stanze multiplayer
//!
//! Le transizioni di stato sono compare-and-set: ogni UPDATE specifica lo
//! stato atteso, così due richieste concorrenti non possono avere entrambe
//! successo. I metodi ritornano `false` se la stanza non era nello stato atteso.

use super::{Create, Read};
use crate::dtos::NewRoomDTO;
use crate::entities::{Room, RoomStatus};
use chrono::Utc;
use sqlx::{Error, SqlitePool};
use tracing::{debug, info, instrument};

const ROOM_COLUMNS: &str = "room_id, code, quiz_id, host_id, status, max_participants, \
     time_limit_secs, current_question, question_started_at, created_at, started_at, ended_at";

pub struct RoomRepository {
    connection_pool: SqlitePool,
}

impl RoomRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    #[instrument(skip(self))]
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Room>, Error> {
        let query = format!("SELECT {} FROM rooms WHERE code = ?", ROOM_COLUMNS);
        sqlx::query_as::<_, Room>(&query)
            .bind(code)
            .fetch_optional(&self.connection_pool)
            .await
    }

    /// Stanze in attesa di giocatori, dalla più recente
    #[instrument(skip(self))]
    pub async fn find_many_waiting(&self) -> Result<Vec<Room>, Error> {
        let query = format!(
            "SELECT {} FROM rooms WHERE status = ? ORDER BY created_at DESC LIMIT 50",
            ROOM_COLUMNS
        );
        sqlx::query_as::<_, Room>(&query)
            .bind(RoomStatus::Waiting)
            .fetch_all(&self.connection_pool)
            .await
    }

    /// waiting -> in_progress, la domanda 0 diventa quella corrente
    #[instrument(skip(self))]
    pub async fn start(&self, room_id: i32) -> Result<bool, Error> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE rooms
            SET status = ?, current_question = 0, question_started_at = ?, started_at = ?
            WHERE room_id = ? AND status = ?
            "#,
        )
        .bind(RoomStatus::InProgress)
        .bind(now)
        .bind(now)
        .bind(room_id)
        .bind(RoomStatus::Waiting)
        .execute(&self.connection_pool)
        .await?;

        let started = result.rows_affected() == 1;
        if started {
            info!("Room {} started", room_id);
        }
        Ok(started)
    }

    /// Passa alla domanda successiva solo se quella corrente è ancora `from_index`
    #[instrument(skip(self))]
    pub async fn advance(&self, room_id: i32, from_index: i32) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE rooms
            SET current_question = current_question + 1, question_started_at = ?
            WHERE room_id = ? AND status = ? AND current_question = ?
            "#,
        )
        .bind(Utc::now())
        .bind(room_id)
        .bind(RoomStatus::InProgress)
        .bind(from_index)
        .execute(&self.connection_pool)
        .await?;

        let advanced = result.rows_affected() == 1;
        debug!("Advance from question {}: {}", from_index, advanced);
        Ok(advanced)
    }

    /// in_progress -> completed
    #[instrument(skip(self))]
    pub async fn complete(&self, room_id: i32) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE rooms SET status = ?, ended_at = ? WHERE room_id = ? AND status = ?",
        )
        .bind(RoomStatus::Completed)
        .bind(Utc::now())
        .bind(room_id)
        .bind(RoomStatus::InProgress)
        .execute(&self.connection_pool)
        .await?;

        let completed = result.rows_affected() == 1;
        if completed {
            info!("Room {} completed", room_id);
        }
        Ok(completed)
    }

    /// Elimina la stanza solo se è ancora in attesa
    #[instrument(skip(self))]
    pub async fn delete_if_waiting(&self, room_id: i32) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM rooms WHERE room_id = ? AND status = ?")
            .bind(room_id)
            .bind(RoomStatus::Waiting)
            .execute(&self.connection_pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// Crea stanza, partecipazione dell'host, chat di stanza e membership
/// dell'host in un'unica transazione
impl Create<Room, NewRoomDTO> for RoomRepository {
    #[instrument(skip(self, data), fields(code = %data.code, quiz_id = data.quiz_id))]
    async fn create(&self, data: &NewRoomDTO) -> Result<Room, Error> {
        debug!("Creating room");
        let now = Utc::now();
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO rooms (code, quiz_id, host_id, status, max_participants, time_limit_secs, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&data.code)
        .bind(data.quiz_id)
        .bind(data.host_id)
        .bind(RoomStatus::Waiting)
        .bind(data.max_participants)
        .bind(data.time_limit_secs)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let room_id = result.last_insert_rowid() as i32;

        sqlx::query(
            "INSERT INTO participants (room_id, user_id, score, correct_answers, joined_at) VALUES (?, ?, 0, 0, ?)",
        )
        .bind(room_id)
        .bind(data.host_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("INSERT INTO chats (kind, room_id, created_at) VALUES ('room', ?, ?)")
            .bind(room_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        let chat_id = result.last_insert_rowid() as i32;

        sqlx::query("INSERT INTO chat_members (chat_id, user_id, joined_at) VALUES (?, ?, ?)")
            .bind(chat_id)
            .bind(data.host_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!("Room {} created with chat {}", room_id, chat_id);

        Ok(Room {
            room_id,
            code: data.code.clone(),
            quiz_id: data.quiz_id,
            host_id: data.host_id,
            status: RoomStatus::Waiting,
            max_participants: data.max_participants,
            time_limit_secs: data.time_limit_secs,
            current_question: None,
            question_started_at: None,
            created_at: now,
            started_at: None,
            ended_at: None,
        })
    }
}

impl Read<Room, i32> for RoomRepository {
    #[instrument(skip(self))]
    async fn read(&self, id: &i32) -> Result<Option<Room>, Error> {
        let query = format!("SELECT {} FROM rooms WHERE room_id = ?", ROOM_COLUMNS);
        sqlx::query_as::<_, Room>(&query)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "quizzes", "rooms")))]
    async fn test_transitions_are_linear(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = RoomRepository::new(pool);

        // completed non torna indietro
        assert!(!repo.start(2).await?);
        assert_eq!(repo.read(&2).await?.unwrap().status, RoomStatus::Completed);

        // waiting non può saltare a completed
        assert!(!repo.complete(1).await?);

        assert!(repo.start(1).await?);
        assert!(!repo.start(1).await?);
        let room = repo.read(&1).await?.unwrap();
        assert_eq!(room.status, RoomStatus::InProgress);
        assert_eq!(room.current_question, Some(0));
        assert!(room.started_at.is_some());

        assert!(repo.complete(1).await?);
        assert!(!repo.complete(1).await?);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "quizzes", "rooms")))]
    async fn test_advance_is_compare_and_set(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = RoomRepository::new(pool);
        repo.start(1).await?;

        assert!(repo.advance(1, 0).await?);
        // una seconda richiesta con lo stesso indice non avanza di nuovo
        assert!(!repo.advance(1, 0).await?);
        assert_eq!(repo.read(&1).await?.unwrap().current_question, Some(1));
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "quizzes")))]
    async fn test_create_adds_host_and_chat(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = RoomRepository::new(pool.clone());
        let room = repo
            .create(&NewRoomDTO {
                code: "ZZZ999".to_string(),
                quiz_id: 1,
                host_id: 3,
                max_participants: 4,
                time_limit_secs: None,
            })
            .await?;

        let participants: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM participants WHERE room_id = ?")
            .bind(room.room_id)
            .fetch_one(&pool)
            .await?;
        let members: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM chat_members m INNER JOIN chats c ON c.chat_id = m.chat_id WHERE c.room_id = ?",
        )
        .bind(room.room_id)
        .fetch_one(&pool)
        .await?;
        assert_eq!(participants, 1);
        assert_eq!(members, 1);
        assert_eq!(repo.find_by_code("ZZZ999").await?.unwrap().room_id, room.room_id);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "quizzes", "rooms")))]
    async fn test_delete_only_while_waiting(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = RoomRepository::new(pool);
        assert!(!repo.delete_if_waiting(2).await?);
        assert!(repo.delete_if_waiting(1).await?);
        assert!(repo.read(&1).await?.is_none());
        assert_eq!(repo.find_many_waiting().await?.len(), 0);
        Ok(())
    }
}
