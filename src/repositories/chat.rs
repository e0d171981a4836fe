//! ChatRepository - Repository per la gestione delle chat

use super::Read;
use crate::entities::{Chat, ChatKind};
use chrono::Utc;
use sqlx::{Error, SqlitePool};
use tracing::{debug, info, instrument};

// CHAT REPOSITORY
pub struct ChatRepository {
    connection_pool: SqlitePool,
}

impl ChatRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Chat diretta tra due utenti (se esiste)
    /// GROUP BY + HAVING invece di due JOIN sui membri
    #[instrument(skip(self), fields(user1 = %user1_id, user2 = %user2_id))]
    pub async fn find_direct_between(&self, user1_id: i32, user2_id: i32) -> Result<Option<Chat>, Error> {
        debug!("Finding direct chat between two users");
        let chat = sqlx::query_as::<_, Chat>(
            r#"
            SELECT c.chat_id, c.kind, c.room_id, c.created_at
            FROM chats c
            INNER JOIN chat_members m ON c.chat_id = m.chat_id
            WHERE c.kind = ? AND m.user_id IN (?, ?)
            GROUP BY c.chat_id, c.kind, c.room_id, c.created_at
            HAVING COUNT(DISTINCT m.user_id) = 2
            "#,
        )
        .bind(ChatKind::Direct)
        .bind(user1_id)
        .bind(user2_id)
        .fetch_optional(&self.connection_pool)
        .await?;

        if chat.is_some() {
            debug!("Direct chat found");
        }
        Ok(chat)
    }

    /// Crea una chat diretta con i due membri
    #[instrument(skip(self))]
    pub async fn create_direct(&self, user1_id: i32, user2_id: i32) -> Result<Chat, Error> {
        let now = Utc::now();
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query("INSERT INTO chats (kind, room_id, created_at) VALUES (?, NULL, ?)")
            .bind(ChatKind::Direct)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        let chat_id = result.last_insert_rowid() as i32;

        for user_id in [user1_id, user2_id] {
            sqlx::query("INSERT INTO chat_members (chat_id, user_id, joined_at) VALUES (?, ?, ?)")
                .bind(chat_id)
                .bind(user_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!("Direct chat created with id {}", chat_id);

        Ok(Chat {
            chat_id,
            kind: ChatKind::Direct,
            room_id: None,
            created_at: now,
        })
    }

    #[instrument(skip(self))]
    pub async fn find_by_room(&self, room_id: i32) -> Result<Option<Chat>, Error> {
        sqlx::query_as::<_, Chat>("SELECT chat_id, kind, room_id, created_at FROM chats WHERE room_id = ?")
            .bind(room_id)
            .fetch_optional(&self.connection_pool)
            .await
    }

    /// Chat di cui l'utente è membro
    #[instrument(skip(self))]
    pub async fn find_many_by_user(&self, user_id: i32) -> Result<Vec<Chat>, Error> {
        sqlx::query_as::<_, Chat>(
            r#"
            SELECT c.chat_id, c.kind, c.room_id, c.created_at
            FROM chats c
            INNER JOIN chat_members m ON c.chat_id = m.chat_id
            WHERE m.user_id = ?
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    pub async fn is_member(&self, chat_id: &i32, user_id: &i32) -> Result<bool, Error> {
        let found: Option<i32> =
            sqlx::query_scalar("SELECT user_id FROM chat_members WHERE chat_id = ? AND user_id = ?")
                .bind(chat_id)
                .bind(user_id)
                .fetch_optional(&self.connection_pool)
                .await?;
        Ok(found.is_some())
    }

    #[instrument(skip(self))]
    pub async fn find_member_ids(&self, chat_id: i32) -> Result<Vec<i32>, Error> {
        sqlx::query_scalar("SELECT user_id FROM chat_members WHERE chat_id = ? ORDER BY user_id")
            .bind(chat_id)
            .fetch_all(&self.connection_pool)
            .await
    }
}

impl Read<Chat, i32> for ChatRepository {
    #[instrument(skip(self), fields(chat_id = %id))]
    async fn read(&self, id: &i32) -> Result<Option<Chat>, Error> {
        debug!("Reading chat by id");
        sqlx::query_as::<_, Chat>("SELECT chat_id, kind, room_id, created_at FROM chats WHERE chat_id = ?")
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}
