//! MessageRepository - Repository per la gestione dei messaggi

use super::{Create, Read};
use crate::dtos::NewMessageDTO;
use crate::entities::Message;
use chrono::{DateTime, Utc};
use sqlx::{Error, SqlitePool};
use tracing::{debug, instrument};

// MESSAGE REPO
pub struct MessageRepository {
    connection_pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Get paginated messages for a chat
    ///
    /// - `before_date` None: the most recent `limit` messages
    /// - `before_date` Some: `limit` messages strictly older than that date
    ///
    /// # Returns
    /// Messages ordered from newest to oldest (DESC)
    #[instrument(skip(self))]
    pub async fn find_many_paginated(
        &self,
        chat_id: i32,
        before_date: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Message>, Error> {
        let mut query_builder = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
            "SELECT message_id, chat_id, sender_id, content, created_at FROM messages WHERE chat_id = ",
        );
        query_builder.push_bind(chat_id);
        if let Some(before) = before_date {
            query_builder.push(" AND created_at < ");
            query_builder.push_bind(before);
        }
        query_builder.push(" ORDER BY created_at DESC, message_id DESC LIMIT ");
        query_builder.push_bind(limit);

        let messages = query_builder
            .build_query_as::<Message>()
            .fetch_all(&self.connection_pool)
            .await?;
        debug!("Loaded {} messages", messages.len());
        Ok(messages)
    }
}

impl Create<Message, NewMessageDTO> for MessageRepository {
    #[instrument(skip(self, data), fields(chat_id = data.chat_id, sender_id = data.sender_id))]
    async fn create(&self, data: &NewMessageDTO) -> Result<Message, Error> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO messages (chat_id, sender_id, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(data.chat_id)
        .bind(data.sender_id)
        .bind(&data.content)
        .bind(now)
        .execute(&self.connection_pool)
        .await?;

        Ok(Message {
            message_id: result.last_insert_rowid() as i32,
            chat_id: data.chat_id,
            sender_id: data.sender_id,
            content: data.content.clone(),
            created_at: now,
        })
    }
}

impl Read<Message, i32> for MessageRepository {
    #[instrument(skip(self))]
    async fn read(&self, id: &i32) -> Result<Option<Message>, Error> {
        sqlx::query_as::<_, Message>(
            "SELECT message_id, chat_id, sender_id, content, created_at FROM messages WHERE message_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}
