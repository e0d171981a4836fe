//! Chat entity - Entità chat (diretta o di stanza)

use super::enums::ChatKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Chat {
    pub chat_id: i32,
    pub kind: ChatKind,
    /// valorizzato solo per le chat di stanza
    pub room_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct ChatMember {
    pub chat_id: i32,
    pub user_id: i32,
    pub joined_at: DateTime<Utc>,
}
