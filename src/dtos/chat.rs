//! Chat DTOs - Data Transfer Objects per chat

use crate::entities::{Chat, ChatKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatDTO {
    pub chat_id: i32,
    pub kind: ChatKind,
    pub room_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub member_ids: Vec<i32>,
}

impl From<Chat> for ChatDTO {
    fn from(value: Chat) -> Self {
        Self {
            chat_id: value.chat_id,
            kind: value.kind,
            room_id: value.room_id,
            created_at: value.created_at,
            member_ids: Vec::new(),
        }
    }
}

impl ChatDTO {
    pub fn with_members(mut self, member_ids: Vec<i32>) -> Self {
        self.member_ids = member_ids;
        self
    }
}
