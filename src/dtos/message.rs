//! Message DTOs - Data Transfer Objects per messaggi

use crate::entities::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessageDTO {
    pub message_id: i32,
    pub chat_id: i32,
    pub sender_id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageDTO {
    fn from(value: Message) -> Self {
        Self {
            message_id: value.message_id,
            chat_id: value.chat_id,
            sender_id: value.sender_id,
            content: value.content,
            created_at: value.created_at,
        }
    }
}

/// DTO per creare un nuovo messaggio, chat e mittente arrivano dal contesto
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateMessageDTO {
    #[validate(length(min = 1, max = 2000, message = "Message content must be between 1 and 2000 characters"))]
    pub content: String,
}

/// Dati per l'inserimento di un messaggio
#[derive(Debug, Clone)]
pub struct NewMessageDTO {
    pub chat_id: i32,
    pub sender_id: i32,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_length_bounds() {
        let empty = CreateMessageDTO { content: String::new() };
        assert!(empty.validate().is_err());
        let long = CreateMessageDTO { content: "x".repeat(2001) };
        assert!(long.validate().is_err());
        let ok = CreateMessageDTO { content: "gg".to_string() };
        assert!(ok.validate().is_ok());
    }
}
