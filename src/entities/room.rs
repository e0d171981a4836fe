//! Room entities - Stanze multiplayer, partecipanti e risposte

use super::enums::RoomStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Room {
    pub room_id: i32,
    /// codice breve da condividere per entrare nella stanza
    pub code: String,
    pub quiz_id: i32,
    pub host_id: i32,
    pub status: RoomStatus,
    pub max_participants: i32,
    pub time_limit_secs: Option<i32>,
    /// indice (0-based) della domanda corrente, tenuto dal server
    pub current_question: Option<i32>,
    pub question_started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Room {
    pub fn is_host(&self, user_id: i32) -> bool {
        self.host_id == user_id
    }

    /// true se la domanda corrente ha superato il tempo limite
    pub fn question_expired(&self, now: DateTime<Utc>) -> bool {
        match (self.time_limit_secs, self.question_started_at) {
            (Some(limit), Some(started)) => {
                now > started + chrono::Duration::seconds(i64::from(limit))
            }
            _ => false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Participant {
    pub room_id: i32,
    pub user_id: i32,
    pub score: i32,
    pub correct_answers: i32,
    pub joined_at: DateTime<Utc>,
}

/// Partecipante con lo username, per classifiche e liste
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct ParticipantWithUser {
    pub room_id: i32,
    pub user_id: i32,
    pub username: String,
    pub score: i32,
    pub correct_answers: i32,
    pub joined_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct RoomAnswer {
    pub room_id: i32,
    pub user_id: i32,
    pub question_id: i32,
    pub selected_option_ids: Json<Vec<i32>>,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}
