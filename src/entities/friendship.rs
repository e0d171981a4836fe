//! Friendship entity - Relazione di amicizia tra due utenti

use super::enums::FriendshipStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Friendship {
    pub friendship_id: i32,
    /// utente che ha inviato la richiesta
    pub requester_id: i32,
    /// utente che riceve la richiesta
    pub addressee_id: i32,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
}
