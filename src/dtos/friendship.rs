//! Friendship DTOs - Data Transfer Objects per amicizie

use crate::entities::{Friendship, FriendshipStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FriendRequestDTO {
    pub user_id: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FriendAction {
    Accept,
    Reject,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RespondFriendRequestDTO {
    pub action: FriendAction,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FriendshipDTO {
    pub friendship_id: i32,
    pub requester_id: i32,
    pub addressee_id: i32,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Friendship> for FriendshipDTO {
    fn from(value: Friendship) -> Self {
        Self {
            friendship_id: value.friendship_id,
            requester_id: value.requester_id,
            addressee_id: value.addressee_id,
            status: value.status,
            created_at: value.created_at,
        }
    }
}

/// Amicizia vista dal lato dell'utente corrente
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct FriendDTO {
    pub friendship_id: i32,
    pub user_id: i32,
    pub username: String,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
}
