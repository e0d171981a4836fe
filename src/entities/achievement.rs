//! Achievement entity - Traguardi sbloccati da un utente

use super::enums::AchievementKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Achievement {
    pub user_id: i32,
    pub kind: AchievementKind,
    pub earned_at: DateTime<Utc>,
}
