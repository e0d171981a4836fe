//! Enumerazioni - Tipi enumerati utilizzati nelle entità

use serde::{Deserialize, Serialize};

/// Ciclo di vita di una stanza multiplayer.
///
/// Le transizioni sono lineari: `Waiting -> InProgress -> Completed`.
/// Non esistono transizioni all'indietro né uno stato di annullamento.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    InProgress,
    Completed,
}

impl RoomStatus {
    pub fn can_transition_to(self, next: RoomStatus) -> bool {
        matches!(
            (self, next),
            (RoomStatus::Waiting, RoomStatus::InProgress)
                | (RoomStatus::InProgress, RoomStatus::Completed)
        )
    }

    pub fn is_live(self) -> bool {
        !matches!(self, RoomStatus::Completed)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    Direct,
    Room,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    /// Prima submission completata
    FirstQuizCompleted,
    /// Submission con il 100% di risposte corrette
    PerfectScore,
    /// Primo quiz creato
    QuizCreator,
    /// Primo posto in una stanza multiplayer conclusa
    RoomChampion,
}
