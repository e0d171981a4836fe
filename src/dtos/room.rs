//! Room DTOs - Data Transfer Objects per stanze multiplayer

use crate::dtos::QuestionDTO;
use crate::entities::{ParticipantWithUser, Room, RoomStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_MAX_PARTICIPANTS: i32 = 8;

/// DTO per creare una stanza a partire da un quiz
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateRoomDTO {
    pub quiz_id: i32,

    #[validate(range(min = 2, max = 50, message = "Max participants must be between 2 and 50"))]
    pub max_participants: Option<i32>,

    /// se assente si usa il tempo limite del quiz
    #[validate(range(min = 5, max = 600, message = "Time limit must be between 5 and 600 seconds"))]
    pub time_limit_secs: Option<i32>,
}

/// Dati per l'inserimento di una stanza, già risolti dal servizio
#[derive(Debug, Clone)]
pub struct NewRoomDTO {
    pub code: String,
    pub quiz_id: i32,
    pub host_id: i32,
    pub max_participants: i32,
    pub time_limit_secs: Option<i32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JoinRoomDTO {
    pub code: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RoomDTO {
    pub room_id: i32,
    pub code: String,
    pub quiz_id: i32,
    pub host_id: i32,
    pub status: RoomStatus,
    pub max_participants: i32,
    pub time_limit_secs: Option<i32>,
    pub current_question: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<Room> for RoomDTO {
    fn from(value: Room) -> Self {
        Self {
            room_id: value.room_id,
            code: value.code,
            quiz_id: value.quiz_id,
            host_id: value.host_id,
            status: value.status,
            max_participants: value.max_participants,
            time_limit_secs: value.time_limit_secs,
            current_question: value.current_question,
            created_at: value.created_at,
            started_at: value.started_at,
            ended_at: value.ended_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ParticipantDTO {
    pub user_id: i32,
    pub username: String,
    pub score: i32,
    pub correct_answers: i32,
    pub joined_at: DateTime<Utc>,
}

impl From<ParticipantWithUser> for ParticipantDTO {
    fn from(value: ParticipantWithUser) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username,
            score: value.score,
            correct_answers: value.correct_answers,
            joined_at: value.joined_at,
        }
    }
}

/// Stanza con partecipanti e chat associata
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RoomDetailsDTO {
    #[serde(flatten)]
    pub room: RoomDTO,
    pub chat_id: Option<i32>,
    pub total_questions: i32,
    pub participants: Vec<ParticipantDTO>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LeaderboardEntryDTO {
    pub rank: u32,
    pub user_id: i32,
    pub username: String,
    pub score: i32,
    pub correct_answers: i32,
}

/// Domanda corrente di una stanza, senza i flag di correttezza
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CurrentQuestionDTO {
    pub room_id: i32,
    pub index: i32,
    pub total_questions: i32,
    pub time_limit_secs: Option<i32>,
    pub started_at: Option<DateTime<Utc>>,
    pub question: QuestionDTO,
}

/// Risposta a una domanda della stanza
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RoomAnswerDTO {
    pub question_id: i32,
    #[serde(default)]
    pub selected_option_ids: Vec<i32>,
}

/// Esito di una risposta, rimandato a chi ha risposto
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnswerOutcomeDTO {
    pub room_id: i32,
    pub question_id: i32,
    pub is_correct: bool,
    pub points_awarded: i32,
    pub score: i32,
    pub correct_option_ids: Vec<i32>,
}

/// Esito di `next-question`: nuova domanda oppure partita conclusa
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceDTO {
    Question(CurrentQuestionDTO),
    Ended { leaderboard: Vec<LeaderboardEntryDTO> },
}
