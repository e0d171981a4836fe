//! WebSocket Event DTOs - Data Transfer Objects per eventi WebSocket

use crate::dtos::{
    AnswerOutcomeDTO, CurrentQuestionDTO, FriendDTO, LeaderboardEntryDTO, MessageDTO,
    ParticipantDTO, RoomDetailsDTO,
};
use serde::{Deserialize, Serialize};

/// Eventi inviati dal client sul WebSocket
/// Serde li legge come:
/// { "event": "join-room", "data": { "room_id": 1 } }
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinRoom {
        room_id: i32,
    },
    LeaveRoom {
        room_id: i32,
    },
    StartGame {
        room_id: i32,
    },
    NextQuestion {
        room_id: i32,
    },
    SubmitAnswer {
        room_id: i32,
        question_id: i32,
        #[serde(default)]
        selected_option_ids: Vec<i32>,
    },
    EndGame {
        room_id: i32,
    },
    SendMessage {
        chat_id: i32,
        content: String,
    },
}

/// Eventi inviati dal server, stesso formato `{ "event", "data" }`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    RoomState(RoomDetailsDTO),
    ParticipantJoined {
        room_id: i32,
        participant: ParticipantDTO,
    },
    ParticipantLeft {
        room_id: i32,
        user_id: i32,
    },
    GameStarted {
        room_id: i32,
        total_questions: i32,
    },
    Question(CurrentQuestionDTO),
    AnswerResult(AnswerOutcomeDTO),
    LeaderboardUpdate {
        room_id: i32,
        leaderboard: Vec<LeaderboardEntryDTO>,
    },
    GameEnded {
        room_id: i32,
        leaderboard: Vec<LeaderboardEntryDTO>,
        champions: Vec<i32>,
    },
    RoomClosed {
        room_id: i32,
    },
    NewMessage(MessageDTO),
    FriendRequest(FriendDTO),
    FriendAccepted(FriendDTO),
    Error {
        code: u16,
        message: String,
    },
}

impl ServerEvent {
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            code,
            message: message.into(),
        }
    }

    /// Stanza a cui l'evento si riferisce, se è un evento di stanza
    pub fn room_id(&self) -> Option<i32> {
        match self {
            ServerEvent::RoomState(details) => Some(details.room.room_id),
            ServerEvent::ParticipantJoined { room_id, .. }
            | ServerEvent::ParticipantLeft { room_id, .. }
            | ServerEvent::GameStarted { room_id, .. }
            | ServerEvent::LeaderboardUpdate { room_id, .. }
            | ServerEvent::GameEnded { room_id, .. }
            | ServerEvent::RoomClosed { room_id } => Some(*room_id),
            ServerEvent::Question(question) => Some(question.room_id),
            ServerEvent::AnswerResult(outcome) => Some(outcome.room_id),
            _ => None,
        }
    }
}
