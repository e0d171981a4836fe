//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server.
//! I DTOs separano la rappresentazione esterna (API) dalla rappresentazione interna (entities).

pub mod chat;
pub mod friendship;
pub mod message;
pub mod query;
pub mod quiz;
pub mod room;
pub mod submission;
pub mod user;
pub mod ws_event;

pub use chat::ChatDTO;
pub use friendship::{FriendAction, FriendDTO, FriendRequestDTO, FriendshipDTO, RespondFriendRequestDTO};
pub use message::{CreateMessageDTO, MessageDTO, NewMessageDTO};
pub use query::{MessagesQuery, QuizListQuery, UserSearchQuery};
pub use quiz::{
    CreateOptionDTO, CreateQuestionDTO, CreateQuizDTO, OptionDTO, QuestionDTO, QuizDTO,
    QuizSummaryDTO, UpdateQuizDTO,
};
pub use room::{
    AdvanceDTO, AnswerOutcomeDTO, CreateRoomDTO, CurrentQuestionDTO, JoinRoomDTO, LeaderboardEntryDTO,
    NewRoomDTO, ParticipantDTO, RoomAnswerDTO, RoomDTO, RoomDetailsDTO,
};
pub use submission::{
    AnswerDTO, AnswerResultDTO, NewSubmissionDTO, QuizLeaderboardEntryDTO, SubmissionDTO,
    SubmitQuizDTO,
};
pub use user::{AchievementDTO, CreateUserDTO, LoginDTO, MeDTO, TokenDTO, UpdateUserDTO, UserDTO};
pub use ws_event::{ClientEvent, ServerEvent};
