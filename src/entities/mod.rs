//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene tutte le entità (models) che rappresentano i dati persistiti nel database.
//! Ogni entity corrisponde a una tabella nel database.

pub mod achievement;
pub mod chat;
pub mod enums;
pub mod friendship;
pub mod message;
pub mod quiz;
pub mod room;
pub mod submission;
pub mod user;

// Re-exports per facilitare l'import
pub use achievement::Achievement;
pub use chat::{Chat, ChatMember};
pub use enums::{AchievementKind, ChatKind, FriendshipStatus, RoomStatus};
pub use friendship::Friendship;
pub use message::Message;
pub use quiz::{AnswerOption, Question, QuestionWithOptions, Quiz, QuizWithQuestions};
pub use room::{Participant, ParticipantWithUser, Room, RoomAnswer};
pub use submission::{Submission, SubmissionAnswer};
pub use user::User;
