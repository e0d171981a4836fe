//! Repositories module - Coordinatore per tutti i repository del progetto
//!
//! Questo modulo organizza i repository in sotto-moduli separati per una migliore manutenibilità.
//! Ogni repository gestisce le operazioni di database per una specifica entità.

// ************************* NOTA SU SQLX ************************* //

/*
   Le query usano le funzioni runtime di sqlx (`query`, `query_as::<_, T>`, `query_scalar`,
   `QueryBuilder`) al posto delle macro `query!`/`query_as!`: le macro vogliono un database
   raggiungibile in fase di compilazione, le funzioni runtime no.
   Le entity derivano `sqlx::FromRow`, quindi basta che le colonne della SELECT abbiano
   gli stessi nomi dei campi.

   Quale metodo chiamare:
   .execute(..)         INSERT/UPDATE/DELETE, poi rows_affected() / last_insert_rowid()
   .fetch_optional(..)  zero o una riga
   .fetch_one(..)       esattamente una riga (aggregate, RETURNING)
   .fetch_all(..)       tutte le righe

   Le operazioni su più tabelle (creazione quiz, submission, creazione stanza) girano in
   una transazione: `let mut tx = pool.begin().await?; ... .execute(&mut *tx) ...; tx.commit()`.
   Se la funzione esce prima del commit la transazione viene annullata al drop.
*/

// ************************* MODULI REPOSITORY ************************* //

pub mod achievement;
pub mod chat;
pub mod friendship;
pub mod message;
pub mod participant;
pub mod quiz;
pub mod room;
pub mod submission;
pub mod traits;
pub mod user;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{Create, Delete, Read, Update};

// Re-esportazione delle struct dei repository per facilitare l'import
pub use achievement::AchievementRepository;
pub use chat::ChatRepository;
pub use friendship::FriendshipRepository;
pub use message::MessageRepository;
pub use participant::{JoinOutcome, ParticipantRepository, RecordOutcome};
pub use quiz::QuizRepository;
pub use room::RoomRepository;
pub use submission::SubmissionRepository;
pub use user::UserRepository;
