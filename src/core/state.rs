//! Application State - Stato globale dell'applicazione
//!
//! Contiene tutti i repository, configurazioni e stato condiviso
//! necessario per gestire l'applicazione.

use crate::core::Config;
use crate::repositories::{
    AchievementRepository, ChatRepository, FriendshipRepository, MessageRepository,
    ParticipantRepository, QuizRepository, RoomRepository, SubmissionRepository, UserRepository,
};
use crate::ws::roommap::RoomMap;
use crate::ws::usermap::UserMap;
use sqlx::SqlitePool;

const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;

/// Stato globale dell'applicazione condiviso tra tutte le route e middleware
pub struct AppState {
    /// Repository per la gestione degli utenti
    pub user: UserRepository,

    /// Repository per i traguardi degli utenti
    pub achievement: AchievementRepository,

    /// Repository per quiz, domande e opzioni
    pub quiz: QuizRepository,

    /// Repository per le submission dei quiz
    pub submission: SubmissionRepository,

    /// Repository per le stanze multiplayer
    pub room: RoomRepository,

    /// Repository per i partecipanti delle stanze e le loro risposte
    pub participant: ParticipantRepository,

    /// Repository per le amicizie
    pub friendship: FriendshipRepository,

    /// Repository per le chat (dirette e di stanza)
    pub chat: ChatRepository,

    /// Repository per la gestione dei messaggi
    pub msg: MessageRepository,

    /// Secret key per JWT token
    pub jwt_secret: String,

    /// Durata dei token JWT emessi al login
    pub jwt_expiry_hours: i64,

    /// Mappa concorrente degli utenti online con i loro canali WebSocket
    /// Key: user_id, Value: Sender per inviare segnali al WebSocket dell'utente
    pub users_online: UserMap,

    /// Canali broadcast delle stanze con almeno un client collegato
    pub rooms_online: RoomMap,
}

impl AppState {
    /// Crea una nuova istanza di AppState inizializzando tutti i repository
    /// con il pool di connessioni fornito e la JWT secret.
    ///
    /// # Arguments
    /// * `pool` - Pool di connessioni SQLite condiviso
    /// * `jwt_secret` - Chiave segreta per la firma dei token JWT
    pub fn new(pool: SqlitePool, jwt_secret: String) -> Self {
        Self {
            user: UserRepository::new(pool.clone()),
            achievement: AchievementRepository::new(pool.clone()),
            quiz: QuizRepository::new(pool.clone()),
            submission: SubmissionRepository::new(pool.clone()),
            room: RoomRepository::new(pool.clone()),
            participant: ParticipantRepository::new(pool.clone()),
            friendship: FriendshipRepository::new(pool.clone()),
            chat: ChatRepository::new(pool.clone()),
            msg: MessageRepository::new(pool),
            jwt_secret,
            jwt_expiry_hours: DEFAULT_JWT_EXPIRY_HOURS,
            users_online: UserMap::new(),
            rooms_online: RoomMap::new(),
        }
    }

    /// Come `new`, ma prende secret e durata dei token dalla configurazione
    pub fn from_config(pool: SqlitePool, config: &Config) -> Self {
        let mut state = Self::new(pool, config.jwt_secret.clone());
        state.jwt_expiry_hours = config.jwt_expiry_hours;
        state
    }
}
