use crate::dtos::ServerEvent;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

/// Segnali interni verso il task di scrittura di una connessione
#[derive(Debug)]
pub enum InternalSignal {
    Shutdown,
    /// inizia ad ascoltare il canale broadcast della stanza
    SubscribeRoom(i32),
    UnsubscribeRoom(i32),
    /// evento diretto solo a questo utente
    Event(Arc<ServerEvent>),
}

pub struct UserMap {
    users_online: DashMap<i32, UnboundedSender<InternalSignal>>,
}

impl Default for UserMap {
    fn default() -> Self {
        Self::new()
    }
}

impl UserMap {
    pub fn new() -> Self {
        UserMap {
            users_online: DashMap::new(),
        }
    }

    /// Registra la connessione dell'utente. Una connessione precedente
    /// dello stesso utente viene chiusa.
    #[instrument(skip(self, tx))]
    pub fn register_online(&self, user_id: i32, tx: UnboundedSender<InternalSignal>) {
        info!("Registering user {} as online", user_id);
        if let Some(previous) = self.users_online.insert(user_id, tx) {
            debug!("Closing previous connection of user {}", user_id);
            let _ = previous.send(InternalSignal::Shutdown);
        }
        info!("Total online users: {}", self.users_online.len());
    }

    /// Rimuove l'utente solo se il canale registrato è ancora `tx`: una
    /// connessione vecchia che si chiude non deve cancellare quella nuova
    #[instrument(skip(self, tx))]
    pub fn remove_from_online(&self, user_id: i32, tx: &UnboundedSender<InternalSignal>) {
        let removed = self
            .users_online
            .remove_if(&user_id, |_, current| current.same_channel(tx))
            .is_some();
        if removed {
            info!("User {} removed from online", user_id);
        } else {
            debug!("User {} has a newer connection, keeping it", user_id);
        }
    }

    #[instrument(skip(self, signal))]
    pub fn send_if_online(&self, user_id: i32, signal: InternalSignal) -> bool {
        match self.users_online.get(&user_id) {
            Some(entry) => match entry.value().send(signal) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to signal user {}: {:?}", user_id, e.0);
                    false
                }
            },
            None => {
                debug!("User {} not online", user_id);
                false
            }
        }
    }

    /// Invia un evento a un utente, se connesso
    pub fn send_event_if_online(&self, user_id: i32, event: Arc<ServerEvent>) -> bool {
        self.send_if_online(user_id, InternalSignal::Event(event))
    }

    pub fn online_count(&self) -> usize {
        self.users_online.len()
    }

    pub fn is_user_online(&self, user_id: i32) -> bool {
        self.users_online.contains_key(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_stale_connection_does_not_remove_new_one() {
        let map = UserMap::new();
        let (old_tx, mut old_rx) = unbounded_channel();
        let (new_tx, _new_rx) = unbounded_channel();

        map.register_online(1, old_tx.clone());
        map.register_online(1, new_tx.clone());
        // la vecchia connessione riceve lo shutdown
        assert!(matches!(old_rx.try_recv(), Ok(InternalSignal::Shutdown)));

        map.remove_from_online(1, &old_tx);
        assert!(map.is_user_online(1));

        map.remove_from_online(1, &new_tx);
        assert!(!map.is_user_online(1));
        assert_eq!(map.online_count(), 0);
    }

    #[test]
    fn test_send_event_only_to_online_users() {
        let map = UserMap::new();
        let (tx, mut rx) = unbounded_channel();
        map.register_online(7, tx);

        let event = Arc::new(ServerEvent::error(400, "nope"));
        assert!(map.send_event_if_online(7, event.clone()));
        assert!(!map.send_event_if_online(8, event));
        assert!(matches!(rx.try_recv(), Ok(InternalSignal::Event(_))));
    }
}
