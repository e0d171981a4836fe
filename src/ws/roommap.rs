use crate::dtos::ServerEvent;
use crate::ws::BROADCAST_CHANNEL_CAPACITY;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast::{self, Receiver, Sender};
use tracing::{debug, info, instrument};

/// Canali broadcast delle stanze: un Sender per stanza, un Receiver per
/// ogni connessione iscritta
pub struct RoomMap {
    channels: DashMap<i32, Sender<Arc<ServerEvent>>>,
}

impl Default for RoomMap {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomMap {
    pub fn new() -> Self {
        RoomMap {
            channels: DashMap::new(),
        }
    }

    /// Iscrizione al canale della stanza, creato se non esiste
    #[instrument(skip(self))]
    pub fn subscribe(&self, room_id: i32) -> Receiver<Arc<ServerEvent>> {
        // entry() tiene il lock sulla shard: due subscribe concorrenti
        // non creano due canali diversi
        self.channels
            .entry(room_id)
            .or_insert_with(|| {
                info!("Creating broadcast channel for room {}", room_id);
                broadcast::channel::<Arc<ServerEvent>>(BROADCAST_CHANNEL_CAPACITY).0
            })
            .subscribe()
    }

    #[instrument(skip(self, room_ids))]
    pub fn subscribe_multiple(&self, room_ids: Vec<i32>) -> Vec<(i32, Receiver<Arc<ServerEvent>>)> {
        info!(count = room_ids.len(), "Subscribing to multiple rooms");
        room_ids
            .into_iter()
            .map(|id| (id, self.subscribe(id)))
            .collect()
    }

    /// Invia l'evento a tutti gli iscritti della stanza. Ritorna il numero di
    /// ricevitori; se nessuno ascolta il canale viene rimosso.
    #[instrument(skip(self, event))]
    pub fn send(&self, room_id: i32, event: Arc<ServerEvent>) -> usize {
        let Some(channel) = self.channels.get(&room_id) else {
            debug!("No live channel for room {}", room_id);
            return 0;
        };
        match channel.send(event) {
            Ok(receivers) => {
                debug!(receivers, "Event broadcast to room");
                receivers
            }
            Err(_) => {
                drop(channel);
                // ricontrolla sotto lock: qualcuno potrebbe essersi iscritto nel frattempo
                self.channels
                    .remove_if(&room_id, |_, tx| tx.receiver_count() == 0);
                debug!("No receivers left, channel removed");
                0
            }
        }
    }

    /// Chiude il canale della stanza: i ricevitori vedono `Closed` dopo
    /// aver consumato gli eventi già in coda
    #[instrument(skip(self))]
    pub fn close(&self, room_id: i32) {
        if self.channels.remove(&room_id).is_some() {
            info!("Room channel {} closed", room_id);
        }
    }

    pub fn live_count(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_share_one_channel() {
        let map = RoomMap::new();
        let mut rx1 = map.subscribe(1);
        let mut rx2 = map.subscribe(1);

        let sent = map.send(1, Arc::new(ServerEvent::RoomClosed { room_id: 1 }));
        assert_eq!(sent, 2);
        assert_eq!(rx1.recv().await.unwrap().room_id(), Some(1));
        assert_eq!(rx2.recv().await.unwrap().room_id(), Some(1));
        assert_eq!(map.live_count(), 1);
    }

    #[tokio::test]
    async fn test_channel_dropped_without_receivers() {
        let map = RoomMap::new();
        drop(map.subscribe(3));

        assert_eq!(map.send(3, Arc::new(ServerEvent::RoomClosed { room_id: 3 })), 0);
        assert_eq!(map.live_count(), 0);
        assert_eq!(map.send(4, Arc::new(ServerEvent::RoomClosed { room_id: 4 })), 0);
    }

    #[tokio::test]
    async fn test_close_ends_subscriptions() {
        let map = RoomMap::new();
        let mut rx = map.subscribe(5);
        map.send(5, Arc::new(ServerEvent::RoomClosed { room_id: 5 }));
        map.close(5);

        assert!(rx.recv().await.is_ok());
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }
}
