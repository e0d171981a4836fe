//! FriendshipRepository - Repository per le amicizie

use super::{Delete, Read};
use crate::dtos::FriendDTO;
use crate::entities::{Friendship, FriendshipStatus};
use chrono::Utc;
use sqlx::{Error, SqlitePool};
use tracing::{debug, info, instrument};

const FRIENDSHIP_COLUMNS: &str = "friendship_id, requester_id, addressee_id, status, created_at";

pub struct FriendshipRepository {
    connection_pool: SqlitePool,
}

impl FriendshipRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Nuova richiesta di amicizia in stato `pending`
    #[instrument(skip(self))]
    pub async fn create_request(&self, requester_id: i32, addressee_id: i32) -> Result<Friendship, Error> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO friendships (requester_id, addressee_id, status, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(requester_id)
        .bind(addressee_id)
        .bind(FriendshipStatus::Pending)
        .bind(now)
        .execute(&self.connection_pool)
        .await?;

        let friendship_id = result.last_insert_rowid() as i32;
        info!("Friend request {} created", friendship_id);
        Ok(Friendship {
            friendship_id,
            requester_id,
            addressee_id,
            status: FriendshipStatus::Pending,
            created_at: now,
        })
    }

    /// Relazione tra due utenti, in qualunque direzione
    #[instrument(skip(self))]
    pub async fn find_between(&self, user_a: i32, user_b: i32) -> Result<Option<Friendship>, Error> {
        let query = format!(
            "SELECT {} FROM friendships WHERE (requester_id = ? AND addressee_id = ?) OR (requester_id = ? AND addressee_id = ?)",
            FRIENDSHIP_COLUMNS
        );
        sqlx::query_as::<_, Friendship>(&query)
            .bind(user_a)
            .bind(user_b)
            .bind(user_b)
            .bind(user_a)
            .fetch_optional(&self.connection_pool)
            .await
    }

    pub async fn are_friends(&self, user_a: i32, user_b: i32) -> Result<bool, Error> {
        Ok(self
            .find_between(user_a, user_b)
            .await?
            .is_some_and(|f| f.status == FriendshipStatus::Accepted))
    }

    /// pending -> accepted
    #[instrument(skip(self))]
    pub async fn accept(&self, friendship_id: i32) -> Result<bool, Error> {
        let result = sqlx::query("UPDATE friendships SET status = ? WHERE friendship_id = ? AND status = ?")
            .bind(FriendshipStatus::Accepted)
            .bind(friendship_id)
            .bind(FriendshipStatus::Pending)
            .execute(&self.connection_pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Amici accettati, visti dal lato di `user_id`
    #[instrument(skip(self))]
    pub async fn find_friends(&self, user_id: i32) -> Result<Vec<FriendDTO>, Error> {
        debug!("Listing friends");
        sqlx::query_as::<_, FriendDTO>(
            r#"
            SELECT f.friendship_id, u.user_id, u.username, f.status, f.created_at
            FROM friendships f
            INNER JOIN users u
                ON u.user_id = CASE WHEN f.requester_id = ? THEN f.addressee_id ELSE f.requester_id END
            WHERE (f.requester_id = ? OR f.addressee_id = ?) AND f.status = ?
            ORDER BY u.username ASC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .bind(FriendshipStatus::Accepted)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Richieste pendenti ricevute (l'altro utente è il richiedente)
    #[instrument(skip(self))]
    pub async fn find_incoming(&self, user_id: i32) -> Result<Vec<FriendDTO>, Error> {
        sqlx::query_as::<_, FriendDTO>(
            r#"
            SELECT f.friendship_id, u.user_id, u.username, f.status, f.created_at
            FROM friendships f
            INNER JOIN users u ON u.user_id = f.requester_id
            WHERE f.addressee_id = ? AND f.status = ?
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(FriendshipStatus::Pending)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Richieste pendenti inviate (l'altro utente è il destinatario)
    #[instrument(skip(self))]
    pub async fn find_outgoing(&self, user_id: i32) -> Result<Vec<FriendDTO>, Error> {
        sqlx::query_as::<_, FriendDTO>(
            r#"
            SELECT f.friendship_id, u.user_id, u.username, f.status, f.created_at
            FROM friendships f
            INNER JOIN users u ON u.user_id = f.addressee_id
            WHERE f.requester_id = ? AND f.status = ?
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(FriendshipStatus::Pending)
        .fetch_all(&self.connection_pool)
        .await
    }
}

impl Read<Friendship, i32> for FriendshipRepository {
    #[instrument(skip(self))]
    async fn read(&self, id: &i32) -> Result<Option<Friendship>, Error> {
        let query = format!("SELECT {} FROM friendships WHERE friendship_id = ?", FRIENDSHIP_COLUMNS);
        sqlx::query_as::<_, Friendship>(&query)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Delete<i32> for FriendshipRepository {
    #[instrument(skip(self))]
    async fn delete(&self, id: &i32) -> Result<(), Error> {
        sqlx::query("DELETE FROM friendships WHERE friendship_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;

        info!("Friendship removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "friendships")))]
    async fn test_find_between_either_direction(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = FriendshipRepository::new(pool);

        assert_eq!(repo.find_between(2, 1).await?.unwrap().friendship_id, 1);
        assert!(repo.are_friends(1, 2).await?);
        assert!(!repo.are_friends(1, 3).await?);
        assert!(repo.find_between(2, 3).await?.is_none());
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "friendships")))]
    async fn test_one_relationship_per_pair(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = FriendshipRepository::new(pool);

        repo.create_request(1, 4).await?;
        match repo.create_request(4, 1).await {
            Err(Error::Database(db_err)) => assert!(db_err.is_unique_violation()),
            other => panic!("Reverse request must be rejected, got {:?}", other),
        }
        // anche contro le relazioni già presenti
        assert!(repo.create_request(2, 1).await.is_err());
        assert_eq!(repo.find_between(1, 4).await?.unwrap().requester_id, 1);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "friendships")))]
    async fn test_lists_from_each_side(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = FriendshipRepository::new(pool);

        let friends = repo.find_friends(2).await?;
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].username, "alice");

        let incoming = repo.find_incoming(1).await?;
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].username, "charlie");

        let outgoing = repo.find_outgoing(3).await?;
        assert_eq!(outgoing[0].username, "alice");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "friendships")))]
    async fn test_accept_only_pending(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = FriendshipRepository::new(pool);

        assert!(repo.accept(2).await?);
        assert!(!repo.accept(2).await?);
        assert!(repo.are_friends(1, 3).await?);
        Ok(())
    }
}
