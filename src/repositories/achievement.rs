//! AchievementRepository - Repository per i traguardi degli utenti

use crate::entities::{Achievement, AchievementKind};
use chrono::Utc;
use sqlx::{Error, SqlitePool};
use tracing::{debug, info, instrument};

pub struct AchievementRepository {
    connection_pool: SqlitePool,
}

impl AchievementRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Assegna un traguardo. Ritorna `Some` solo se il traguardo è nuovo:
    /// ogni traguardo viene assegnato al massimo una volta per utente
    #[instrument(skip(self))]
    pub async fn award(
        &self,
        user_id: i32,
        kind: AchievementKind,
    ) -> Result<Option<Achievement>, Error> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT OR IGNORE INTO achievements (user_id, kind, earned_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(kind)
        .bind(now)
        .execute(&self.connection_pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!("Achievement already earned");
            return Ok(None);
        }

        info!("Achievement {:?} awarded to user {}", kind, user_id);
        Ok(Some(Achievement {
            user_id,
            kind,
            earned_at: now,
        }))
    }

    #[instrument(skip(self))]
    pub async fn find_many_by_user(&self, user_id: i32) -> Result<Vec<Achievement>, Error> {
        sqlx::query_as::<_, Achievement>(
            "SELECT user_id, kind, earned_at FROM achievements WHERE user_id = ? ORDER BY earned_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users")))]
    async fn test_award_is_idempotent(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = AchievementRepository::new(pool);

        let first = repo.award(1, AchievementKind::PerfectScore).await?;
        let second = repo.award(1, AchievementKind::PerfectScore).await?;
        assert!(first.is_some());
        assert!(second.is_none());

        repo.award(1, AchievementKind::QuizCreator).await?;
        let kinds: Vec<_> = repo
            .find_many_by_user(1)
            .await?
            .into_iter()
            .map(|a| a.kind)
            .collect();
        assert_eq!(kinds.len(), 2);
        assert!(kinds.contains(&AchievementKind::QuizCreator));
        Ok(())
    }
}
