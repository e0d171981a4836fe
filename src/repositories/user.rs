//! UserRepository - Repository per la gestione degli utenti

use super::{Create, Delete, Read, Update};
use crate::dtos::{CreateUserDTO, UpdateUserDTO};
use crate::entities::User;
use chrono::Utc;
use sqlx::{Error, SqlitePool};
use tracing::{debug, info, instrument};

const USER_COLUMNS: &str =
    "user_id, username, email, password, display_name, bio, avatar_url, created_at";

// USER REPO
pub struct UserRepository {
    connection_pool: SqlitePool,
}

impl UserRepository {
    pub fn new(connection_pool: SqlitePool) -> UserRepository {
        Self { connection_pool }
    }

    /// Cerca un utente per username o email (login)
    #[instrument(skip(self))]
    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>, Error> {
        debug!("Finding user by username or email");
        let query = format!(
            "SELECT {} FROM users WHERE username = ? OR email = ? LIMIT 1",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(login)
            .bind(login)
            .fetch_optional(&self.connection_pool)
            .await?;

        Ok(user)
    }

    /// Search users by username prefix, excluding the caller
    #[instrument(skip(self))]
    pub async fn search_by_username_partial(
        &self,
        username_pattern: &str,
        exclude_user_id: i32,
    ) -> Result<Vec<User>, Error> {
        debug!("Searching users by username prefix");
        let pattern = format!("{}%", username_pattern);
        let query = format!(
            "SELECT {} FROM users WHERE username LIKE ? AND user_id <> ? ORDER BY username LIMIT 10",
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(pattern)
            .bind(exclude_user_id)
            .fetch_all(&self.connection_pool)
            .await?;

        debug!("Found {} users", users.len());
        Ok(users)
    }
}

/// La password nel DTO deve essere già hashata dal servizio
impl Create<User, CreateUserDTO> for UserRepository {
    #[instrument(skip(self, data), fields(username = %data.username))]
    async fn create(&self, data: &CreateUserDTO) -> Result<User, Error> {
        debug!("Creating new user");
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (username, email, password, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password)
        .bind(now)
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_rowid() as i32;
        info!("User created with id {}", new_id);

        Ok(User {
            user_id: new_id,
            username: data.username.clone(),
            email: data.email.clone(),
            password: data.password.clone(),
            display_name: None,
            bio: None,
            avatar_url: None,
            created_at: now,
        })
    }
}

impl Read<User, i32> for UserRepository {
    #[instrument(skip(self))]
    async fn read(&self, id: &i32) -> Result<Option<User>, Error> {
        let query = format!("SELECT {} FROM users WHERE user_id = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await?;

        Ok(user)
    }
}

impl Update<User, UpdateUserDTO, i32> for UserRepository {
    #[instrument(skip(self, data))]
    async fn update(&self, id: &i32, data: &UpdateUserDTO) -> Result<User, Error> {
        debug!("Updating user profile");
        let current_user = self.read(id).await?.ok_or(sqlx::Error::RowNotFound)?;

        if data.is_empty() {
            debug!("No fields to update, returning current user");
            return Ok(current_user);
        }

        let mut query_builder = sqlx::QueryBuilder::new("UPDATE users SET ");
        let mut separated = query_builder.separated(", ");
        if let Some(ref display_name) = data.display_name {
            separated.push("display_name = ");
            separated.push_bind_unseparated(display_name);
        }
        if let Some(ref bio) = data.bio {
            separated.push("bio = ");
            separated.push_bind_unseparated(bio);
        }
        if let Some(ref avatar_url) = data.avatar_url {
            separated.push("avatar_url = ");
            separated.push_bind_unseparated(avatar_url);
        }
        if let Some(ref password) = data.password {
            separated.push("password = ");
            separated.push_bind_unseparated(password);
        }
        query_builder.push(" WHERE user_id = ");
        query_builder.push_bind(id);

        query_builder.build().execute(&self.connection_pool).await?;
        info!("User profile updated");

        self.read(id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

/// Cancellazione fisica: quiz, submission, stanze ospitate e messaggi
/// vengono rimossi a cascata
impl Delete<i32> for UserRepository {
    #[instrument(skip(self))]
    async fn delete(&self, user_id: &i32) -> Result<(), Error> {
        sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.connection_pool)
            .await?;

        info!("User deleted");
        Ok(())
    }
}
