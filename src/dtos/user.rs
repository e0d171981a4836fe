//! User DTOs - Data Transfer Objects per utenti

use crate::entities::{Achievement, AchievementKind, User};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
}

// struct per gestire io col client, la password non esce mai
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserDTO {
    pub id: i32,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        Self {
            id: value.user_id,
            username: value.username,
            display_name: value.display_name,
            bio: value.bio,
            avatar_url: value.avatar_url,
            created_at: value.created_at,
        }
    }
}

/// Profilo dell'utente autenticato (include l'email)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MeDTO {
    #[serde(flatten)]
    pub user: UserDTO,
    pub email: String,
}

impl From<User> for MeDTO {
    fn from(value: User) -> Self {
        let email = value.email.clone();
        Self {
            user: UserDTO::from(value),
            email,
        }
    }
}

/// DTO per creare un nuovo utente (senza user_id)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateUserDTO {
    #[validate(
        length(min = 3, max = 32, message = "Username must be between 3 and 32 characters"),
        regex(path = *USERNAME_REGEX, message = "Username may only contain letters, digits and underscores")
    )]
    pub username: String,

    #[validate(email(message = "Email is not valid"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,
}

/// DTO per il login (username o email + password)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginDTO {
    pub username: String,
    pub password: String,
}

/// Risposta del login
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenDTO {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserDTO,
}

/// DTO per aggiornare il profilo (solo i campi presenti vengono modificati)
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateUserDTO {
    #[validate(length(min = 1, max = 64, message = "Display name must be between 1 and 64 characters"))]
    pub display_name: Option<String>,

    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,

    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar_url: Option<String>,

    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: Option<String>,
}

impl UpdateUserDTO {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.bio.is_none()
            && self.avatar_url.is_none()
            && self.password.is_none()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AchievementDTO {
    pub kind: AchievementKind,
    pub earned_at: DateTime<Utc>,
}

impl From<Achievement> for AchievementDTO {
    fn from(value: Achievement) -> Self {
        Self {
            kind: value.kind,
            earned_at: value.earned_at,
        }
    }
}
