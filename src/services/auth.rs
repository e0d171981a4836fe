//! Auth services - Gestione autenticazione e registrazione utenti

use crate::core::{AppError, AppState, encode_jwt};
use crate::dtos::{CreateUserDTO, LoginDTO, TokenDTO, UserDTO};
use crate::entities::User;
use crate::repositories::Create;
use axum::{
    extract::{Json, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginDTO>, // JSON body
) -> Result<impl IntoResponse, AppError> {
    debug!("Login attempt");
    // 1. Verificare che le credenziali non siano vuote (fail-fast prima della query DB)
    // 2. Cercare l'utente per username o email
    // 3. Verificare la password contro l'hash memorizzato
    // 4. Generare il token JWT con la durata configurata
    // 5. Costruire un cookie HttpOnly, Secure, SameSite=Lax con il token
    // 6. Ritornare il token nel body e negli header Set-Cookie e Authorization

    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::unauthorized("Invalid username or password"));
    }

    let user = state
        .user
        .find_by_login(body.username.trim())
        .await?
        .ok_or_else(|| {
            warn!("Login failed: unknown user");
            AppError::unauthorized("Invalid username or password")
        })?;

    if !user.verify_password(&body.password) {
        warn!("Login failed: wrong password");
        return Err(AppError::unauthorized("Invalid username or password"));
    }

    let token = encode_jwt(
        user.username.clone(),
        user.user_id,
        &state.jwt_secret,
        state.jwt_expiry_hours,
    )?;
    let expires_in = state.jwt_expiry_hours * 60 * 60;

    let cookie_value = format!(
        "token={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        token, expires_in
    );
    let header_error = |e| {
        error!("Invalid header value: {:?}", e);
        AppError::internal_server_error("Failed to build response headers")
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, HeaderValue::from_str(&cookie_value).map_err(header_error)?);
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).map_err(header_error)?,
    );

    info!("User {} logged in", user.user_id);
    let body = TokenDTO {
        token,
        token_type: "Bearer".to_string(),
        expires_in,
        user: UserDTO::from(user),
    };
    Ok((StatusCode::OK, headers, Json(body)))
}

#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserDTO>, // JSON body
) -> Result<impl IntoResponse, AppError> {
    debug!("Registering new user");
    // 1. Validare il DTO con validator (formato username, email, lunghezza password)
    // 2. Controllare che username ed email non siano già in uso
    // 3. Generare l'hash della password
    // 4. Salvare il nuovo utente e ritornarlo come UserDTO

    body.validate()?;

    if state.user.find_by_login(&body.username).await?.is_some()
        || state.user.find_by_login(&body.email).await?.is_some()
    {
        warn!("Registration rejected: username or email taken");
        return Err(AppError::conflict("Username or email already in use"));
    }

    let password_hash = User::hash_password(&body.password).map_err(|e| {
        error!("Failed to hash password: {:?}", e);
        AppError::internal_server_error("Failed to hash password")
    })?;

    let new_user = CreateUserDTO {
        username: body.username,
        email: body.email,
        password: password_hash,
    };
    let created_user = state.user.create(&new_user).await?;

    info!("User {} registered", created_user.user_id);
    Ok((StatusCode::CREATED, Json(UserDTO::from(created_user))))
}
