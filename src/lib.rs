//! QuizWhiz server library - espone i moduli principali per il binario e per i test

pub mod core;
pub mod dtos;
pub mod entities;
pub mod gameplay;
pub mod monitoring;
pub mod repositories;
pub mod scoring;
pub mod services;
pub mod ws;

// Re-export dei tipi principali per facilitare l'import
pub use core::{AppError, AppState, auth, config};
pub use services::root;

use axum::{
    Router,
    http::{Method, header},
    middleware,
    routing::{any, delete, get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Crea il router principale dell'applicazione
pub fn create_router(state: Arc<AppState>) -> Router {
    use core::authentication_middleware;
    use ws::ws_handler;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(root))
        .nest("/api/users", configure_user_routes(state.clone()))
        .nest("/api/quizzes", configure_quiz_routes(state.clone()))
        .nest("/api/submissions", configure_submission_routes(state.clone()))
        .nest("/api/rooms", configure_room_routes(state.clone()))
        .nest("/api/friends", configure_friend_routes(state.clone()))
        .nest("/api/chats", configure_chat_routes(state.clone()))
        .route(
            "/ws",
            any(ws_handler).layer(middleware::from_fn_with_state(
                state.clone(),
                authentication_middleware,
            )),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Configura le routes per registrazione, login e profili utente
fn configure_user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    // Rotte che NON richiedono autenticazione
    let public_routes = Router::new()
        .route("/register", post(register_user))
        .route("/login", post(login_user));

    let protected_routes = Router::new()
        .route("/search", get(search_user_with_username))
        .route("/me", get(get_me).patch(update_me).delete(delete_my_account))
        .route("/{user_id}", get(get_user_by_id))
        .route("/{user_id}/achievements", get(list_user_achievements))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    public_routes.merge(protected_routes)
}

/// Configura le routes per la gestione dei quiz
fn configure_quiz_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(list_quizzes).post(create_quiz))
        .route("/mine", get(list_my_quizzes))
        .route(
            "/{quiz_id}",
            get(get_quiz).patch(update_quiz).delete(delete_quiz),
        )
        .route("/{quiz_id}/submissions", get(list_quiz_submissions))
        .route("/{quiz_id}/leaderboard", get(get_quiz_leaderboard))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes per le submission
fn configure_submission_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", post(submit_quiz))
        .route("/mine", get(list_my_submissions))
        .route("/{submission_id}", get(get_submission))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes per le stanze multiplayer
fn configure_room_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(list_rooms).post(create_room))
        .route("/join", post(join_room_by_code))
        .route("/{room_id}", get(get_room).delete(delete_room))
        .route("/{room_id}/join", post(join_room))
        .route("/{room_id}/leave", post(leave_room))
        .route("/{room_id}/start", post(start_game))
        .route("/{room_id}/next", post(next_question))
        .route("/{room_id}/question", get(get_current_question))
        .route("/{room_id}/answer", post(submit_room_answer))
        .route("/{room_id}/end", post(end_game))
        .route("/{room_id}/leaderboard", get(get_room_leaderboard))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes per amicizie e richieste di amicizia
fn configure_friend_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(list_friends))
        .route("/requests", post(send_friend_request))
        .route("/requests/incoming", get(list_incoming_requests))
        .route("/requests/outgoing", get(list_outgoing_requests))
        .route("/requests/{friendship_id}", post(respond_to_friend_request))
        .route("/{user_id}", delete(remove_friend))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes per la gestione delle chat
fn configure_chat_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::{authentication_middleware, chat_membership_middleware};
    use services::*;

    // Rotte che NON richiedono membership (solo autenticazione)
    let public_routes = Router::new()
        .route("/", get(list_chats))
        .route("/direct/{user_id}", post(open_direct_chat))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ));

    // Rotte che richiedono membership (autenticazione + membership middleware)
    let member_routes = Router::new()
        .route(
            "/{chat_id}/messages",
            get(get_chat_messages).post(send_message),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            chat_membership_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    public_routes.merge(member_routes)
}
