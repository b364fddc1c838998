//! Route table assembly.
//!
//! Public routes cover account entry points and the socket upgrade (which
//! does its own token check); everything else sits behind the bearer-token
//! middleware.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::handlers as auth;
use crate::languages::handlers as languages;
use crate::messaging::handlers as messages;
use crate::middleware::auth_middleware;
use crate::realtime::socket::ws_handler;
use crate::server::AppState;
use crate::translation::handlers as translations;
use crate::users::handlers as users;
use crate::voice::handlers as voice;

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/forgotpassword", post(auth::forgot_password))
        .route("/api/auth/resetpassword/{token}", put(auth::reset_password))
        .route("/api/languages", get(languages::list_languages))
        .route("/api/languages/{id}", get(languages::get_language))
        .route("/ws", get(ws_handler));

    let protected = Router::new()
        .route("/api/auth/logout", get(auth::logout))
        .route("/api/auth/me", get(auth::get_me))
        .route("/api/auth/updatedetails", put(auth::update_details))
        .route("/api/auth/updatepassword", put(auth::update_password))
        .route("/api/languages", post(languages::create_language))
        .route(
            "/api/languages/{id}",
            put(languages::update_language).delete(languages::delete_language),
        )
        .route("/api/users", get(users::list_users))
        .route("/api/users/recommendations", get(users::get_recommendations))
        .route("/api/users/languages", put(users::update_languages))
        .route("/api/users/profile-picture", put(users::update_profile_picture))
        .route("/api/users/connections", get(users::get_connections))
        .route(
            "/api/users/connections/{id}",
            post(users::add_connection).delete(users::remove_connection),
        )
        .route("/api/users/{id}", get(users::get_user))
        .route(
            "/api/messages/conversations",
            get(messages::get_conversations).post(messages::create_conversation),
        )
        .route(
            "/api/messages/{id}",
            get(messages::get_messages)
                .post(messages::send_message)
                .delete(messages::delete_message),
        )
        .route(
            "/api/voice-rooms",
            get(voice::list_rooms).post(voice::create_room),
        )
        .route(
            "/api/voice-rooms/{id}",
            get(voice::get_room)
                .put(voice::update_room)
                .delete(voice::delete_room),
        )
        .route("/api/voice-rooms/{id}/join", put(voice::join_room))
        .route("/api/voice-rooms/{id}/leave", put(voice::leave_room))
        .route("/api/voice-rooms/{id}/toggle-mute", put(voice::toggle_mute))
        .route(
            "/api/voice-rooms/{id}/toggle-deafen",
            put(voice::toggle_deafen),
        )
        .route("/api/translations/translate", post(translations::translate))
        .route(
            "/api/translations/correct/{messageId}",
            post(translations::correct_translation),
        )
        .route(
            "/api/translations/languages",
            get(translations::supported_languages),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    public
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
