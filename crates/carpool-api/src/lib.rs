pub mod auth;
pub mod chat;
pub mod error;
pub mod middleware;
pub mod notify;
pub mod rides;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};

use crate::auth::AppState;
use crate::middleware::require_auth;

/// Assemble the HTTP surface. Outer layers (trace, CORS) are added by the
/// server binary.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/confirm/{token}", get(auth::confirm))
        .route("/auth/login", post(auth::login))
        .route("/rides", get(rides::list_rides))
        .route("/rides/{ride_id}", get(rides::get_ride))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/auth/me", get(auth::profile))
        .route("/auth/me", put(auth::update_profile))
        .route("/rides", post(rides::create_ride))
        .route("/rides/{ride_id}/join", post(rides::join_ride))
        .route("/rides/{ride_id}/approve", post(rides::approve_passenger))
        .route("/rooms/{room_id}/messages", post(chat::send_message))
        .route("/rooms/{room_id}/messages", get(chat::get_messages))
        .layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public).merge(protected)
}
