use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use carpool_store::chat::{HistoryOutcome, SendOutcome};
use carpool_types::api::{Claims, MessageResponse, SendMessageRequest};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn send_message(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.body.is_empty() {
        return Err(ApiError::Validation("message body is empty".into()));
    }

    match state.store.rooms.send(room_id, &claims.sub, req.body)? {
        SendOutcome::Sent(message) => {
            Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
        }
        SendOutcome::NotParticipant => {
            Err(ApiError::Forbidden("not a participant of this chat room"))
        }
        SendOutcome::NotFound => Err(ApiError::NotFound("chat room")),
    }
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    match state.store.rooms.history(room_id, &claims.sub)? {
        HistoryOutcome::Messages(messages) => {
            let messages: Vec<MessageResponse> =
                messages.into_iter().map(MessageResponse::from).collect();
            Ok(Json(messages))
        }
        HistoryOutcome::NotParticipant => {
            Err(ApiError::Forbidden("not a participant of this chat room"))
        }
        HistoryOutcome::NotFound => Err(ApiError::NotFound("chat room")),
    }
}
