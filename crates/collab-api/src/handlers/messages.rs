//! Message history handlers

use axum::{extract::State, Json};
use collab_core::ChatMessage;
use collab_service::dto::HistoryQuery;
use collab_service::ChatService;

use crate::extractors::{AuthAccount, RoomIdPath, ValidatedQuery};
use crate::response::ApiResult;
use crate::state::AppState;

/// Page of a room's history, newest first. Members only.
///
/// GET /chats/:room_id/messages?before=&limit=
pub async fn get_messages(
    State(state): State<AppState>,
    AuthAccount(auth): AuthAccount,
    RoomIdPath(room_id): RoomIdPath,
    ValidatedQuery(query): ValidatedQuery<HistoryQuery>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    let messages = ChatService::new(state.service_context())
        .history(auth.account_id, room_id, query.into())
        .await?;
    Ok(Json(messages))
}
