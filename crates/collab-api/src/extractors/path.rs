//! Path parameter extractors

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use collab_core::RoomId;
use serde::Deserialize;

use crate::response::ApiError;

#[derive(Debug, Deserialize)]
struct RoomParams {
    room_id: String,
}

/// `:room_id` parsed as a [`RoomId`]
#[derive(Debug, Clone, Copy)]
pub struct RoomIdPath(pub RoomId);

#[async_trait]
impl<S> FromRequestParts<S> for RoomIdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<RoomParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_path(e.to_string()))?;

        params
            .room_id
            .parse()
            .map(RoomIdPath)
            .map_err(|_| ApiError::invalid_path("Invalid room_id format"))
    }
}
