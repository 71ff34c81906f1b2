//! User handlers

use axum::Json;
use collab_service::dto::CurrentAccountResponse;

use crate::extractors::AuthAccount;

/// The authenticated account
///
/// GET /users/@me
pub async fn get_current_user(AuthAccount(auth): AuthAccount) -> Json<CurrentAccountResponse> {
    Json(CurrentAccountResponse {
        id: auth.account_id,
    })
}
