//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use hiroba_shared::time::{get_utc_timestamp, timestamp_to_rfc3339};

use crate::{
    domain::{Role, RoomId, UserId},
    infrastructure::dto::http::{ErrorResponseDto, TokenRequestDto, TokenResponseDto},
    infrastructure::token::DEFAULT_TOKEN_TTL,
    ui::state::AppState,
    usecase::IssueTokenError,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "time": timestamp_to_rfc3339(get_utc_timestamp()),
    }))
}

/// Issue a room access token for a registered participant.
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(request): Json<TokenRequestDto>,
) -> Result<Json<TokenResponseDto>, (StatusCode, Json<ErrorResponseDto>)> {
    // Convert String -> Domain Models
    let room_id = RoomId::try_from(room_id)
        .map_err(|e| bad_request(e.to_string()))?;
    let user_id = UserId::try_from(request.user_id)
        .map_err(|e| bad_request(e.to_string()))?;
    let role = Role::parse(&request.role)
        .ok_or_else(|| bad_request(format!("unknown role '{}'", request.role)))?;

    match state
        .issue_token_usecase
        .execute(&room_id, &user_id, role)
        .await
    {
        Ok(token) => Ok(Json(TokenResponseDto {
            token,
            expires_in_seconds: DEFAULT_TOKEN_TTL.as_secs(),
        })),
        Err(e) => {
            let status = match &e {
                IssueTokenError::RoomNotFound => StatusCode::NOT_FOUND,
                IssueTokenError::RoomClosed | IssueTokenError::NotRegistered => {
                    StatusCode::FORBIDDEN
                }
                IssueTokenError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
                IssueTokenError::Signing | IssueTokenError::Directory(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            tracing::warn!("Token issuance rejected: {}", e);
            Err((
                status,
                Json(ErrorResponseDto {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

fn bad_request(error: String) -> (StatusCode, Json<ErrorResponseDto>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponseDto { error }))
}
