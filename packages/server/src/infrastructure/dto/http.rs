//! HTTP API request / response DTOs.

use serde::{Deserialize, Serialize};

/// Request body for `POST /rooms/{room_id}/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequestDto {
    pub user_id: String,
    pub role: String,
}

/// Response body for a successfully issued room access token.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponseDto {
    pub token: String,
    pub expires_in_seconds: u64,
}

/// Generic error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponseDto {
    pub error: String,
}
