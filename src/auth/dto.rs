use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned after a successful login; `token` goes into the `X-Token` header.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub email: String,
    pub token: Uuid,
}
