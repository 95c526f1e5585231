use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Storage(e) => match integrity_violation(e) {
                Some(code) if code == UNIQUE_VIOLATION => StatusCode::CONFLICT,
                Some(_) => StatusCode::BAD_REQUEST,
                None => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE of a class-23 (integrity constraint) failure, if that is what `e` is.
fn integrity_violation(e: &sqlx::Error) -> Option<String> {
    let code = e.as_database_error()?.code()?;
    code.starts_with("23").then(|| code.into_owned())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Storage(e) if status.is_client_error() => {
                tracing::warn!(error = %e, "storage constraint violated");
                "Request conflicts with stored data".to_string()
            }
            ApiError::Storage(e) => {
                error!(error = %e, "storage failure");
                "Internal server error".to_string()
            }
            ApiError::Internal(e) => {
                error!(error = ?e, "internal failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_their_status() {
        assert_eq!(ApiError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Unauthenticated("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn non_database_storage_errors_are_server_errors() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_errors_hide_details() {
        let res = ApiError::from(anyhow::anyhow!("secret detail")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    async fn detail(err: ApiError) -> (StatusCode, String) {
        let res = err.into_response();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        (status, body["detail"].as_str().unwrap_or_default().to_owned())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn constraint_violations_are_client_errors_without_internals(pool: sqlx::PgPool) {
        let owner: i64 = sqlx::query_scalar(
            "INSERT INTO users (first_name, last_name, email, password_hash)
             VALUES ('Ada', 'Lovelace', 'ada@example.com', 'x') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        let check = sqlx::query(
            "INSERT INTO advertisements (title, description, price, user_id) VALUES ('Bike', '', -1, $1)",
        )
        .bind(owner)
        .execute(&pool)
        .await
        .unwrap_err();
        let (status, message) = detail(ApiError::from(check)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Request conflicts with stored data");

        let unique = sqlx::query(
            "INSERT INTO users (first_name, last_name, email, password_hash)
             VALUES ('Ada', 'Lovelace', 'ada@example.com', 'x')",
        )
        .execute(&pool)
        .await
        .unwrap_err();
        let (status, message) = detail(ApiError::from(unique)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(!message.contains("users_email_key"));
        assert!(!message.contains("ada@example.com"));
    }

    #[tokio::test]
    async fn domain_errors_keep_their_message() {
        let (status, message) = detail(ApiError::forbidden("not yours")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(message, "not yours");
    }
}

