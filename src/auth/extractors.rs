use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use tracing::warn;
use uuid::Uuid;

use super::{guard::Identity, tokens};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

pub const TOKEN_HEADER: &str = "x-token";

/// Resolves the presented token to the acting user.
pub struct AuthIdentity(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = presented_token(&parts.headers)?;

        match tokens::resolve(&state.db, presented, state.config.token_ttl_sec).await? {
            Some(identity) => Ok(AuthIdentity(identity)),
            None => {
                warn!("unknown or expired token");
                Err(ApiError::Unauthenticated("Token not found".into()))
            }
        }
    }
}

/// Read the token from `X-Token`, falling back to `Authorization: Bearer`.
fn presented_token(headers: &HeaderMap) -> ApiResult<Uuid> {
    let raw = match headers.get(TOKEN_HEADER) {
        Some(v) => v
            .to_str()
            .map_err(|_| ApiError::validation("Token must be a UUID"))?,
        None => bearer(headers)?,
    };

    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::validation("Token must be a UUID"))
}

fn bearer(headers: &HeaderMap) -> ApiResult<&str> {
    let auth = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthenticated("Missing token".into()))?
        .to_str()
        .map_err(|_| ApiError::Unauthenticated("Invalid Authorization header".into()))?;

    match auth.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(ApiError::Unauthenticated("Invalid auth scheme".into())),
    }
}
