use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::{
    dto::{LoginRequest, LoginResponse},
    services,
};
use crate::{error::ApiResult, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    Ok(Json(services::login(&state, payload).await?))
}
