use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        AdvertisementView, CreateAdvertisementRequest, SearchParams, SearchResponse,
        UpdateAdvertisementRequest,
    },
    services,
};
use crate::{auth::extractors::AuthIdentity, error::ApiResult, state::AppState};

pub fn advertisement_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/advertisements",
            get(search_advertisements).post(create_advertisement),
        )
        .route(
            "/advertisements/:id",
            get(get_advertisement)
                .patch(update_advertisement)
                .delete(delete_advertisement),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_advertisement(
    State(state): State<AppState>,
    AuthIdentity(actor): AuthIdentity,
    Json(payload): Json<CreateAdvertisementRequest>,
) -> ApiResult<(StatusCode, Json<AdvertisementView>)> {
    let adv = services::create(&state, &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(adv.into())))
}

#[instrument(skip(state))]
pub async fn get_advertisement(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<AdvertisementView>> {
    let adv = services::get(&state, id).await?;
    Ok(Json(adv.into()))
}

#[instrument(skip(state))]
pub async fn search_advertisements(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    Ok(Json(services::search(&state, params).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_advertisement(
    State(state): State<AppState>,
    AuthIdentity(actor): AuthIdentity,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAdvertisementRequest>,
) -> ApiResult<Json<AdvertisementView>> {
    let adv = services::update(&state, &actor, id, payload).await?;
    Ok(Json(adv.into()))
}

#[instrument(skip(state))]
pub async fn delete_advertisement(
    State(state): State<AppState>,
    AuthIdentity(actor): AuthIdentity,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    services::delete(&state, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
