mod dto;
mod handlers;
mod repo;
mod search;
mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::advertisement_routes()
}
