use crate::state::AppState;
use axum::Router;

mod dto;
mod handlers;
pub(crate) mod repo;
pub(crate) mod services;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
