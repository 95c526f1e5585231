use crate::state::AppState;
use axum::Router;

mod dto;
pub(crate) mod extractors;
pub(crate) mod guard;
mod handlers;
pub(crate) mod password;
mod services;
mod tokens;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
