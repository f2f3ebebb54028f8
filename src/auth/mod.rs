use crate::state::AppState;
use axum::Router;

mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod password;
pub mod session;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
