use axum::Router;

use crate::state::AppState;

pub mod assets;
pub mod dto;
pub mod handlers;
pub mod page;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::protected_routes())
        .merge(handlers::public_routes())
}
