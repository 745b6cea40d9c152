pub mod activities;
pub mod api;
pub mod flash;
pub mod import;
pub mod map;
pub mod pages;
pub mod schedule;
pub mod todos;

use axum::Router;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(pages::router())
        .merge(activities::router())
        .merge(schedule::router())
        .merge(map::router())
        .merge(todos::router())
        .merge(import::router())
        .nest("/api", api::router())
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
