use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/habits/create", post(handlers::create_form))
        .route(
            "/api/habits",
            get(handlers::list_habits).post(handlers::create_habit),
        )
        .route("/api/habits/:id", delete(handlers::delete_habit))
        .route("/api/habits/:id/completions", get(handlers::get_completions))
        .route("/api/habits/:id/toggle", post(handlers::toggle))
        .route("/api/habits/:id/selection", post(handlers::selection))
        .with_state(state)
}
