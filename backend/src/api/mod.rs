pub mod auth;
pub mod course;
pub mod oauth;

use axum::routing::{patch, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/course", get(course::list_courses))
        .route("/course/generate", post(course::generate_course))
        .route("/course/{course_id}", get(course::get_course))
        .route("/course/{course_id}/recalculate", post(course::recalculate_course))
        .route("/course/lesson/{lesson_id}/complete", patch(course::complete_lesson))
        .route("/course/quiz/{quiz_id}/complete", patch(course::complete_quiz))
        .route("/oauth/{provider}/auth-url", get(oauth::auth_url))
        .route("/oauth/{provider}/callback", post(oauth::callback))
        .route("/oauth/{provider}/token", get(oauth::get_token))
        .route("/oauth/{provider}/refresh-token", get(oauth::refresh_token))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}
