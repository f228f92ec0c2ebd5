use axum::Json;
use axum::extract::{Path, State};

use crate::api::auth::AuthUser;
use crate::error::AppError;
use crate::models::*;
use crate::services::progress::is_course_completed;
use crate::state::AppState;

pub async fn list_courses(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CourseListResponse>, AppError> {
    let courses = state.courses.list_courses(&user.user_id).await?;
    Ok(Json(courses))
}

pub async fn get_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<String>,
) -> Result<Json<CourseDetail>, AppError> {
    let course = state
        .courses
        .course_detail(&course_id, &user.user_id)
        .await?
        .ok_or(AppError::NotFoundOrForbidden("Course"))?;
    Ok(Json(course))
}

pub async fn generate_course(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<GenerateCourseRequest>,
) -> Result<Json<GenerateCourseResponse>, AppError> {
    if req.prompt.trim().is_empty() {
        return Err(AppError::BadRequest("prompt must not be empty".to_string()));
    }
    let created = state.courses.generate_course(&user.user_id, &req).await?;
    Ok(Json(created))
}

pub async fn recalculate_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<String>,
) -> Result<Json<RecalculateResponse>, AppError> {
    let progress = state.progress.recalculate_course(&course_id, &user.user_id).await?;
    Ok(Json(RecalculateResponse {
        course_id,
        progress,
        is_completed: is_course_completed(progress),
    }))
}

pub async fn complete_lesson(
    State(state): State<AppState>,
    user: AuthUser,
    Path(lesson_id): Path<String>,
    Json(req): Json<CompletionRequest>,
) -> Result<Json<LessonCompletionResponse>, AppError> {
    let result = state
        .progress
        .set_lesson_completion(&lesson_id, &user.user_id, req.is_completed)
        .await?;

    Ok(Json(LessonCompletionResponse {
        success: result.success,
        message: result.message,
        lesson_id: result.item_id,
        is_completed: result.is_completed,
    }))
}

pub async fn complete_quiz(
    State(state): State<AppState>,
    user: AuthUser,
    Path(quiz_id): Path<String>,
    Json(req): Json<CompletionRequest>,
) -> Result<Json<QuizCompletionResponse>, AppError> {
    let result = state
        .progress
        .set_quiz_completion(&quiz_id, &user.user_id, req.is_completed, req.is_correct)
        .await?;

    Ok(Json(QuizCompletionResponse {
        success: result.success,
        message: result.message,
        quiz_id: result.item_id,
        is_completed: result.is_completed,
    }))
}
