//! Lesson viewing, completion and video download.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::{path_params, require_lesson};
use crate::content::video_content_type;
use crate::error::{AppError, AppResult};
use crate::models::Lesson;
use crate::server::{AppState, CurrentUser};

pub const MISSING_CONTENT: &str = "# Lesson content not found";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/modules/{module_id}/lessons/{lesson_number}", get(get_lesson))
        .route(
            "/modules/{module_id}/lessons/{lesson_number}/complete",
            post(complete_lesson),
        )
        .route(
            "/modules/{module_id}/lessons/{lesson_number}/videos/{filename}",
            get(download_video),
        )
}

#[derive(Debug, Serialize)]
pub struct LessonContentResponse {
    pub lesson: Lesson,
    pub content: String,
    pub next_lesson: Option<Lesson>,
}

#[derive(Debug, Serialize)]
pub struct CompleteLessonResponse {
    pub message: String,
    pub lesson_id: String,
}

/// GET /modules/{module_id}/lessons/{lesson_number}
///
/// Opening a lesson records a progress row for the caller if none exists.
pub async fn get_lesson(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<(String, i64)>, PathRejection>,
) -> AppResult<Json<LessonContentResponse>> {
    let (module_id, lesson_number) = path_params(path)?;
    let response = state
        .with_tx(move |db, content| {
            let (module, lesson) = require_lesson(db, &module_id, lesson_number)?;

            let body = content
                .lesson_content(&module.course_id, &module.id, &lesson.id)?
                .unwrap_or_else(|| MISSING_CONTENT.to_string());
            let next_lesson = db.get_lesson(&module.id, lesson_number + 1)?;

            db.touch_lesson_progress(&user.id, &lesson)?;

            Ok(LessonContentResponse {
                lesson,
                content: body,
                next_lesson,
            })
        })
        .await?;

    Ok(Json(response))
}

/// POST /modules/{module_id}/lessons/{lesson_number}/complete
pub async fn complete_lesson(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<(String, i64)>, PathRejection>,
) -> AppResult<Json<CompleteLessonResponse>> {
    let (module_id, lesson_number) = path_params(path)?;
    let lesson_id = state
        .with_tx(move |db, _| {
            let (_, lesson) = require_lesson(db, &module_id, lesson_number)?;
            db.complete_lesson(&user.id, &lesson)?;
            tracing::info!(user_id = %user.id, lesson_id = %lesson.id, "Lesson completed");
            Ok(lesson.id)
        })
        .await?;

    Ok(Json(CompleteLessonResponse {
        message: "Lesson completed".to_string(),
        lesson_id,
    }))
}

/// GET /modules/{module_id}/lessons/{lesson_number}/videos/{filename}
///
/// Sends the whole file; range requests are not supported.
pub async fn download_video(
    State(state): State<AppState>,
    _user: CurrentUser,
    path: Result<Path<(String, i64, String)>, PathRejection>,
) -> AppResult<Response> {
    let (module_id, lesson_number, filename) = path_params(path)?;
    let content_type = video_content_type(&filename);
    let bytes = state
        .with_tx(move |db, content| {
            let (module, lesson) = require_lesson(db, &module_id, lesson_number)?;
            content
                .read_video(&module.course_id, &module.id, &lesson.id, &filename)?
                .ok_or_else(|| AppError::not_found("Video file"))
        })
        .await?;

    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
