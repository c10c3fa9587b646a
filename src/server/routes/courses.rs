//! Course catalogue.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::{AppError, AppResult};
use crate::models::{Course, Module};
use crate::server::{AppState, CurrentUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/courses/{course_id}", get(get_course))
        .route("/courses/{course_id}/modules", get(list_course_modules))
}

/// GET /courses
pub async fn list_courses(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<Course>>> {
    let courses = state
        .with_tx(|db, _| Ok(db.list_active_courses()?))
        .await?;
    Ok(Json(courses))
}

/// GET /courses/{course_id}
pub async fn get_course(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(course_id): Path<String>,
) -> AppResult<Json<Course>> {
    let course = state
        .with_tx(move |db, _| db.get_course(&course_id)?.ok_or_else(|| AppError::not_found("Course")))
        .await?;
    Ok(Json(course))
}

/// GET /courses/{course_id}/modules
pub async fn list_course_modules(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(course_id): Path<String>,
) -> AppResult<Json<Vec<Module>>> {
    let modules = state
        .with_tx(move |db, _| {
            if db.get_course(&course_id)?.is_none() {
                return Err(AppError::not_found("Course"));
            }
            Ok(db.list_course_modules(&course_id)?)
        })
        .await?;
    Ok(Json(modules))
}
