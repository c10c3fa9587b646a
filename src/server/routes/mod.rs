//! Route handlers, one file per resource.

pub mod admin;
pub mod courses;
pub mod lessons;
pub mod modules;
pub mod progress;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::Json;
use serde::Serialize;

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Lesson, Module};

/// Acknowledgement body for write endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Unwraps a JSON body, turning malformed payloads into validation errors.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// Unwraps path parameters; a segment that does not parse is a validation error.
pub(crate) fn path_params<T>(path: Result<Path<T>, PathRejection>) -> AppResult<T> {
    path.map(|Path(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

pub(crate) fn require_module(db: &Database, module_id: &str) -> AppResult<Module> {
    db.get_module(module_id)?
        .ok_or_else(|| AppError::not_found("Module"))
}

/// Looks up a lesson by module and number, along with its module.
pub(crate) fn require_lesson(
    db: &Database,
    module_id: &str,
    lesson_number: i64,
) -> AppResult<(Module, Lesson)> {
    let lesson = db
        .get_lesson(module_id, lesson_number)?
        .ok_or_else(|| AppError::not_found("Lesson"))?;
    let module = require_module(db, module_id)?;
    Ok((module, lesson))
}
