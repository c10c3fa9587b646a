//! Module lookup and enrolment.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::require_module;
use crate::error::AppResult;
use crate::models::{Lesson, Module};
use crate::server::{AppState, CurrentUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/modules/{module_id}", get(get_module))
        .route("/modules/{module_id}/start", post(start_module))
        .route("/modules/{module_id}/lessons", get(list_module_lessons))
}

#[derive(Debug, Serialize)]
pub struct StartModuleResponse {
    pub message: String,
    pub module_id: String,
}

/// GET /modules/{module_id}
pub async fn get_module(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(module_id): Path<String>,
) -> AppResult<Json<Module>> {
    let module = state
        .with_tx(move |db, _| require_module(db, &module_id))
        .await?;
    Ok(Json(module))
}

/// POST /modules/{module_id}/start
///
/// Records a module-level progress marker unless the user already has
/// progress in the module.
pub async fn start_module(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(module_id): Path<String>,
) -> AppResult<Json<StartModuleResponse>> {
    let module_id = state
        .with_tx(move |db, _| {
            let module = require_module(db, &module_id)?;
            if db.start_module(&user.id, &module.id)? {
                tracing::info!(user_id = %user.id, module_id = %module.id, "Module started");
            }
            Ok(module.id)
        })
        .await?;

    Ok(Json(StartModuleResponse {
        message: "Module started".to_string(),
        module_id,
    }))
}

/// GET /modules/{module_id}/lessons
pub async fn list_module_lessons(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(module_id): Path<String>,
) -> AppResult<Json<Vec<Lesson>>> {
    let lessons = state
        .with_tx(move |db, _| {
            let module = require_module(db, &module_id)?;
            Ok(db.list_lessons(&module.id)?)
        })
        .await?;
    Ok(Json(lessons))
}
