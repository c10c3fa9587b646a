use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use super::require_module;
use crate::error::AppResult;
use crate::models::{ModuleProgress, UserProgressReport};
use crate::progress::{module_progress, user_report};
use crate::server::{AppState, CurrentUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/progress", get(get_progress))
        .route("/progress/{module_id}", get(get_module_progress))
}

/// GET /progress
pub async fn get_progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<UserProgressReport>> {
    let report = state
        .with_tx(move |db, _| Ok(user_report(db, &user.id)?))
        .await?;
    Ok(Json(report))
}

/// GET /progress/{module_id}
pub async fn get_module_progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(module_id): Path<String>,
) -> AppResult<Json<ModuleProgress>> {
    let view = state
        .with_tx(move |db, _| {
            let module = require_module(db, &module_id)?;
            Ok(module_progress(db, &user.id, &module)?)
        })
        .await?;
    Ok(Json(view))
}
