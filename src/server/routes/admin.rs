//! Content authoring. Every handler requires an [`AdminUser`].

use std::collections::HashSet;

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection, PathRejection, QueryRejection},
        DefaultBodyLimit, Path, Query, State,
    },
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{json_body, path_params, require_lesson, require_module, MessageResponse};
use crate::error::{AppError, AppResult};
use crate::models::{Lesson, Module, Question, TestQuestions, TestSettings};
use crate::server::{AdminUser, AppState};

pub fn router(max_video_bytes: u64) -> Router<AppState> {
    // One byte over the ceiling still reaches the store, which reports the size.
    let body_limit = usize::try_from(max_video_bytes.saturating_add(1)).unwrap_or(usize::MAX);

    Router::new()
        .route(
            "/admin/modules/{module_id}",
            get(get_module_for_edit).put(update_module),
        )
        .route("/admin/modules/{module_id}/lessons", get(list_lessons_for_edit))
        .route(
            "/admin/modules/{module_id}/lessons/{lesson_number}",
            get(get_lesson_for_edit).put(update_lesson),
        )
        .route(
            "/admin/modules/{module_id}/test",
            get(get_test_for_edit).put(update_test),
        )
        .route(
            "/admin/modules/{module_id}/lessons/{lesson_number}/video",
            post(upload_video).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/admin/modules/{module_id}/lessons/{lesson_number}/videos",
            get(list_videos),
        )
        .route(
            "/admin/modules/{module_id}/lessons/{lesson_number}/video/{filename}",
            delete(delete_video),
        )
}

// Modules

#[derive(Debug, Default, Deserialize)]
pub struct ModuleUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModuleUpdateResponse {
    pub message: String,
    pub module: Module,
}

/// GET /admin/modules/{module_id}
pub async fn get_module_for_edit(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(module_id): Path<String>,
) -> AppResult<Json<Module>> {
    let module = state
        .with_tx(move |db, _| require_module(db, &module_id))
        .await?;
    Ok(Json(module))
}

/// PUT /admin/modules/{module_id}
pub async fn update_module(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(module_id): Path<String>,
    body: Result<Json<ModuleUpdateRequest>, JsonRejection>,
) -> AppResult<Json<ModuleUpdateResponse>> {
    let update = json_body(body)?;
    check_title(update.title.as_deref())?;

    let module = state
        .with_tx(move |db, _| {
            let module = require_module(db, &module_id)?;
            db.update_module(&module.id, update.title.as_deref(), update.description.as_deref())?;
            tracing::info!(admin_id = %admin.id, module_id = %module.id, "Module updated");
            require_module(db, &module.id)
        })
        .await?;

    Ok(Json(ModuleUpdateResponse {
        message: "Module updated successfully".to_string(),
        module,
    }))
}

// Lessons

#[derive(Debug, Serialize)]
pub struct AdminLessonList {
    pub module_id: String,
    pub module_title: String,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Serialize)]
pub struct AdminLessonResponse {
    pub lesson: Lesson,
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LessonUpdateRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LessonUpdateResponse {
    pub message: String,
    pub lesson: Lesson,
}

/// GET /admin/modules/{module_id}/lessons
pub async fn list_lessons_for_edit(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(module_id): Path<String>,
) -> AppResult<Json<AdminLessonList>> {
    let list = state
        .with_tx(move |db, _| {
            let module = require_module(db, &module_id)?;
            let lessons = db.list_lessons(&module.id)?;
            Ok(AdminLessonList {
                module_id: module.id,
                module_title: module.title,
                lessons,
            })
        })
        .await?;
    Ok(Json(list))
}

/// GET /admin/modules/{module_id}/lessons/{lesson_number}
///
/// Missing content comes back as an empty string.
pub async fn get_lesson_for_edit(
    State(state): State<AppState>,
    _admin: AdminUser,
    path: Result<Path<(String, i64)>, PathRejection>,
) -> AppResult<Json<AdminLessonResponse>> {
    let (module_id, lesson_number) = path_params(path)?;
    let response = state
        .with_tx(move |db, content| {
            let (module, lesson) = require_lesson(db, &module_id, lesson_number)?;
            let body = content
                .lesson_content(&module.course_id, &module.id, &lesson.id)?
                .unwrap_or_default();
            Ok(AdminLessonResponse {
                lesson,
                content: body,
            })
        })
        .await?;
    Ok(Json(response))
}

/// PUT /admin/modules/{module_id}/lessons/{lesson_number}
///
/// The title lives in the database, the body in the content store.
pub async fn update_lesson(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    path: Result<Path<(String, i64)>, PathRejection>,
    body: Result<Json<LessonUpdateRequest>, JsonRejection>,
) -> AppResult<Json<LessonUpdateResponse>> {
    let (module_id, lesson_number) = path_params(path)?;
    let update = json_body(body)?;
    check_title(update.title.as_deref())?;

    let lesson = state
        .with_tx(move |db, content| {
            let (module, lesson) = require_lesson(db, &module_id, lesson_number)?;

            if let Some(title) = update.title.as_deref() {
                db.update_lesson_title(&lesson.id, title)?;
            }
            if let Some(text) = update.content.as_deref() {
                content.save_lesson_content(&module.course_id, &module.id, &lesson.id, text)?;
            }
            tracing::info!(admin_id = %admin.id, lesson_id = %lesson.id, "Lesson updated");

            db.get_lesson(&module.id, lesson_number)?
                .ok_or_else(|| AppError::not_found("Lesson"))
        })
        .await?;

    Ok(Json(LessonUpdateResponse {
        message: "Lesson updated successfully".to_string(),
        lesson,
    }))
}

// Tests

#[derive(Debug, Serialize)]
pub struct AdminTestResponse {
    pub module_id: String,
    pub questions: Vec<Question>,
    pub settings: TestSettings,
}

#[derive(Debug, Deserialize)]
pub struct TestUpdateRequest {
    pub questions: Vec<Question>,
    #[serde(default)]
    pub settings: Option<TestSettings>,
}

#[derive(Debug, Serialize)]
pub struct TestUpdateResponse {
    pub message: String,
    pub module_id: String,
}

/// GET /admin/modules/{module_id}/test
///
/// Full questions, answers included. Absent files yield an empty question
/// list and default settings.
pub async fn get_test_for_edit(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(module_id): Path<String>,
) -> AppResult<Json<AdminTestResponse>> {
    let response = state
        .with_tx(move |db, content| {
            let module = require_module(db, &module_id)?;
            let questions = content
                .test_questions(&module.course_id, &module.id)?
                .map(|q| q.questions)
                .unwrap_or_default();
            let settings = content
                .test_settings(&module.course_id, &module.id)?
                .unwrap_or_else(|| TestSettings {
                    module_id: Some(module.id.clone()),
                    ..TestSettings::default()
                });

            Ok(AdminTestResponse {
                module_id: module.id,
                questions,
                settings,
            })
        })
        .await?;
    Ok(Json(response))
}

/// PUT /admin/modules/{module_id}/test
///
/// Replaces the question list. Settings are replaced only when given.
pub async fn update_test(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(module_id): Path<String>,
    body: Result<Json<TestUpdateRequest>, JsonRejection>,
) -> AppResult<Json<TestUpdateResponse>> {
    let update = json_body(body)?;
    check_questions(&update.questions)?;
    if let Some(settings) = &update.settings {
        check_settings(settings)?;
    }

    let module_id = state
        .with_tx(move |db, content| {
            let module = require_module(db, &module_id)?;
            let count = update.questions.len();

            content.save_test_questions(
                &module.course_id,
                &module.id,
                &TestQuestions {
                    module_id: module.id.clone(),
                    questions: update.questions,
                },
            )?;
            if let Some(settings) = update.settings {
                content.save_test_settings(
                    &module.course_id,
                    &module.id,
                    &TestSettings {
                        module_id: Some(module.id.clone()),
                        ..settings
                    },
                )?;
            }

            tracing::info!(admin_id = %admin.id, module_id = %module.id, questions = count, "Test updated");
            Ok(module.id)
        })
        .await?;

    Ok(Json(TestUpdateResponse {
        message: "Test updated successfully".to_string(),
        module_id,
    }))
}

// Videos

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct VideoUploadResponse {
    pub message: String,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct VideoList {
    pub videos: Vec<String>,
}

/// POST /admin/modules/{module_id}/lessons/{lesson_number}/video?filename=...
///
/// The request body is the raw video.
pub async fn upload_video(
    State(state): State<AppState>,
    _admin: AdminUser,
    path: Result<Path<(String, i64)>, PathRejection>,
    params: Result<Query<UploadParams>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Json<VideoUploadResponse>> {
    let (module_id, lesson_number) = path_params(path)?;
    let Query(params) = params.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let body = body
        .map_err(|rejection| upload_rejection(rejection, state.content().max_video_bytes()))?;
    if body.is_empty() {
        return Err(AppError::Validation("Video upload is empty".to_string()));
    }

    let filename = state
        .with_tx(move |db, content| {
            let (module, lesson) = require_lesson(db, &module_id, lesson_number)?;
            Ok(content.save_video(
                &module.course_id,
                &module.id,
                &lesson.id,
                &params.filename,
                &body,
            )?)
        })
        .await?;

    Ok(Json(VideoUploadResponse {
        message: "Video uploaded successfully".to_string(),
        filename,
    }))
}

/// GET /admin/modules/{module_id}/lessons/{lesson_number}/videos
pub async fn list_videos(
    State(state): State<AppState>,
    _admin: AdminUser,
    path: Result<Path<(String, i64)>, PathRejection>,
) -> AppResult<Json<VideoList>> {
    let (module_id, lesson_number) = path_params(path)?;
    let videos = state
        .with_tx(move |db, content| {
            let (module, lesson) = require_lesson(db, &module_id, lesson_number)?;
            Ok(content.list_videos(&module.course_id, &module.id, &lesson.id)?)
        })
        .await?;
    Ok(Json(VideoList { videos }))
}

/// DELETE /admin/modules/{module_id}/lessons/{lesson_number}/video/{filename}
pub async fn delete_video(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    path: Result<Path<(String, i64, String)>, PathRejection>,
) -> AppResult<Json<MessageResponse>> {
    let (module_id, lesson_number, filename) = path_params(path)?;
    state
        .with_tx(move |db, content| {
            let (module, lesson) = require_lesson(db, &module_id, lesson_number)?;
            if !content.delete_video(&module.course_id, &module.id, &lesson.id, &filename)? {
                return Err(AppError::not_found("Video file"));
            }
            tracing::info!(admin_id = %admin.id, lesson_id = %lesson.id, filename = %filename, "Video deleted");
            Ok(())
        })
        .await?;

    Ok(Json(MessageResponse::new("Video deleted successfully")))
}

fn upload_rejection(rejection: BytesRejection, limit: u64) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Validation(format!("Video exceeds the limit of {} bytes", limit))
    } else {
        AppError::Validation(rejection.body_text())
    }
}

fn check_title(title: Option<&str>) -> AppResult<()> {
    match title {
        Some(t) if t.trim().is_empty() => Err(AppError::Validation(
            "Title must not be empty".to_string(),
        )),
        _ => Ok(()),
    }
}

fn check_questions(questions: &[Question]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for question in questions {
        if question.id.trim().is_empty() {
            return Err(AppError::Validation("Question id must not be empty".to_string()));
        }
        if !seen.insert(question.id.as_str()) {
            return Err(AppError::Validation(format!(
                "Duplicate question id '{}'",
                question.id
            )));
        }
    }
    Ok(())
}

fn check_settings(settings: &TestSettings) -> AppResult<()> {
    if !(0.0..=1.0).contains(&settings.passing_threshold) {
        return Err(AppError::Validation(
            "passing_threshold must be between 0 and 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DEMO_COURSE_ID;
    use crate::server::test_support::{admin, test_state};
    use serde_json::json;

    const MODULE: &str = "Company_Module_01";

    fn body<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<Json<T>, JsonRejection> {
        Ok(Json(serde_json::from_value(value).unwrap()))
    }

    fn upload_params(name: &str) -> Result<Query<UploadParams>, QueryRejection> {
        Ok(Query(UploadParams {
            filename: name.to_string(),
        }))
    }

    mod module_tests {
        use super::*;

        #[tokio::test]
        async fn update_title_only() {
            let (state, _dir) = test_state();
            let user = admin(&state).await;

            let Json(response) = update_module(
                State(state),
                user,
                Path(MODULE.into()),
                body(json!({ "title": "Foundations" })),
            )
            .await
            .unwrap();
            assert_eq!(response.module.title, "Foundations");
            assert_eq!(
                response.module.description.as_deref(),
                Some("Core concepts and history of artificial intelligence")
            );
        }

        #[tokio::test]
        async fn blank_title_is_rejected() {
            let (state, _dir) = test_state();
            let user = admin(&state).await;

            let result = update_module(
                State(state),
                user,
                Path(MODULE.into()),
                body(json!({ "title": "  " })),
            )
            .await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }

        #[tokio::test]
        async fn unknown_module() {
            let (state, _dir) = test_state();
            let user = admin(&state).await;

            let result = get_module_for_edit(State(state), user, Path("Nope".into())).await;
            assert!(matches!(result, Err(AppError::NotFound(_))));
        }

        #[tokio::test]
        async fn lesson_list_carries_module_title() {
            let (state, _dir) = test_state();
            let user = admin(&state).await;

            let Json(list) = list_lessons_for_edit(State(state), user, Path(MODULE.into()))
                .await
                .unwrap();
            assert_eq!(list.module_title, "Introduction to AI");
            assert_eq!(list.lessons.len(), 3);
        }
    }

    mod lesson_tests {
        use super::*;

        #[tokio::test]
        async fn missing_content_is_empty_for_editing() {
            let (state, _dir) = test_state();
            let user = admin(&state).await;

            let Json(response) = get_lesson_for_edit(State(state), user, Ok(Path((MODULE.into(), 2))))
                .await
                .unwrap();
            assert_eq!(response.content, "");
        }

        #[tokio::test]
        async fn update_title_and_content() {
            let (state, _dir) = test_state();
            let user = admin(&state).await;

            let Json(response) = update_lesson(
                State(state.clone()),
                user.clone(),
                Ok(Path((MODULE.into(), 2))),
                body(json!({ "title": "Search", "content": "# Search\n\nBFS and DFS." })),
            )
            .await
            .unwrap();
            assert_eq!(response.lesson.title, "Search");

            let Json(fetched) = get_lesson_for_edit(State(state), user, Ok(Path((MODULE.into(), 2))))
                .await
                .unwrap();
            assert_eq!(fetched.content, "# Search\n\nBFS and DFS.");
            assert_eq!(fetched.lesson.title, "Search");
        }

        #[tokio::test]
        async fn content_only_keeps_title() {
            let (state, _dir) = test_state();
            let user = admin(&state).await;

            let Json(response) = update_lesson(
                State(state),
                user,
                Ok(Path((MODULE.into(), 1))),
                body(json!({ "content": "body" })),
            )
            .await
            .unwrap();
            assert_eq!(response.lesson.title, "Lesson 1: Introduction to AI");
        }

        #[tokio::test]
        async fn malformed_body_is_unprocessable() {
            use crate::server::extract::USER_ID_HEADER;
            use crate::server::router;
            use axum::http::{header, Request, StatusCode};
            use tower::ServiceExt;

            let (state, _dir) = test_state();
            let AdminUser(user) = admin(&state).await;

            let response = router(state)
                .oneshot(
                    Request::builder()
                        .method("PUT")
                        .uri("/api/v1/admin/modules/Company_Module_01/lessons/1")
                        .header(USER_ID_HEADER, &user.id)
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(axum::body::Body::from("{not json"))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    mod test_editing_tests {
        use super::*;

        fn questions_json() -> serde_json::Value {
            json!([
                {
                    "id": "q1",
                    "type": "multiple_choice",
                    "question": "Which are mammals?",
                    "options": [{ "id": "A", "text": "Whale" }, { "id": "B", "text": "Shark" }],
                    "correct_answer": ["A"],
                    "points": 2,
                    "explanation": "Whales are mammals"
                },
                {
                    "id": "q2",
                    "type": "text",
                    "question": "2 + 2?",
                    "correct_answer": "4"
                }
            ])
        }

        #[tokio::test]
        async fn defaults_when_nothing_stored() {
            let (state, _dir) = test_state();
            let user = admin(&state).await;

            let Json(test) = get_test_for_edit(State(state), user, Path(MODULE.into()))
                .await
                .unwrap();
            assert!(test.questions.is_empty());
            assert_eq!(test.settings.passing_threshold, 0.7);
            assert_eq!(test.settings.module_id.as_deref(), Some(MODULE));
        }

        #[tokio::test]
        async fn replace_questions_and_settings() {
            let (state, _dir) = test_state();
            let user = admin(&state).await;

            let Json(saved) = update_test(
                State(state.clone()),
                user.clone(),
                Path(MODULE.into()),
                body(json!({
                    "questions": questions_json(),
                    "settings": { "passing_threshold": 0.8, "shuffle_questions": true }
                })),
            )
            .await
            .unwrap();
            assert_eq!(saved.module_id, MODULE);

            let Json(test) = get_test_for_edit(State(state.clone()), user, Path(MODULE.into()))
                .await
                .unwrap();
            assert_eq!(test.questions.len(), 2);
            assert_eq!(test.questions[0].explanation.as_deref(), Some("Whales are mammals"));
            assert_eq!(test.settings.passing_threshold, 0.8);
            assert!(test.settings.shuffle_questions);
            assert_eq!(test.settings.max_attempts, 3);

            let stored = state
                .content()
                .test_questions(DEMO_COURSE_ID, MODULE)
                .unwrap()
                .unwrap();
            assert_eq!(stored.module_id, MODULE);
        }

        #[tokio::test]
        async fn settings_untouched_when_omitted() {
            let (state, _dir) = test_state();
            let user = admin(&state).await;

            let Json(saved) = update_test(
                State(state.clone()),
                user,
                Path(MODULE.into()),
                body(json!({ "questions": questions_json() })),
            )
            .await
            .unwrap();
            assert_eq!(saved.module_id, MODULE);

            assert!(state
                .content()
                .test_settings(DEMO_COURSE_ID, MODULE)
                .unwrap()
                .is_none());
        }

        #[tokio::test]
        async fn out_of_range_threshold_is_rejected() {
            let (state, _dir) = test_state();
            let user = admin(&state).await;

            let result = update_test(
                State(state),
                user,
                Path(MODULE.into()),
                body(json!({ "questions": [], "settings": { "passing_threshold": 1.5 } })),
            )
            .await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }

        #[tokio::test]
        async fn duplicate_question_ids_are_rejected() {
            let (state, _dir) = test_state();
            let user = admin(&state).await;

            let result = update_test(
                State(state),
                user,
                Path(MODULE.into()),
                body(json!({ "questions": [
                    { "id": "q1", "type": "text", "question": "a", "correct_answer": "a" },
                    { "id": "q1", "type": "text", "question": "b", "correct_answer": "b" }
                ] })),
            )
            .await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
    }

    mod video_tests {
        use super::*;

        #[tokio::test]
        async fn upload_list_delete() {
            let (state, _dir) = test_state();
            let user = admin(&state).await;

            let Json(uploaded) = upload_video(
                State(state.clone()),
                user.clone(),
                Ok(Path((MODULE.into(), 1))),
                upload_params("lecture.mp4"),
                Ok(Bytes::from_static(b"video")),
            )
            .await
            .unwrap();
            assert_eq!(uploaded.filename, "Company_Module_01_Lesson_01_video_1.mp4");

            let Json(list) = list_videos(State(state.clone()), user.clone(), Ok(Path((MODULE.into(), 1))))
                .await
                .unwrap();
            assert_eq!(list.videos, vec![uploaded.filename.clone()]);

            let Json(deleted) = delete_video(
                State(state.clone()),
                user.clone(),
                Ok(Path((MODULE.into(), 1, uploaded.filename.clone()))),
            )
            .await
            .unwrap();
            assert_eq!(deleted.message, "Video deleted successfully");

            let again = delete_video(
                State(state),
                user,
                Ok(Path((MODULE.into(), 1, uploaded.filename))),
            )
            .await;
            assert!(matches!(again, Err(AppError::NotFound(ref d)) if d == "Video file not found"));
        }

        #[tokio::test]
        async fn bad_extension_is_validation_error() {
            let (state, _dir) = test_state();
            let user = admin(&state).await;

            let result = upload_video(
                State(state),
                user,
                Ok(Path((MODULE.into(), 1))),
                upload_params("notes.pdf"),
                Ok(Bytes::from_static(b"%PDF")),
            )
            .await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }

        #[tokio::test]
        async fn empty_upload_is_rejected() {
            let (state, _dir) = test_state();
            let user = admin(&state).await;

            let result = upload_video(
                State(state),
                user,
                Ok(Path((MODULE.into(), 1))),
                upload_params("clip.mp4"),
                Ok(Bytes::new()),
            )
            .await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }

        #[tokio::test]
        async fn unknown_lesson() {
            let (state, _dir) = test_state();
            let user = admin(&state).await;

            let result = list_videos(State(state), user, Ok(Path((MODULE.into(), 7)))).await;
            assert!(matches!(result, Err(AppError::NotFound(_))));
        }
    }
}
