//! Per-user module progress.
//!
//! `aggregate` is a pure projection over rows already loaded from the store;
//! `module_progress` and `user_report` load those rows and call it.

use std::collections::HashMap;

use crate::db::Database;
use crate::models::{
    Lesson, LessonProgress, Module, ModuleProgress, TestAttempt, UserProgress, UserProgressReport,
};

pub fn aggregate(
    module: &Module,
    lessons: &[Lesson],
    progress: &[UserProgress],
    attempts: &[TestAttempt],
) -> ModuleProgress {
    // Module-level "started" markers carry no lesson and never count
    let by_lesson: HashMap<&str, &UserProgress> = progress
        .iter()
        .filter_map(|row| row.lesson_id.as_deref().map(|id| (id, row)))
        .collect();

    let completed_lessons = progress
        .iter()
        .filter(|row| row.lesson_id.is_some() && row.is_completed)
        .count() as i64;

    let progress_percentage = if module.total_lessons > 0 {
        completed_lessons as f64 / module.total_lessons as f64 * 100.0
    } else {
        0.0
    };

    let mut ordered: Vec<&Lesson> = lessons.iter().collect();
    ordered.sort_by_key(|l| (l.order_index, l.lesson_number));

    let lessons = ordered
        .into_iter()
        .map(|lesson| {
            let row = by_lesson.get(lesson.id.as_str());
            LessonProgress {
                lesson_id: lesson.id.clone(),
                lesson_number: lesson.lesson_number,
                is_completed: row.map(|r| r.is_completed).unwrap_or(false),
                completed_at: row.and_then(|r| r.completed_at.clone()),
            }
        })
        .collect();

    ModuleProgress {
        module_id: module.id.clone(),
        completed_lessons,
        total_lessons: module.total_lessons,
        progress_percentage,
        lessons,
        test_passed: attempts.iter().any(|a| a.passed),
        test_attempts: attempts.len() as i64,
    }
}

pub fn module_progress(
    db: &Database,
    user_id: &str,
    module: &Module,
) -> rusqlite::Result<ModuleProgress> {
    let lessons = db.list_lessons_by_order(&module.id)?;
    let progress = db.lesson_progress_rows(user_id, &module.id)?;
    let attempts = db.list_attempts(user_id, &module.id)?;
    Ok(aggregate(module, &lessons, &progress, &attempts))
}

/// Progress across every active module.
pub fn user_report(db: &Database, user_id: &str) -> rusqlite::Result<UserProgressReport> {
    let modules = db
        .list_active_modules()?
        .iter()
        .map(|module| module_progress(db, user_id, module))
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(UserProgressReport {
        user_id: user_id.to_string(),
        modules,
    })
}
