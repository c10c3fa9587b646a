//! Filesystem-backed content store.
//!
//! Unstructured course material lives in a directory tree keyed by
//! course → module → lesson:
//!
//! ```text
//! courses/{course_id}/modules/{module_id}/lessons/{lesson_id}/content.md
//! courses/{course_id}/modules/{module_id}/lessons/{lesson_id}/files/video/{lesson_id}_video_{n}.{ext}
//! courses/{course_id}/modules/{module_id}/test/questions.json
//! courses/{course_id}/modules/{module_id}/test/settings.json
//! ```
//!
//! Reads of missing keys return `Ok(None)`. Writes replace the previous value.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::models::{TestQuestions, TestSettings};

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "avi"];
pub const DEFAULT_MAX_VIDEO_BYTES: u64 = 500 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported video format '{0}'. Allowed: mp4, webm, mov, avi")]
    UnsupportedExtension(String),

    #[error("Video is {size} bytes; the limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("Invalid file name '{0}'")]
    InvalidFilename(String),
}

pub type ContentResult<T> = Result<T, ContentError>;

#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
    max_video_bytes: u64,
}

impl ContentStore {
    pub fn open<P: AsRef<Path>>(root: P, max_video_bytes: u64) -> ContentResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            max_video_bytes,
        })
    }

    pub fn max_video_bytes(&self) -> u64 {
        self.max_video_bytes
    }

    fn module_path(&self, course_id: &str, module_id: &str) -> PathBuf {
        self.root
            .join("courses")
            .join(course_id)
            .join("modules")
            .join(module_id)
    }

    fn lesson_path(&self, course_id: &str, module_id: &str, lesson_id: &str) -> PathBuf {
        self.module_path(course_id, module_id)
            .join("lessons")
            .join(lesson_id)
    }

    fn test_path(&self, course_id: &str, module_id: &str) -> PathBuf {
        self.module_path(course_id, module_id).join("test")
    }

    fn video_dir(&self, course_id: &str, module_id: &str, lesson_id: &str) -> PathBuf {
        self.lesson_path(course_id, module_id, lesson_id)
            .join("files")
            .join("video")
    }

    // Lesson content

    pub fn lesson_content(
        &self,
        course_id: &str,
        module_id: &str,
        lesson_id: &str,
    ) -> ContentResult<Option<String>> {
        let path = self
            .lesson_path(course_id, module_id, lesson_id)
            .join("content.md");
        read_optional(&path)
    }

    pub fn save_lesson_content(
        &self,
        course_id: &str,
        module_id: &str,
        lesson_id: &str,
        content: &str,
    ) -> ContentResult<()> {
        let path = self
            .lesson_path(course_id, module_id, lesson_id)
            .join("content.md");
        write_file(&path, content.as_bytes())
    }

    // Tests

    pub fn test_questions(
        &self,
        course_id: &str,
        module_id: &str,
    ) -> ContentResult<Option<TestQuestions>> {
        read_json(&self.test_path(course_id, module_id).join("questions.json"))
    }

    pub fn save_test_questions(
        &self,
        course_id: &str,
        module_id: &str,
        questions: &TestQuestions,
    ) -> ContentResult<()> {
        write_json(
            &self.test_path(course_id, module_id).join("questions.json"),
            questions,
        )
    }

    pub fn test_settings(
        &self,
        course_id: &str,
        module_id: &str,
    ) -> ContentResult<Option<TestSettings>> {
        read_json(&self.test_path(course_id, module_id).join("settings.json"))
    }

    pub fn save_test_settings(
        &self,
        course_id: &str,
        module_id: &str,
        settings: &TestSettings,
    ) -> ContentResult<()> {
        write_json(
            &self.test_path(course_id, module_id).join("settings.json"),
            settings,
        )
    }

    // Videos

    /// Stores a video and returns the generated file name.
    pub fn save_video(
        &self,
        course_id: &str,
        module_id: &str,
        lesson_id: &str,
        original_filename: &str,
        data: &[u8],
    ) -> ContentResult<String> {
        let ext = video_extension(original_filename)?;

        let size = data.len() as u64;
        if size > self.max_video_bytes {
            return Err(ContentError::TooLarge {
                size,
                limit: self.max_video_bytes,
            });
        }

        let existing = self.list_videos(course_id, module_id, lesson_id)?;
        let next_index = existing
            .iter()
            .filter_map(|name| video_index(lesson_id, name))
            .max()
            .unwrap_or(0)
            + 1;

        let filename = format!("{}_video_{}.{}", lesson_id, next_index, ext);
        let path = self
            .video_dir(course_id, module_id, lesson_id)
            .join(&filename);
        write_file(&path, data)?;

        tracing::info!(
            lesson_id,
            filename = %filename,
            bytes = size,
            "Video stored"
        );
        Ok(filename)
    }

    pub fn list_videos(
        &self,
        course_id: &str,
        module_id: &str,
        lesson_id: &str,
    ) -> ContentResult<Vec<String>> {
        let dir = self.video_dir(course_id, module_id, lesson_id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn read_video(
        &self,
        course_id: &str,
        module_id: &str,
        lesson_id: &str,
        filename: &str,
    ) -> ContentResult<Option<Vec<u8>>> {
        check_filename(filename)?;
        let path = self
            .video_dir(course_id, module_id, lesson_id)
            .join(filename);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns false when there was nothing to delete.
    pub fn delete_video(
        &self,
        course_id: &str,
        module_id: &str,
        lesson_id: &str,
        filename: &str,
    ) -> ContentResult<bool> {
        check_filename(filename)?;
        let path = self
            .video_dir(course_id, module_id, lesson_id)
            .join(filename);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// MIME type for a stored video, by extension.
pub fn video_content_type(filename: &str) -> &'static str {
    match Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

fn video_extension(filename: &str) -> ContentResult<String> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(ContentError::UnsupportedExtension(ext))
    }
}

// "{lesson_id}_video_{n}.{ext}" -> n
fn video_index(lesson_id: &str, filename: &str) -> Option<u32> {
    let stem = Path::new(filename).file_stem()?.to_str()?;
    let rest = stem.strip_prefix(lesson_id)?.strip_prefix("_video_")?;
    rest.parse().ok()
}

fn check_filename(filename: &str) -> ContentResult<()> {
    let invalid = filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..");
    if invalid {
        Err(ContentError::InvalidFilename(filename.to_string()))
    } else {
        Ok(())
    }
}

fn read_optional(path: &Path) -> ContentResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// A file that exists but does not parse is logged and treated as absent
fn read_json<T: DeserializeOwned>(path: &Path) -> ContentResult<Option<T>> {
    let Some(text) = read_optional(path)? else {
        return Ok(None);
    };
    match serde_json::from_str(&text) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Unreadable content file");
            Ok(None)
        }
    }
}

fn write_file(path: &Path, data: &[u8]) -> ContentResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, data)?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> ContentResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_file(path, json.as_bytes())
}
