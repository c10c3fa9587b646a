use std::net::SocketAddr;
use std::path::PathBuf;

use crate::content::DEFAULT_MAX_VIDEO_BYTES;
use crate::error::{AppError, AppResult};

const DEFAULT_DB_NAME: &str = "lms.db";
const DEFAULT_STORAGE_DIR: &str = "storage";
const DEFAULT_ADDR: &str = "127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub storage_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub max_video_bytes: u64,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup` (normally the process environment).
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lms");

        let db_path = lookup("LMS_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(DEFAULT_DB_NAME));

        let storage_path = lookup("LMS_STORAGE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(DEFAULT_STORAGE_DIR));

        let bind_addr = parse_addr(&lookup("LMS_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()))?;

        let max_video_bytes = match lookup("LMS_MAX_VIDEO_MB") {
            Some(raw) => {
                let mb: u64 = raw.trim().parse().map_err(|_| {
                    AppError::Config(format!("LMS_MAX_VIDEO_MB must be a whole number, got '{}'", raw))
                })?;
                mb.checked_mul(1024 * 1024).ok_or_else(|| {
                    AppError::Config(format!("LMS_MAX_VIDEO_MB is too large: {}", mb))
                })?
            }
            None => DEFAULT_MAX_VIDEO_BYTES,
        };

        Ok(Self {
            db_path,
            storage_path,
            bind_addr,
            max_video_bytes,
        })
    }

    /// Creates the directory that will hold the database file.
    pub fn ensure_db_dir(&self) -> std::io::Result<()> {
        match self.db_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }
}

pub fn parse_addr(raw: &str) -> AppResult<SocketAddr> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("Invalid bind address '{}'", raw)))
}
