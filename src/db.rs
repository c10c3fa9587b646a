use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use sha2::{Digest, Sha256};
use std::path::Path;
use uuid::Uuid;

use crate::models::{
    AnswerValue, Course, Lesson, Module, Role, SuspiciousActivity, TestAttempt, User,
    UserProgress,
};

pub const DEMO_COURSE_ID: &str = "00000000-0000-0000-0000-000000000001";

pub struct Database {
    conn: Connection,
}

pub struct NewUser<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub full_name: Option<&'a str>,
    pub role: Role,
    pub is_superuser: bool,
}

pub struct NewAttempt<'a> {
    pub user_id: &'a str,
    pub module_id: &'a str,
    pub attempt_number: i64,
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub passed: bool,
    pub answers: &'a BTreeMap<String, AnswerValue>,
    pub time_spent_seconds: Option<i64>,
    pub suspicious_activity: Option<&'a SuspiciousActivity>,
}

#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct SeedSummary {
    pub users_created: Vec<String>,
    pub course_created: bool,
    pub modules_created: usize,
    pub lessons_created: usize,
}

const USER_COLUMNS: &str =
    "id, email, full_name, role, is_superuser, is_active, created_at, updated_at";
const COURSE_COLUMNS: &str =
    "id, title, description, order_index, is_active, created_at, updated_at";
const MODULE_COLUMNS: &str = "id, course_id, title, description, total_lessons, order_index, is_active, created_at, updated_at";
const LESSON_COLUMNS: &str =
    "id, module_id, lesson_number, title, order_index, is_active, created_at, updated_at";
const PROGRESS_COLUMNS: &str = "id, user_id, module_id, lesson_id, lesson_number, is_completed, completed_at, created_at, updated_at";
const ATTEMPT_COLUMNS: &str = "id, user_id, module_id, attempt_number, score, max_score, percentage, passed, answers, time_spent_seconds, started_at, submitted_at, suspicious_activity";

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                hashed_password TEXT NOT NULL,
                full_name TEXT,
                role TEXT NOT NULL DEFAULT 'student' CHECK(role IN ('student', 'creator', 'hr')),
                is_superuser INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS courses (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                order_index INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS modules (
                id TEXT PRIMARY KEY,
                course_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                total_lessons INTEGER NOT NULL DEFAULT 3,
                order_index INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (course_id) REFERENCES courses(id)
            );

            CREATE TABLE IF NOT EXISTS lessons (
                id TEXT PRIMARY KEY,
                module_id TEXT NOT NULL,
                lesson_number INTEGER NOT NULL,
                title TEXT NOT NULL,
                order_index INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (module_id, lesson_number),
                FOREIGN KEY (module_id) REFERENCES modules(id)
            );

            CREATE TABLE IF NOT EXISTS user_progress (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                module_id TEXT NOT NULL,
                lesson_id TEXT,
                lesson_number INTEGER,
                is_completed INTEGER NOT NULL DEFAULT 0,
                completed_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (module_id) REFERENCES modules(id),
                FOREIGN KEY (lesson_id) REFERENCES lessons(id)
            );

            -- Attempt numbers are not unique: concurrent submissions may collide
            CREATE TABLE IF NOT EXISTS test_attempts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                module_id TEXT NOT NULL,
                attempt_number INTEGER NOT NULL DEFAULT 1,
                score REAL NOT NULL,
                max_score REAL NOT NULL,
                percentage REAL NOT NULL,
                passed INTEGER NOT NULL DEFAULT 0,
                answers TEXT NOT NULL,
                time_spent_seconds INTEGER,
                started_at TEXT NOT NULL,
                submitted_at TEXT NOT NULL,
                suspicious_activity TEXT,
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (module_id) REFERENCES modules(id)
            );

            CREATE INDEX IF NOT EXISTS idx_modules_course ON modules(course_id);
            CREATE INDEX IF NOT EXISTS idx_lessons_module ON lessons(module_id);
            CREATE INDEX IF NOT EXISTS idx_progress_user_module ON user_progress(user_id, module_id);
            CREATE INDEX IF NOT EXISTS idx_attempts_user_module ON test_attempts(user_id, module_id);
            "#,
        )?;

        Ok(())
    }

    /// Runs `f` inside a transaction. Commits when `f` returns `Ok`; an `Err`
    /// or a panic drops the transaction, which rolls it back.
    pub fn transaction<T, E>(&self, f: impl FnOnce(&Self) -> std::result::Result<T, E>) -> std::result::Result<T, E>
    where
        E: From<rusqlite::Error>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    // User operations
    pub fn create_user(&self, user: &NewUser) -> Result<User> {
        let id = Uuid::new_v4().to_string();
        let now = now_timestamp();
        self.conn.execute(
            r#"
            INSERT INTO users (id, email, hashed_password, full_name, role, is_superuser, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
            "#,
            params![
                id,
                user.email,
                hash_password(user.password),
                user.full_name,
                user.role.as_str(),
                user.is_superuser,
                now
            ],
        )?;

        self.get_user(&id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id],
                row_to_user,
            )
            .optional()
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                params![email],
                row_to_user,
            )
            .optional()
    }

    pub fn set_user_active(&self, id: &str, active: bool) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE users SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
            params![active, now_timestamp(), id],
        )?;
        Ok(rows > 0)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM users ORDER BY email", USER_COLUMNS))?;
        let rows = stmt.query_map([], row_to_user)?;
        rows.collect()
    }

    // Course operations
    pub fn insert_course(
        &self,
        id: &str,
        title: &str,
        description: Option<&str>,
        order_index: i64,
    ) -> Result<()> {
        let now = now_timestamp();
        self.conn.execute(
            r#"
            INSERT INTO courses (id, title, description, order_index, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
            "#,
            params![id, title, description, order_index, now],
        )?;
        Ok(())
    }

    pub fn get_course(&self, id: &str) -> Result<Option<Course>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM courses WHERE id = ?1", COURSE_COLUMNS),
                params![id],
                row_to_course,
            )
            .optional()
    }

    pub fn list_active_courses(&self) -> Result<Vec<Course>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM courses WHERE is_active = 1 ORDER BY order_index",
            COURSE_COLUMNS
        ))?;
        let rows = stmt.query_map([], row_to_course)?;
        rows.collect()
    }

    // Module operations
    pub fn insert_module(
        &self,
        id: &str,
        course_id: &str,
        title: &str,
        description: Option<&str>,
        total_lessons: i64,
        order_index: i64,
    ) -> Result<()> {
        let now = now_timestamp();
        self.conn.execute(
            r#"
            INSERT INTO modules (id, course_id, title, description, total_lessons, order_index, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
            "#,
            params![id, course_id, title, description, total_lessons, order_index, now],
        )?;
        Ok(())
    }

    pub fn get_module(&self, id: &str) -> Result<Option<Module>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM modules WHERE id = ?1", MODULE_COLUMNS),
                params![id],
                row_to_module,
            )
            .optional()
    }

    pub fn list_course_modules(&self, course_id: &str) -> Result<Vec<Module>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM modules WHERE course_id = ?1 AND is_active = 1 ORDER BY order_index",
            MODULE_COLUMNS
        ))?;
        let rows = stmt.query_map(params![course_id], row_to_module)?;
        rows.collect()
    }

    pub fn list_active_modules(&self) -> Result<Vec<Module>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM modules WHERE is_active = 1 ORDER BY order_index",
            MODULE_COLUMNS
        ))?;
        let rows = stmt.query_map([], row_to_module)?;
        rows.collect()
    }

    /// Updates whichever fields are given. Returns false if the module is unknown.
    pub fn update_module(
        &self,
        id: &str,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<bool> {
        let rows = self.conn.execute(
            r#"
            UPDATE modules
            SET title = COALESCE(?1, title),
                description = COALESCE(?2, description),
                updated_at = ?3
            WHERE id = ?4
            "#,
            params![title, description, now_timestamp(), id],
        )?;
        Ok(rows > 0)
    }

    // Lesson operations
    pub fn insert_lesson(
        &self,
        id: &str,
        module_id: &str,
        lesson_number: i64,
        title: &str,
        order_index: i64,
    ) -> Result<()> {
        let now = now_timestamp();
        self.conn.execute(
            r#"
            INSERT INTO lessons (id, module_id, lesson_number, title, order_index, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
            "#,
            params![id, module_id, lesson_number, title, order_index, now],
        )?;
        Ok(())
    }

    pub fn get_lesson(&self, module_id: &str, lesson_number: i64) -> Result<Option<Lesson>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM lessons WHERE module_id = ?1 AND lesson_number = ?2",
                    LESSON_COLUMNS
                ),
                params![module_id, lesson_number],
                row_to_lesson,
            )
            .optional()
    }

    pub fn list_lessons(&self, module_id: &str) -> Result<Vec<Lesson>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM lessons WHERE module_id = ?1 ORDER BY lesson_number",
            LESSON_COLUMNS
        ))?;
        let rows = stmt.query_map(params![module_id], row_to_lesson)?;
        rows.collect()
    }

    pub fn list_lessons_by_order(&self, module_id: &str) -> Result<Vec<Lesson>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM lessons WHERE module_id = ?1 ORDER BY order_index, lesson_number",
            LESSON_COLUMNS
        ))?;
        let rows = stmt.query_map(params![module_id], row_to_lesson)?;
        rows.collect()
    }

    pub fn update_lesson_title(&self, lesson_id: &str, title: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE lessons SET title = ?1, updated_at = ?2 WHERE id = ?3",
            params![title, now_timestamp(), lesson_id],
        )?;
        Ok(rows > 0)
    }

    // Progress operations
    pub fn get_lesson_progress(
        &self,
        user_id: &str,
        module_id: &str,
        lesson_id: &str,
    ) -> Result<Option<UserProgress>> {
        self.conn
            .query_row(
                &format!(
                    r#"
                    SELECT {} FROM user_progress
                    WHERE user_id = ?1 AND module_id = ?2 AND lesson_id = ?3
                    ORDER BY created_at
                    LIMIT 1
                    "#,
                    PROGRESS_COLUMNS
                ),
                params![user_id, module_id, lesson_id],
                row_to_progress,
            )
            .optional()
    }

    /// Records that a user opened a lesson. Existing rows are left untouched.
    pub fn touch_lesson_progress(&self, user_id: &str, lesson: &Lesson) -> Result<UserProgress> {
        if let Some(existing) = self.get_lesson_progress(user_id, &lesson.module_id, &lesson.id)? {
            return Ok(existing);
        }
        self.insert_progress(user_id, &lesson.module_id, Some(lesson), false)
    }

    pub fn complete_lesson(&self, user_id: &str, lesson: &Lesson) -> Result<UserProgress> {
        match self.get_lesson_progress(user_id, &lesson.module_id, &lesson.id)? {
            Some(existing) => {
                let now = now_timestamp();
                self.conn.execute(
                    r#"
                    UPDATE user_progress
                    SET is_completed = 1, completed_at = ?1, updated_at = ?1
                    WHERE id = ?2
                    "#,
                    params![now, existing.id],
                )?;
                Ok(UserProgress {
                    is_completed: true,
                    completed_at: Some(now.clone()),
                    updated_at: now,
                    ..existing
                })
            }
            None => self.insert_progress(user_id, &lesson.module_id, Some(lesson), true),
        }
    }

    /// Marks a module as started unless the user already has any progress in it.
    /// Returns true when a row was created.
    pub fn start_module(&self, user_id: &str, module_id: &str) -> Result<bool> {
        let existing: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM user_progress WHERE user_id = ?1 AND module_id = ?2",
            params![user_id, module_id],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Ok(false);
        }
        self.insert_progress(user_id, module_id, None, false)?;
        Ok(true)
    }

    fn insert_progress(
        &self,
        user_id: &str,
        module_id: &str,
        lesson: Option<&Lesson>,
        completed: bool,
    ) -> Result<UserProgress> {
        let id = Uuid::new_v4().to_string();
        let now = now_timestamp();
        let completed_at = completed.then(|| now.clone());
        self.conn.execute(
            r#"
            INSERT INTO user_progress (id, user_id, module_id, lesson_id, lesson_number, is_completed, completed_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
            params![
                id,
                user_id,
                module_id,
                lesson.map(|l| l.id.as_str()),
                lesson.map(|l| l.lesson_number),
                completed,
                completed_at,
                now
            ],
        )?;

        Ok(UserProgress {
            id,
            user_id: user_id.to_string(),
            module_id: module_id.to_string(),
            lesson_id: lesson.map(|l| l.id.clone()),
            lesson_number: lesson.map(|l| l.lesson_number),
            is_completed: completed,
            completed_at,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Lesson-scoped progress rows (module-level markers excluded).
    pub fn lesson_progress_rows(&self, user_id: &str, module_id: &str) -> Result<Vec<UserProgress>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM user_progress
            WHERE user_id = ?1 AND module_id = ?2 AND lesson_id IS NOT NULL
            ORDER BY created_at
            "#,
            PROGRESS_COLUMNS
        ))?;
        let rows = stmt.query_map(params![user_id, module_id], row_to_progress)?;
        rows.collect()
    }

    // Test attempt operations
    pub fn count_attempts(&self, user_id: &str, module_id: &str) -> Result<i64> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM test_attempts WHERE user_id = ?1 AND module_id = ?2",
            params![user_id, module_id],
            |row| row.get(0),
        )
    }

    pub fn insert_attempt(&self, attempt: &NewAttempt) -> Result<TestAttempt> {
        let id = Uuid::new_v4().to_string();
        let submitted = Utc::now();
        let started = attempt
            .time_spent_seconds
            .filter(|secs| *secs > 0)
            .and_then(chrono::Duration::try_seconds)
            .and_then(|spent| submitted.checked_sub_signed(spent))
            .unwrap_or(submitted);
        let submitted_at = submitted.to_rfc3339_opts(SecondsFormat::Micros, true);
        let started_at = started.to_rfc3339_opts(SecondsFormat::Micros, true);

        let answers_json = serde_json::to_string(attempt.answers)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        let suspicious_json = attempt
            .suspicious_activity
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        self.conn.execute(
            r#"
            INSERT INTO test_attempts (id, user_id, module_id, attempt_number, score, max_score, percentage,
                                       passed, answers, time_spent_seconds, started_at, submitted_at, suspicious_activity)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                id,
                attempt.user_id,
                attempt.module_id,
                attempt.attempt_number,
                attempt.score,
                attempt.max_score,
                attempt.percentage,
                attempt.passed,
                answers_json,
                attempt.time_spent_seconds,
                started_at,
                submitted_at,
                suspicious_json
            ],
        )?;

        Ok(TestAttempt {
            id,
            user_id: attempt.user_id.to_string(),
            module_id: attempt.module_id.to_string(),
            attempt_number: attempt.attempt_number,
            score: attempt.score,
            max_score: attempt.max_score,
            percentage: attempt.percentage,
            passed: attempt.passed,
            answers: attempt.answers.clone(),
            time_spent_seconds: attempt.time_spent_seconds,
            started_at,
            submitted_at,
            suspicious_activity: attempt.suspicious_activity.cloned(),
        })
    }

    pub fn latest_attempt(&self, user_id: &str, module_id: &str) -> Result<Option<TestAttempt>> {
        self.conn
            .query_row(
                &format!(
                    r#"
                    SELECT {} FROM test_attempts
                    WHERE user_id = ?1 AND module_id = ?2
                    ORDER BY submitted_at DESC, attempt_number DESC
                    LIMIT 1
                    "#,
                    ATTEMPT_COLUMNS
                ),
                params![user_id, module_id],
                row_to_attempt,
            )
            .optional()
    }

    pub fn list_attempts(&self, user_id: &str, module_id: &str) -> Result<Vec<TestAttempt>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM test_attempts
            WHERE user_id = ?1 AND module_id = ?2
            ORDER BY submitted_at, attempt_number
            "#,
            ATTEMPT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![user_id, module_id], row_to_attempt)?;
        rows.collect()
    }

    // Demo data
    pub fn seed_demo(&self) -> Result<SeedSummary> {
        self.transaction(|db| {
            let mut summary = SeedSummary::default();

            let demo_users = [
                ("admin@example.com", "admin123", "Admin User", Role::Creator, true),
                ("student@example.com", "student123", "Test Student", Role::Student, false),
            ];
            for (email, password, name, role, is_superuser) in demo_users {
                if db.get_user_by_email(email)?.is_none() {
                    db.create_user(&NewUser {
                        email,
                        password,
                        full_name: Some(name),
                        role,
                        is_superuser,
                    })?;
                    summary.users_created.push(email.to_string());
                }
            }

            if db.get_course(DEMO_COURSE_ID)?.is_some() {
                return Ok(summary);
            }

            db.insert_course(
                DEMO_COURSE_ID,
                "AI Fundamentals",
                Some("A course on the fundamentals of artificial intelligence"),
                1,
            )?;
            summary.course_created = true;

            let modules = [
                (
                    "Company_Module_01",
                    "Introduction to AI",
                    "Core concepts and history of artificial intelligence",
                ),
                (
                    "Company_Module_02",
                    "Machine Learning",
                    "Machine learning and neural network basics",
                ),
                (
                    "Company_Module_03",
                    "Applying AI",
                    "Practical applications of artificial intelligence",
                ),
            ];
            for (index, (module_id, title, description)) in modules.into_iter().enumerate() {
                db.insert_module(
                    module_id,
                    DEMO_COURSE_ID,
                    title,
                    Some(description),
                    3,
                    index as i64 + 1,
                )?;
                summary.modules_created += 1;

                for lesson_number in 1..=3_i64 {
                    db.insert_lesson(
                        &format!("{}_Lesson_{:02}", module_id, lesson_number),
                        module_id,
                        lesson_number,
                        &format!("Lesson {}: {}", lesson_number, title),
                        lesson_number,
                    )?;
                    summary.lessons_created += 1;
                }
            }

            Ok(summary)
        })
    }
}

pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// `hex(salt)$hex(sha256(salt || password))`
pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::thread_rng().gen();
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    format!("{}${:x}", to_hex(&salt), hasher.finalize())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn row_to_user(row: &Row) -> Result<User> {
    let role_str: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        role: Role::from_str(&role_str).unwrap_or(Role::Student),
        is_superuser: row.get(4)?,
        is_active: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn row_to_course(row: &Row) -> Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        order_index: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn row_to_module(row: &Row) -> Result<Module> {
    Ok(Module {
        id: row.get(0)?,
        course_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        total_lessons: row.get(4)?,
        order_index: row.get(5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn row_to_lesson(row: &Row) -> Result<Lesson> {
    Ok(Lesson {
        id: row.get(0)?,
        module_id: row.get(1)?,
        lesson_number: row.get(2)?,
        title: row.get(3)?,
        order_index: row.get(4)?,
        is_active: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn row_to_progress(row: &Row) -> Result<UserProgress> {
    Ok(UserProgress {
        id: row.get(0)?,
        user_id: row.get(1)?,
        module_id: row.get(2)?,
        lesson_id: row.get(3)?,
        lesson_number: row.get(4)?,
        is_completed: row.get(5)?,
        completed_at: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn row_to_attempt(row: &Row) -> Result<TestAttempt> {
    let answers_json: String = row.get(8)?;
    let answers = serde_json::from_str(&answers_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;
    let suspicious_json: Option<String> = row.get(12)?;
    let suspicious_activity = suspicious_json
        .map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(12, Type::Text, Box::new(e)))?;

    Ok(TestAttempt {
        id: row.get(0)?,
        user_id: row.get(1)?,
        module_id: row.get(2)?,
        attempt_number: row.get(3)?,
        score: row.get(4)?,
        max_score: row.get(5)?,
        percentage: row.get(6)?,
        passed: row.get(7)?,
        answers,
        time_spent_seconds: row.get(9)?,
        started_at: row.get(10)?,
        submitted_at: row.get(11)?,
        suspicious_activity,
    })
}
