use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// User roles; creators author content, hr reads reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Creator,
    Hr,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Creator => "creator",
            Role::Hr => "hr",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "student" | "s" => Some(Role::Student),
            "creator" | "c" | "admin" => Some(Role::Creator),
            "hr" | "h" => Some(Role::Hr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub is_superuser: bool,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    /// Whether the user may edit course content.
    pub fn is_admin(&self) -> bool {
        self.is_superuser || self.role == Role::Creator
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub order_index: i64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: Option<String>,
    pub total_lessons: i64,
    pub order_index: i64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub module_id: String,
    pub lesson_number: i64,
    pub title: String,
    pub order_index: i64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

// A lesson_id of None is the module-level "started" marker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgress {
    pub id: String,
    pub user_id: String,
    pub module_id: String,
    pub lesson_id: Option<String>,
    pub lesson_number: Option<i64>,
    pub is_completed: bool,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

// === Tests ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
}

/// An answer as submitted by a student or stored as the correct answer:
/// either one value or a set of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    One(String),
    Many(Vec<String>),
}

fn default_points() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<QuestionOption>>,
    #[serde(default)]
    pub correct_answer: Option<AnswerValue>,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// What a student sees: no correct answer, no explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
    pub options: Option<Vec<QuestionOption>>,
    pub points: u32,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            question_type: q.question_type,
            question: q.question.clone(),
            options: q.options.clone(),
            points: q.points,
        }
    }
}

// On-disk shape of test/questions.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestQuestions {
    #[serde(default)]
    pub module_id: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<String>,
    pub passing_threshold: f64,
    pub time_limit_minutes: u32,
    pub max_attempts: u32,
    pub shuffle_questions: bool,
    pub show_results_immediately: bool,
    pub allow_review: bool,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            module_id: None,
            passing_threshold: 0.7,
            time_limit_minutes: 30,
            max_attempts: 3,
            shuffle_questions: false,
            show_results_immediately: true,
            allow_review: true,
        }
    }
}

/// Client-reported anomalies during a test (tab switches and anything else
/// the client chooses to send).
///
/// Decoding never fails: a `tab_switches` that is not a count stays in
/// `extra` as sent, and a non-object payload is kept under `"reported"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct SuspiciousActivity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_switches: Option<u32>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl From<serde_json::Value> for SuspiciousActivity {
    fn from(value: serde_json::Value) -> Self {
        let mut extra: BTreeMap<String, serde_json::Value> = match value {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            serde_json::Value::Null => BTreeMap::new(),
            other => BTreeMap::from([("reported".to_string(), other)]),
        };

        let tab_switches = extra
            .get("tab_switches")
            .and_then(serde_json::Value::as_u64)
            .and_then(|n| u32::try_from(n).ok());
        if tab_switches.is_some() {
            extra.remove("tab_switches");
        }

        Self {
            tab_switches,
            extra,
        }
    }
}

impl SuspiciousActivity {
    pub fn is_empty(&self) -> bool {
        self.tab_switches.unwrap_or(0) == 0 && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestAttempt {
    pub id: String,
    pub user_id: String,
    pub module_id: String,
    pub attempt_number: i64,
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub passed: bool,
    pub answers: BTreeMap<String, AnswerValue>,
    pub time_spent_seconds: Option<i64>,
    pub started_at: String,
    pub submitted_at: String,
    pub suspicious_activity: Option<SuspiciousActivity>,
}

// === Progress views ===

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonProgress {
    pub lesson_id: String,
    pub lesson_number: i64,
    pub is_completed: bool,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleProgress {
    pub module_id: String,
    pub completed_lessons: i64,
    pub total_lessons: i64,
    pub progress_percentage: f64,
    pub lessons: Vec<LessonProgress>,
    pub test_passed: bool,
    pub test_attempts: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProgressReport {
    pub user_id: String,
    pub modules: Vec<ModuleProgress>,
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod role_tests {
        use super::*;

        #[test]
        fn as_str_returns_correct_values() {
            assert_eq!(Role::Student.as_str(), "student");
            assert_eq!(Role::Creator.as_str(), "creator");
            assert_eq!(Role::Hr.as_str(), "hr");
        }

        #[test]
        fn from_str_valid_inputs() {
            assert_eq!(Role::from_str("student"), Some(Role::Student));
            assert_eq!(Role::from_str("CREATOR"), Some(Role::Creator));
            assert_eq!(Role::from_str(" hr "), Some(Role::Hr));
            assert_eq!(Role::from_str("admin"), Some(Role::Creator));
        }

        #[test]
        fn from_str_invalid_returns_none() {
            assert_eq!(Role::from_str("guest"), None);
            assert_eq!(Role::from_str(""), None);
        }

        #[test]
        fn serializes_lowercase() {
            assert_eq!(serde_json::to_string(&Role::Hr).unwrap(), "\"hr\"");
        }
    }

    mod user_tests {
        use super::*;

        fn make_user(role: Role, is_superuser: bool) -> User {
            User {
                id: "u1".to_string(),
                email: "a@example.com".to_string(),
                full_name: None,
                role,
                is_superuser,
                is_active: true,
                created_at: String::new(),
                updated_at: String::new(),
            }
        }

        #[test]
        fn creator_is_admin() {
            assert!(make_user(Role::Creator, false).is_admin());
        }

        #[test]
        fn superuser_is_admin_regardless_of_role() {
            assert!(make_user(Role::Student, true).is_admin());
        }

        #[test]
        fn student_and_hr_are_not_admin() {
            assert!(!make_user(Role::Student, false).is_admin());
            assert!(!make_user(Role::Hr, false).is_admin());
        }
    }

    mod question_tests {
        use super::*;

        #[test]
        fn answer_value_accepts_string_or_list() {
            let one: AnswerValue = serde_json::from_str("\"A\"").unwrap();
            assert_eq!(one, AnswerValue::One("A".to_string()));

            let many: AnswerValue = serde_json::from_str("[\"A\",\"B\"]").unwrap();
            assert_eq!(
                many,
                AnswerValue::Many(vec!["A".to_string(), "B".to_string()])
            );
        }

        #[test]
        fn answer_value_rejects_objects() {
            let result: Result<AnswerValue, _> = serde_json::from_str("{\"a\":1}");
            assert!(result.is_err());
        }

        #[test]
        fn question_defaults_points_to_one() {
            let q: Question = serde_json::from_str(
                r#"{"id":"q1","type":"text","question":"Capital?","correct_answer":"Paris"}"#,
            )
            .unwrap();
            assert_eq!(q.points, 1);
            assert_eq!(q.question_type, QuestionType::Text);
            assert!(q.options.is_none());
        }

        #[test]
        fn unknown_question_type_is_rejected() {
            let result: Result<Question, _> =
                serde_json::from_str(r#"{"id":"q1","type":"essay","question":"?"}"#);
            assert!(result.is_err());
        }

        #[test]
        fn public_view_hides_answer() {
            let q = Question {
                id: "q1".to_string(),
                question_type: QuestionType::MultipleChoice,
                question: "Pick".to_string(),
                options: Some(vec![QuestionOption {
                    id: "A".to_string(),
                    text: "Alpha".to_string(),
                }]),
                correct_answer: Some(AnswerValue::One("A".to_string())),
                points: 2,
                explanation: Some("because".to_string()),
            };
            let json = serde_json::to_string(&PublicQuestion::from(&q)).unwrap();
            assert!(!json.contains("correct_answer"));
            assert!(!json.contains("because"));
            assert!(json.contains("\"type\":\"multiple_choice\""));
        }
    }

    mod settings_tests {
        use super::*;

        #[test]
        fn partial_settings_fill_defaults() {
            let s: TestSettings = serde_json::from_str(r#"{"passing_threshold":0.5}"#).unwrap();
            assert_eq!(s.passing_threshold, 0.5);
            assert_eq!(s.max_attempts, 3);
            assert_eq!(s.time_limit_minutes, 30);
            assert!(s.show_results_immediately);
        }

        #[test]
        fn default_threshold_is_seventy_percent() {
            assert_eq!(TestSettings::default().passing_threshold, 0.7);
        }
    }

    mod suspicious_activity_tests {
        use super::*;

        #[test]
        fn keeps_unknown_markers() {
            let s: SuspiciousActivity =
                serde_json::from_str(r#"{"tab_switches":2,"copy_events":1}"#).unwrap();
            assert_eq!(s.tab_switches, Some(2));
            assert_eq!(s.extra.get("copy_events"), Some(&serde_json::json!(1)));
            assert!(!s.is_empty());
        }

        #[test]
        fn malformed_tab_switches_are_kept_as_markers() {
            for raw in [r#""3""#, "-1", "2.5", "4294967296"] {
                let s: SuspiciousActivity =
                    serde_json::from_str(&format!(r#"{{"tab_switches":{}}}"#, raw)).unwrap();
                assert_eq!(s.tab_switches, None);
                assert!(s.extra.contains_key("tab_switches"), "{}", raw);
                assert!(!s.is_empty());
            }
        }

        #[test]
        fn non_object_payload_is_kept() {
            let s: SuspiciousActivity = serde_json::from_str("true").unwrap();
            assert_eq!(s.extra.get("reported"), Some(&serde_json::json!(true)));

            let s: SuspiciousActivity = serde_json::from_str("null").unwrap();
            assert!(s.is_empty());
        }

        #[test]
        fn stored_form_reads_back_unchanged() {
            let s: SuspiciousActivity =
                serde_json::from_str(r#"{"tab_switches":"3","copy_events":1}"#).unwrap();
            let stored = serde_json::to_string(&s).unwrap();
            let back: SuspiciousActivity = serde_json::from_str(&stored).unwrap();
            assert_eq!(back, s);
        }

        #[test]
        fn zero_tab_switches_is_empty() {
            let s: SuspiciousActivity = serde_json::from_str(r#"{"tab_switches":0}"#).unwrap();
            assert!(s.is_empty());
        }
    }

    mod json_output_tests {
        use super::*;

        #[test]
        fn ok_with_string() {
            let output = JsonOutput::ok("test data");
            assert!(output.success);
            assert_eq!(output.data, Some("test data"));
            assert!(output.error.is_none());
        }

        #[test]
        fn err_with_string() {
            let output = JsonOutput::<()>::err("something went wrong");
            assert!(!output.success);
            assert!(output.data.is_none());
            assert_eq!(output.error, Some("something went wrong".to_string()));
        }

        #[test]
        fn serializes_err_correctly() {
            let output = JsonOutput::<()>::err("error");
            let json = serde_json::to_string(&output).unwrap();
            assert!(json.contains("\"success\":false"));
            assert!(json.contains("\"data\":null"));
            assert!(json.contains("\"error\":\"error\""));
        }
    }
}
