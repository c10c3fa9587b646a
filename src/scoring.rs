//! Test scoring.
//!
//! Pure functions over a question list and a map of submitted answers. Nothing
//! here touches storage; the submit handler persists the outcome.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::models::{AnswerValue, Question, QuestionType};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreOutcome {
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub passed: bool,
}

/// Scores a submission. `passing_threshold` is a fraction in [0, 1].
pub fn score_submission(
    questions: &[Question],
    answers: &HashMap<String, AnswerValue>,
    passing_threshold: f64,
) -> ScoreOutcome {
    let max_score: f64 = questions.iter().map(|q| f64::from(q.points)).sum();
    let score: f64 = questions
        .iter()
        .map(|q| award(q, answers.get(&q.id)))
        .sum();

    let percentage = if max_score > 0.0 {
        score / max_score * 100.0
    } else {
        0.0
    };
    let passed = max_score > 0.0 && percentage >= passing_threshold * 100.0;

    ScoreOutcome {
        score,
        max_score,
        percentage,
        passed,
    }
}

/// Points awarded for a single question.
pub fn award(question: &Question, answer: Option<&AnswerValue>) -> f64 {
    let points = f64::from(question.points);
    let (Some(answer), Some(correct)) = (answer, question.correct_answer.as_ref()) else {
        return 0.0;
    };

    match question.question_type {
        QuestionType::MultipleChoice => points * multiple_choice_credit(correct, answer),
        QuestionType::Text => {
            if text_matches(correct, answer) {
                points
            } else {
                0.0
            }
        }
    }
}

// Half credit only when the correct answer is a set and a single value from it
// was submitted.
fn multiple_choice_credit(correct: &AnswerValue, answer: &AnswerValue) -> f64 {
    match (correct, answer) {
        (AnswerValue::Many(correct), AnswerValue::Many(submitted)) => {
            let correct: BTreeSet<&str> = correct.iter().map(String::as_str).collect();
            let submitted: BTreeSet<&str> = submitted.iter().map(String::as_str).collect();
            if correct == submitted {
                1.0
            } else {
                0.0
            }
        }
        (AnswerValue::Many(correct), AnswerValue::One(submitted)) => {
            if correct.contains(submitted) {
                0.5
            } else {
                0.0
            }
        }
        (AnswerValue::One(correct), AnswerValue::One(submitted)) => {
            if correct == submitted {
                1.0
            } else {
                0.0
            }
        }
        (AnswerValue::One(_), AnswerValue::Many(_)) => 0.0,
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

// A list-valued correct answer accepts any of its entries.
fn text_matches(correct: &AnswerValue, answer: &AnswerValue) -> bool {
    let AnswerValue::One(submitted) = answer else {
        return false;
    };
    let submitted = normalize(submitted);
    if submitted.is_empty() {
        return false;
    }

    match correct {
        AnswerValue::One(expected) => normalize(expected) == submitted,
        AnswerValue::Many(expected) => expected.iter().any(|e| normalize(e) == submitted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(s: &str) -> AnswerValue {
        AnswerValue::One(s.to_string())
    }

    fn many(items: &[&str]) -> AnswerValue {
        AnswerValue::Many(items.iter().map(|s| s.to_string()).collect())
    }

    fn question(id: &str, question_type: QuestionType, correct: AnswerValue, points: u32) -> Question {
        Question {
            id: id.to_string(),
            question_type,
            question: format!("Question {}", id),
            options: None,
            correct_answer: Some(correct),
            points,
            explanation: None,
        }
    }

    fn answers(pairs: &[(&str, AnswerValue)]) -> HashMap<String, AnswerValue> {
        pairs
            .iter()
            .map(|(id, a)| (id.to_string(), a.clone()))
            .collect()
    }

    mod multiple_choice_tests {
        use super::*;

        #[test]
        fn exact_set_gets_full_credit() {
            let qs = vec![question("q1", QuestionType::MultipleChoice, many(&["A", "B"]), 2)];
            let outcome = score_submission(&qs, &answers(&[("q1", many(&["B", "A"]))]), 0.7);
            assert_eq!(outcome.score, 2.0);
            assert_eq!(outcome.percentage, 100.0);
            assert!(outcome.passed);
        }

        #[test]
        fn single_member_of_set_gets_half_credit() {
            let qs = vec![question("q1", QuestionType::MultipleChoice, many(&["A", "B"]), 2)];
            let outcome = score_submission(&qs, &answers(&[("q1", one("A"))]), 0.7);
            assert_eq!(outcome.score, 1.0);
            assert_eq!(outcome.percentage, 50.0);
            assert!(!outcome.passed);
        }

        #[test]
        fn single_non_member_gets_nothing() {
            let qs = vec![question("q1", QuestionType::MultipleChoice, many(&["A", "B"]), 2)];
            let outcome = score_submission(&qs, &answers(&[("q1", one("C"))]), 0.7);
            assert_eq!(outcome.score, 0.0);
        }

        #[test]
        fn partial_set_gets_nothing() {
            let qs = vec![question("q1", QuestionType::MultipleChoice, many(&["A", "B", "C"]), 3)];
            let outcome = score_submission(&qs, &answers(&[("q1", many(&["A", "B"]))]), 0.7);
            assert_eq!(outcome.score, 0.0);
        }

        #[test]
        fn singleton_list_matching_single_correct_gets_nothing() {
            let qs = vec![question("q1", QuestionType::MultipleChoice, one("A"), 1)];
            let outcome = score_submission(&qs, &answers(&[("q1", many(&["A"]))]), 0.7);
            assert_eq!(outcome.score, 0.0);
        }

        #[test]
        fn single_correct_exact_match() {
            let qs = vec![question("q1", QuestionType::MultipleChoice, one("B"), 1)];
            assert_eq!(
                score_submission(&qs, &answers(&[("q1", one("B"))]), 0.7).score,
                1.0
            );
            assert_eq!(
                score_submission(&qs, &answers(&[("q1", one("b"))]), 0.7).score,
                0.0
            );
        }
    }

    mod text_tests {
        use super::*;

        #[test]
        fn case_and_whitespace_insensitive() {
            let qs = vec![question("q1", QuestionType::Text, one("Paris"), 1)];
            for submitted in ["Paris", " paris ", "PARIS"] {
                let outcome = score_submission(&qs, &answers(&[("q1", one(submitted))]), 0.7);
                assert_eq!(outcome.score, 1.0, "answer {:?}", submitted);
            }
        }

        #[test]
        fn wrong_text_scores_zero() {
            let qs = vec![question("q1", QuestionType::Text, one("Paris"), 1)];
            let outcome = score_submission(&qs, &answers(&[("q1", one("Lyon"))]), 0.7);
            assert_eq!(outcome.score, 0.0);
        }

        #[test]
        fn empty_answer_scores_zero() {
            let qs = vec![question("q1", QuestionType::Text, one(""), 1)];
            let outcome = score_submission(&qs, &answers(&[("q1", one("  "))]), 0.7);
            assert_eq!(outcome.score, 0.0);
        }

        #[test]
        fn list_correct_accepts_any_entry() {
            let qs = vec![question("q1", QuestionType::Text, many(&["Paris", "Paree"]), 1)];
            let outcome = score_submission(&qs, &answers(&[("q1", one("paree"))]), 0.7);
            assert_eq!(outcome.score, 1.0);
        }
    }

    mod totals_tests {
        use super::*;

        #[test]
        fn zero_points_never_passes() {
            let outcome = score_submission(&[], &HashMap::new(), 0.0);
            assert_eq!(outcome.max_score, 0.0);
            assert_eq!(outcome.percentage, 0.0);
            assert!(!outcome.passed);
        }

        #[test]
        fn zero_weight_questions_never_pass() {
            let qs = vec![question("q1", QuestionType::Text, one("x"), 0)];
            let outcome = score_submission(&qs, &answers(&[("q1", one("x"))]), 0.0);
            assert_eq!(outcome.percentage, 0.0);
            assert!(!outcome.passed);
        }

        #[test]
        fn unanswered_questions_score_zero() {
            let qs = vec![
                question("q1", QuestionType::Text, one("a"), 1),
                question("q2", QuestionType::Text, one("b"), 3),
            ];
            let outcome = score_submission(&qs, &answers(&[("q1", one("a"))]), 0.7);
            assert_eq!(outcome.score, 1.0);
            assert_eq!(outcome.max_score, 4.0);
            assert_eq!(outcome.percentage, 25.0);
        }

        #[test]
        fn missing_correct_answer_scores_zero() {
            let mut q = question("q1", QuestionType::Text, one("a"), 1);
            q.correct_answer = None;
            let outcome = score_submission(&[q], &answers(&[("q1", one("a"))]), 0.7);
            assert_eq!(outcome.score, 0.0);
            assert_eq!(outcome.max_score, 1.0);
        }

        #[test]
        fn threshold_is_inclusive() {
            let qs = vec![
                question("q1", QuestionType::Text, one("a"), 1),
                question("q2", QuestionType::Text, one("b"), 1),
            ];
            let outcome = score_submission(&qs, &answers(&[("q1", one("a"))]), 0.5);
            assert_eq!(outcome.percentage, 50.0);
            assert!(outcome.passed);
        }

        #[test]
        fn answers_for_unknown_questions_are_ignored() {
            let qs = vec![question("q1", QuestionType::Text, one("a"), 1)];
            let outcome = score_submission(
                &qs,
                &answers(&[("q1", one("a")), ("ghost", one("boo"))]),
                0.7,
            );
            assert_eq!(outcome.score, 1.0);
            assert_eq!(outcome.max_score, 1.0);
        }
    }
}
