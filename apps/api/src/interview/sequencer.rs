//! Dynamic interview sequencing over an ordered list of guarded questions.
//!
//! A question may carry a single-predicate guard on an earlier answer. The
//! next question is the first unanswered question whose guard holds.
//!
//! Guards are resolved in one forward pass into three states:
//! - `Satisfied`: no guard, or the guard holds against the recorded answer.
//! - `Unsatisfied`: the guard fails, or the referenced question is itself
//!   unsatisfied.
//! - `Pending`: the referenced question has not been answered yet.
//!
//! Progress counts satisfied and pending questions in its total. Answering
//! can only move pending questions to satisfied or unsatisfied, so the total
//! never grows while the answered count does: progress is monotonic.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub type Answers = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionCondition {
    pub question_id: String,
    pub operator: ConditionOperator,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterviewQuestion {
    pub id: String,
    pub text: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<QuestionCondition>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    Satisfied,
    Unsatisfied,
    Pending,
}

impl GuardState {
    fn is_applicable(self) -> bool {
        matches!(self, GuardState::Satisfied | GuardState::Pending)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SequenceError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("duplicate question id '{0}'")]
    DuplicateId(String),

    #[error("question '{question}' is guarded on '{references}', which is not an earlier question")]
    InvalidReference {
        question: String,
        references: String,
    },

    #[error("unknown question '{0}'")]
    UnknownQuestion(String),

    #[error("question '{0}' does not apply given the answers so far")]
    NotApplicable(String),
}

/// An ordered, validated question set.
#[derive(Debug, Clone)]
pub struct QuestionSequencer {
    questions: Vec<InterviewQuestion>,
    index: HashMap<String, usize>,
}

impl QuestionSequencer {
    /// Validates ids and guard references. Guards may only point backwards.
    pub fn new(questions: Vec<InterviewQuestion>) -> Result<Self, SequenceError> {
        let mut index = HashMap::with_capacity(questions.len());
        for (i, question) in questions.iter().enumerate() {
            if question.id.trim().is_empty() {
                return Err(SequenceError::EmptyId);
            }
            if let Some(condition) = &question.condition {
                if !index.contains_key(&condition.question_id) {
                    return Err(SequenceError::InvalidReference {
                        question: question.id.clone(),
                        references: condition.question_id.clone(),
                    });
                }
            }
            if index.insert(question.id.clone(), i).is_some() {
                return Err(SequenceError::DuplicateId(question.id.clone()));
            }
        }
        Ok(Self { questions, index })
    }

    pub fn questions(&self) -> &[InterviewQuestion] {
        &self.questions
    }

    /// Resolves every guard against the answers, in question order.
    pub fn guard_states(&self, answers: &Answers) -> Vec<GuardState> {
        let mut states: Vec<GuardState> = Vec::with_capacity(self.questions.len());
        for question in &self.questions {
            let state = match &question.condition {
                None => GuardState::Satisfied,
                Some(condition) => {
                    // references are validated to point at earlier questions
                    let referenced = self.index[&condition.question_id];
                    if states[referenced] == GuardState::Unsatisfied {
                        GuardState::Unsatisfied
                    } else {
                        match answers.get(&condition.question_id) {
                            Some(answer) if evaluate_condition(condition, answer) => {
                                GuardState::Satisfied
                            }
                            Some(_) => GuardState::Unsatisfied,
                            None => GuardState::Pending,
                        }
                    }
                }
            };
            states.push(state);
        }
        states
    }

    /// Drops answers to questions whose guard no longer holds, returning
    /// their ids in question order. Needed after a parent answer changes:
    /// answers on the abandoned branch must not linger. One pass suffices
    /// because a question guarded on a non-satisfied question is itself
    /// non-satisfied.
    pub fn prune_answers(&self, answers: &mut Answers) -> Vec<String> {
        let states = self.guard_states(answers);
        let mut removed = Vec::new();
        for (question, state) in self.questions.iter().zip(states) {
            if state != GuardState::Satisfied && answers.remove(&question.id).is_some() {
                removed.push(question.id.clone());
            }
        }
        removed
    }

    /// First unanswered question whose guard holds.
    pub fn next_question(&self, answers: &Answers) -> Option<&InterviewQuestion> {
        self.questions
            .iter()
            .zip(self.guard_states(answers))
            .find(|(q, state)| *state == GuardState::Satisfied && !answers.contains_key(&q.id))
            .map(|(q, _)| q)
    }

    /// Answered applicable questions over all applicable questions, as a
    /// rounded percentage. An interview with nothing applicable is complete.
    pub fn progress(&self, answers: &Answers) -> u8 {
        let states = self.guard_states(answers);
        let (answered, total) = self
            .questions
            .iter()
            .zip(states)
            .filter(|(_, state)| state.is_applicable())
            .fold((0usize, 0usize), |(answered, total), (q, _)| {
                (answered + answers.contains_key(&q.id) as usize, total + 1)
            });
        if total == 0 {
            return 100;
        }
        ((answered as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8
    }

    pub fn is_complete(&self, answers: &Answers) -> bool {
        self.next_question(answers).is_none()
    }

    /// Checks that `question_id` may be answered now: it exists and its
    /// guard currently holds. Re-answering a satisfied question is allowed.
    pub fn check_answerable(&self, question_id: &str, answers: &Answers) -> Result<(), SequenceError> {
        let &i = self
            .index
            .get(question_id)
            .ok_or_else(|| SequenceError::UnknownQuestion(question_id.to_string()))?;
        if self.guard_states(answers)[i] == GuardState::Satisfied {
            Ok(())
        } else {
            Err(SequenceError::NotApplicable(question_id.to_string()))
        }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_lowercase()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Scalar equality: numeric when both sides are numbers (or numeric
/// strings), otherwise trimmed, case-insensitive text comparison.
fn scalar_equals(answer: &Value, expected: &Value) -> bool {
    if let (Some(a), Some(b)) = (as_number(answer), as_number(expected)) {
        return a == b;
    }
    match (as_text(answer), as_text(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Evaluates a guard against the recorded answer of the referenced question.
pub fn evaluate_condition(condition: &QuestionCondition, answer: &Value) -> bool {
    let expected = &condition.value;
    match condition.operator {
        ConditionOperator::Equals => scalar_equals(answer, expected),
        ConditionOperator::NotEquals => !scalar_equals(answer, expected),
        ConditionOperator::Contains => match answer {
            Value::Array(items) => items.iter().any(|item| scalar_equals(item, expected)),
            Value::String(s) => as_text(expected)
                .is_some_and(|needle| s.to_lowercase().contains(&needle)),
            _ => false,
        },
        ConditionOperator::GreaterThan => {
            matches!((as_number(answer), as_number(expected)), (Some(a), Some(b)) if a > b)
        }
        ConditionOperator::LessThan => {
            matches!((as_number(answer), as_number(expected)), (Some(a), Some(b)) if a < b)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn q(id: &str) -> InterviewQuestion {
        InterviewQuestion {
            id: id.into(),
            text: format!("Question {id}?"),
            category: "general".into(),
            condition: None,
        }
    }

    fn guarded(id: &str, on: &str, operator: ConditionOperator, value: Value) -> InterviewQuestion {
        InterviewQuestion {
            condition: Some(QuestionCondition {
                question_id: on.into(),
                operator,
                value,
            }),
            ..q(id)
        }
    }

    fn answers(pairs: &[(&str, Value)]) -> Answers {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn employment_flow() -> QuestionSequencer {
        QuestionSequencer::new(vec![
            q("employed"),
            guarded("current_role", "employed", ConditionOperator::Equals, json!("yes")),
            guarded("last_role", "employed", ConditionOperator::Equals, json!("no")),
            q("skills"),
        ])
        .unwrap()
    }

    #[test]
    fn test_next_question_skips_unsatisfied_guards() {
        let seq = employment_flow();
        assert_eq!(seq.next_question(&Answers::new()).unwrap().id, "employed");

        let a = answers(&[("employed", json!("No"))]);
        assert_eq!(seq.next_question(&a).unwrap().id, "last_role");

        let a = answers(&[("employed", json!("yes"))]);
        assert_eq!(seq.next_question(&a).unwrap().id, "current_role");
    }

    #[test]
    fn test_guarded_question_never_returned_while_predicate_false() {
        let seq = employment_flow();
        let mut a = answers(&[("employed", json!("yes"))]);
        while let Some(next) = seq.next_question(&a) {
            assert_ne!(next.id, "last_role");
            let id = next.id.clone();
            a.insert(id, json!("answer"));
        }
        assert!(seq.is_complete(&a));
        assert_eq!(seq.progress(&a), 100);
    }

    #[test]
    fn test_progress_counts_pending_guards() {
        let seq = employment_flow();
        // employed and skills are satisfied, both role questions pending
        assert_eq!(seq.progress(&Answers::new()), 0);
        let a = answers(&[("employed", json!("yes"))]);
        // total = employed, current_role, skills
        assert_eq!(seq.progress(&a), 33);
        let a = answers(&[("employed", json!("yes")), ("current_role", json!("CTO"))]);
        assert_eq!(seq.progress(&a), 67);
    }

    #[test]
    fn test_progress_is_monotonic_as_answers_are_added() {
        // Many questions hang off the third answer: a naive
        // answered/satisfied ratio would drop when it is given.
        let mut questions = vec![q("a"), q("b"), q("c")];
        for i in 0..7 {
            questions.push(guarded(
                &format!("follow_up_{i}"),
                "c",
                ConditionOperator::Equals,
                json!("yes"),
            ));
        }
        let seq = QuestionSequencer::new(questions).unwrap();

        let mut a = Answers::new();
        let mut last = seq.progress(&a);
        while let Some(next) = seq.next_question(&a) {
            let id = next.id.clone();
            a.insert(id, json!("yes"));
            let now = seq.progress(&a);
            assert!(now >= last, "progress dropped from {last} to {now}");
            last = now;
        }
        assert_eq!(last, 100);
        assert_eq!(a.len(), 10);
    }

    #[test]
    fn test_chained_guards_resolve_when_parent_fails() {
        let seq = QuestionSequencer::new(vec![
            q("employed"),
            guarded("manager", "employed", ConditionOperator::Equals, json!("yes")),
            guarded("team_size", "manager", ConditionOperator::Equals, json!("yes")),
        ])
        .unwrap();
        let a = answers(&[("employed", json!("no"))]);
        assert_eq!(
            seq.guard_states(&a),
            vec![
                GuardState::Satisfied,
                GuardState::Unsatisfied,
                GuardState::Unsatisfied
            ]
        );
        assert!(seq.is_complete(&a));
        assert_eq!(seq.progress(&a), 100);
    }

    #[test]
    fn test_numeric_and_contains_operators() {
        let cond = |operator, value| QuestionCondition {
            question_id: "x".into(),
            operator,
            value,
        };
        assert!(evaluate_condition(&cond(ConditionOperator::GreaterThan, json!(5)), &json!("7")));
        assert!(!evaluate_condition(&cond(ConditionOperator::GreaterThan, json!(5)), &json!(5)));
        assert!(evaluate_condition(&cond(ConditionOperator::LessThan, json!("6")), &json!(2.5)));
        assert!(!evaluate_condition(&cond(ConditionOperator::LessThan, json!(6)), &json!("many")));

        let contains = cond(ConditionOperator::Contains, json!("AWS"));
        assert!(evaluate_condition(&contains, &json!("Rust, aws, Postgres")));
        assert!(evaluate_condition(&contains, &json!(["gcp", "aws"])));
        assert!(!evaluate_condition(&contains, &json!(["awsome"])));
        assert!(!evaluate_condition(&contains, &json!(42)));
    }

    #[test]
    fn test_equals_is_loose_on_case_and_numbers() {
        let eq = QuestionCondition {
            question_id: "x".into(),
            operator: ConditionOperator::Equals,
            value: json!(5),
        };
        assert!(evaluate_condition(&eq, &json!("5.0")));
        assert!(evaluate_condition(&eq, &json!(5)));
        let ne = QuestionCondition {
            operator: ConditionOperator::NotEquals,
            value: json!("Yes"),
            ..eq
        };
        assert!(!evaluate_condition(&ne, &json!(" yes ")));
        assert!(evaluate_condition(&ne, &json!("no")));
    }

    #[test]
    fn test_new_rejects_bad_question_sets() {
        assert_eq!(
            QuestionSequencer::new(vec![q("a"), q("a")]).unwrap_err(),
            SequenceError::DuplicateId("a".into())
        );
        let forward = QuestionSequencer::new(vec![
            guarded("a", "b", ConditionOperator::Equals, json!(1)),
            q("b"),
        ]);
        assert!(matches!(forward, Err(SequenceError::InvalidReference { .. })));
        let self_ref =
            QuestionSequencer::new(vec![guarded("a", "a", ConditionOperator::Equals, json!(1))]);
        assert!(self_ref.is_err());
        assert_eq!(QuestionSequencer::new(vec![q(" ")]).unwrap_err(), SequenceError::EmptyId);
    }

    #[test]
    fn test_check_answerable() {
        let seq = employment_flow();
        let a = answers(&[("employed", json!("yes"))]);
        assert!(seq.check_answerable("current_role", &a).is_ok());
        assert_eq!(
            seq.check_answerable("last_role", &a),
            Err(SequenceError::NotApplicable("last_role".into()))
        );
        assert_eq!(
            seq.check_answerable("current_role", &Answers::new()),
            Err(SequenceError::NotApplicable("current_role".into()))
        );
        assert!(matches!(
            seq.check_answerable("nope", &a),
            Err(SequenceError::UnknownQuestion(_))
        ));
    }

    #[test]
    fn test_prune_answers_drops_abandoned_branch() {
        let seq = QuestionSequencer::new(vec![
            q("employed"),
            guarded("manager", "employed", ConditionOperator::Equals, json!("yes")),
            guarded("team_size", "manager", ConditionOperator::Equals, json!("yes")),
            q("skills"),
        ])
        .unwrap();
        let mut a = answers(&[
            ("employed", json!("no")),
            ("manager", json!("yes")),
            ("team_size", json!(8)),
            ("skills", json!("Go")),
        ]);
        assert_eq!(seq.prune_answers(&mut a), vec!["manager", "team_size"]);
        assert_eq!(a.keys().collect::<Vec<_>>(), vec!["employed", "skills"]);
        assert!(seq.prune_answers(&mut a).is_empty());
        assert_eq!(seq.progress(&a), 100);
    }

    #[test]
    fn test_empty_question_set_is_complete() {
        let seq = QuestionSequencer::new(vec![]).unwrap();
        assert!(seq.next_question(&Answers::new()).is_none());
        assert_eq!(seq.progress(&Answers::new()), 100);
    }
}
