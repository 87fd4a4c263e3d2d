//! In-memory view of a stored interview session.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::sequencer::{
    Answers, GuardState, InterviewQuestion, QuestionSequencer, SequenceError,
};
use crate::models::interview::InterviewSessionRow;

pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InterviewMode {
    #[default]
    Text,
    Voice,
    Realtime,
}

impl InterviewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewMode::Text => "text",
            InterviewMode::Voice => "voice",
            InterviewMode::Realtime => "realtime",
        }
    }
}

impl FromStr for InterviewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(InterviewMode::Text),
            "voice" => Ok(InterviewMode::Voice),
            "realtime" => Ok(InterviewMode::Realtime),
            other => Err(format!(
                "Unknown interview mode '{other}'. Valid: text, voice, realtime"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// One utterance captured by the realtime bridge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Client-facing snapshot of a session.
#[derive(Debug, Serialize)]
pub struct SessionState {
    pub id: Uuid,
    pub interview_type: String,
    pub mode: String,
    pub status: String,
    pub progress: u8,
    pub completed: bool,
    pub next_question: Option<InterviewQuestion>,
    pub answers: Answers,
    pub transcript: Vec<TranscriptEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

fn corrupt(id: Uuid, what: &str, e: impl std::fmt::Display) -> AppError {
    AppError::Internal(anyhow::anyhow!("interview session {id} has invalid {what}: {e}"))
}

#[derive(Debug)]
pub struct InterviewSession {
    pub row: InterviewSessionRow,
    pub sequencer: QuestionSequencer,
    pub answers: Answers,
    pub transcript: Vec<TranscriptEntry>,
}

impl InterviewSession {
    pub fn from_row(row: InterviewSessionRow) -> Result<Self, AppError> {
        let questions: Vec<InterviewQuestion> =
            serde_json::from_value(row.questions.clone()).map_err(|e| corrupt(row.id, "questions", e))?;
        let sequencer =
            QuestionSequencer::new(questions).map_err(|e| corrupt(row.id, "questions", e))?;
        let answers: Answers =
            serde_json::from_value(row.answers.clone()).map_err(|e| corrupt(row.id, "answers", e))?;
        let transcript: Vec<TranscriptEntry> = serde_json::from_value(row.transcript.clone())
            .map_err(|e| corrupt(row.id, "transcript", e))?;
        Ok(Self {
            row,
            sequencer,
            answers,
            transcript,
        })
    }

    pub fn progress(&self) -> u8 {
        self.sequencer.progress(&self.answers)
    }

    pub fn next_question(&self) -> Option<&InterviewQuestion> {
        self.sequencer.next_question(&self.answers)
    }

    pub fn is_complete(&self) -> bool {
        self.sequencer.is_complete(&self.answers)
    }

    /// Question to read aloud. Only voice sessions have spoken questions.
    pub fn spoken_question(&self) -> Result<&InterviewQuestion, AppError> {
        if self.row.mode != InterviewMode::Voice.as_str() {
            return Err(AppError::Validation(format!(
                "Interview {} is a {} interview; question audio needs voice mode",
                self.row.id, self.row.mode
            )));
        }
        self.next_question().ok_or_else(|| {
            AppError::NotFound(format!("Interview {} has no remaining questions", self.row.id))
        })
    }

    /// Records an answer after checking that the question applies. Answers
    /// invalidated by a changed parent answer are dropped; their ids are
    /// returned.
    pub fn record_answer(
        &mut self,
        question_id: &str,
        answer: Value,
    ) -> Result<Vec<String>, AppError> {
        let blank = match &answer {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        };
        if blank {
            return Err(AppError::Validation("answer cannot be empty".to_string()));
        }
        if self.row.status == STATUS_COMPLETED {
            return Err(AppError::Validation(format!(
                "Interview {} is already completed",
                self.row.id
            )));
        }
        self.sequencer
            .check_answerable(question_id, &self.answers)
            .map_err(|e| match e {
                SequenceError::UnknownQuestion(_) => AppError::NotFound(e.to_string()),
                _ => AppError::Validation(e.to_string()),
            })?;
        let answer = match answer {
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other,
        };
        self.answers.insert(question_id.to_string(), answer);
        Ok(self.sequencer.prune_answers(&mut self.answers))
    }

    pub fn state(&self) -> SessionState {
        let completed = self.is_complete();
        SessionState {
            id: self.row.id,
            interview_type: self.row.interview_type.clone(),
            mode: self.row.mode.clone(),
            status: if completed {
                STATUS_COMPLETED.to_string()
            } else {
                self.row.status.clone()
            },
            progress: self.progress(),
            completed,
            next_question: self.next_question().cloned(),
            answers: self.answers.clone(),
            transcript: self.transcript.clone(),
            created_at: self.row.created_at,
            updated_at: self.row.updated_at,
            completed_at: self.row.completed_at,
        }
    }

    /// Plain-text transcript for profile extraction: answered questions in
    /// question order, then any realtime conversation. Answers on branches
    /// that no longer apply are left out.
    pub fn transcript_text(&self) -> String {
        let mut out = String::new();
        let states = self.sequencer.guard_states(&self.answers);
        for (question, state) in self.sequencer.questions().iter().zip(states) {
            if state != GuardState::Satisfied {
                continue;
            }
            if let Some(answer) = self.answers.get(&question.id) {
                let answer = match answer {
                    Value::String(s) => s.clone(),
                    Value::Array(items) => items
                        .iter()
                        .map(|v| v.as_str().map(String::from).unwrap_or_else(|| v.to_string()))
                        .collect::<Vec<_>>()
                        .join(", "),
                    other => other.to_string(),
                };
                out.push_str(&format!("Interviewer: {}\nCandidate: {}\n\n", question.text, answer));
            }
        }
        for entry in &self.transcript {
            let who = match entry.speaker {
                Speaker::User => "Candidate",
                Speaker::Assistant => "Interviewer",
            };
            out.push_str(&format!("{who}: {}\n", entry.text.trim()));
        }
        out.trim_end().to_string()
    }
}
