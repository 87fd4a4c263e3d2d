//! Built-in interview contexts and their question sets.

use serde::Serialize;
use serde_json::{json, Value};

use crate::interview::sequencer::{ConditionOperator, InterviewQuestion, QuestionCondition};

pub const DEFAULT_INTERVIEW_TYPE: &str = "career_overview";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InterviewContext {
    pub interview_type: String,
    pub title: String,
    pub description: Option<String>,
    pub system_prompt: String,
}

struct BuiltinContext {
    interview_type: &'static str,
    title: &'static str,
    description: &'static str,
    system_prompt: &'static str,
}

const BUILTIN_CONTEXTS: &[BuiltinContext] = &[
    BuiltinContext {
        interview_type: "career_overview",
        title: "Career Overview",
        description: "A broad walk through your experience, education, skills and goals.",
        system_prompt: "You are a friendly career coach interviewing a professional to build their \
career profile. Ask one question at a time, keep questions short, and follow up briefly when an \
answer is vague. Capture concrete facts: job titles, companies, dates, technologies, measurable \
outcomes. Do not give advice during the interview.",
    },
    BuiltinContext {
        interview_type: "technical_deep_dive",
        title: "Technical Deep Dive",
        description: "Dig into the systems, stacks and engineering decisions behind your work.",
        system_prompt: "You are a senior engineer interviewing a peer about their technical work. \
Ask one question at a time. Probe for architecture, scale, trade-offs and the candidate's \
personal contribution. Prefer specifics (languages, services, numbers) over generalities.",
    },
    BuiltinContext {
        interview_type: "career_transition",
        title: "Career Transition",
        description: "Map your transferable skills and plan for moving into a new field.",
        system_prompt: "You are a supportive career coach helping someone move into a new field. \
Ask one question at a time. Focus on transferable skills, training completed, and realistic \
timelines. Keep the tone encouraging and concrete.",
    },
];

pub fn builtin_contexts() -> Vec<InterviewContext> {
    BUILTIN_CONTEXTS
        .iter()
        .map(|c| InterviewContext {
            interview_type: c.interview_type.to_string(),
            title: c.title.to_string(),
            description: Some(c.description.to_string()),
            system_prompt: c.system_prompt.to_string(),
        })
        .collect()
}

pub fn builtin_context(interview_type: &str) -> Option<InterviewContext> {
    builtin_contexts()
        .into_iter()
        .find(|c| c.interview_type == interview_type)
}

fn ask(id: &str, category: &str, text: &str) -> InterviewQuestion {
    InterviewQuestion {
        id: id.to_string(),
        text: text.to_string(),
        category: category.to_string(),
        condition: None,
    }
}

fn when(
    question: InterviewQuestion,
    on: &str,
    operator: ConditionOperator,
    value: Value,
) -> InterviewQuestion {
    InterviewQuestion {
        condition: Some(QuestionCondition {
            question_id: on.to_string(),
            operator,
            value,
        }),
        ..question
    }
}

fn career_overview() -> Vec<InterviewQuestion> {
    use ConditionOperator::*;
    vec![
        ask("currently_employed", "experience", "Are you currently employed? (yes or no)"),
        when(
            ask("current_role", "experience", "What is your current job title, and which company do you work for?"),
            "currently_employed", Equals, json!("yes"),
        ),
        when(
            ask("current_role_years", "experience", "How many years have you been in your current role?"),
            "currently_employed", Equals, json!("yes"),
        ),
        when(
            ask("recent_role", "experience", "What was your most recent role, and when did it end?"),
            "currently_employed", Equals, json!("no"),
        ),
        ask("responsibilities", "experience", "Describe your main responsibilities and what you delivered in that role."),
        ask("total_years", "experience", "How many years of professional experience do you have in total?"),
        when(
            ask("leadership", "experience", "Have you led a team or mentored others? Tell me about it."),
            "total_years", GreaterThan, json!(5),
        ),
        ask("education_level", "education", "What is your highest level of education? Answer 'none' if you have no formal degree."),
        when(
            ask("education_details", "education", "Where did you study, what did you study, and when did you finish?"),
            "education_level", NotEquals, json!("none"),
        ),
        ask("skills", "skills", "Which technical and professional skills are you strongest in?"),
        ask("project", "projects", "Tell me about a project you are proud of. What was it and which technologies did you use?"),
        ask("achievement", "achievements", "What professional achievement, award or certification are you most proud of?"),
        ask("career_goals", "goals", "Where would you like your career to go next?"),
    ]
}

fn technical_deep_dive() -> Vec<InterviewQuestion> {
    use ConditionOperator::*;
    vec![
        ask("primary_stack", "skills", "Which programming languages and technologies do you use most?"),
        when(
            ask("aws_services", "skills", "Which AWS services have you run in production?"),
            "primary_stack", Contains, json!("aws"),
        ),
        ask("system_design", "projects", "Describe the most complex system you have designed or built."),
        ask("scale_users", "projects", "Roughly how many users or requests per day did that system serve?"),
        when(
            ask("scaling", "projects", "What scaling problems did you hit, and how did you solve them?"),
            "scale_users", GreaterThan, json!(100_000),
        ),
        ask("open_source", "projects", "Have you contributed to open-source projects? (yes or no)"),
        when(
            ask("open_source_details", "projects", "Which projects, and what did you contribute?"),
            "open_source", Equals, json!("yes"),
        ),
        ask("learning", "skills", "What technology are you learning right now?"),
    ]
}

fn career_transition() -> Vec<InterviewQuestion> {
    use ConditionOperator::*;
    vec![
        ask("current_field", "experience", "What field do you work in today?"),
        ask("target_field", "goals", "Which field do you want to move into?"),
        ask("transferable_skills", "skills", "Which of your current skills carry over to that field?"),
        ask("has_training", "education", "Have you completed any courses or training for the new field? (yes or no)"),
        when(
            ask("training_details", "education", "Which courses or certifications, and when did you complete them?"),
            "has_training", Equals, json!("yes"),
        ),
        ask("timeline_months", "goals", "In how many months would you like to make the move?"),
        when(
            ask("next_steps", "goals", "What are your concrete next steps over the coming weeks?"),
            "timeline_months", LessThan, json!(6),
        ),
    ]
}

/// Question set for an interview type. Types without a dedicated set (for
/// example contexts only defined in the database) use the career overview.
pub fn questions_for(interview_type: &str) -> Vec<InterviewQuestion> {
    match interview_type {
        "technical_deep_dive" => technical_deep_dive(),
        "career_transition" => career_transition(),
        _ => career_overview(),
    }
}

/// Realtime instructions: the context prompt followed by a topic guide
/// built from the unguarded questions.
pub fn realtime_instructions(context: &InterviewContext) -> String {
    let topics: Vec<String> = questions_for(&context.interview_type)
        .into_iter()
        .filter(|q| q.condition.is_none())
        .enumerate()
        .map(|(i, q)| format!("{}. {}", i + 1, q.text))
        .collect();
    format!(
        "{}\n\nCover these topics in order, adding follow-ups where the answers call for them:\n{}",
        context.system_prompt,
        topics.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::sequencer::{Answers, QuestionSequencer};

    #[test]
    fn test_builtin_question_sets_are_valid() {
        for context in builtin_contexts() {
            let questions = questions_for(&context.interview_type);
            assert!(!questions.is_empty());
            assert!(
                QuestionSequencer::new(questions).is_ok(),
                "invalid set for {}",
                context.interview_type
            );
        }
    }

    #[test]
    fn test_unknown_type_falls_back_to_overview() {
        assert_eq!(questions_for("custom_db_type"), questions_for(DEFAULT_INTERVIEW_TYPE));
        assert!(builtin_context("custom_db_type").is_none());
        assert_eq!(builtin_context("career_transition").unwrap().title, "Career Transition");
    }

    #[test]
    fn test_unemployed_path_skips_current_role() {
        let seq = QuestionSequencer::new(questions_for("career_overview")).unwrap();
        let mut answers = Answers::new();
        answers.insert("currently_employed".into(), json!("No"));
        assert_eq!(seq.next_question(&answers).unwrap().id, "recent_role");
    }

    #[test]
    fn test_realtime_instructions_list_unguarded_topics() {
        let context = builtin_context("career_transition").unwrap();
        let text = realtime_instructions(&context);
        assert!(text.starts_with(&context.system_prompt));
        assert!(text.contains("1. What field do you work in today?"));
        assert!(!text.contains("concrete next steps"));
    }
}
