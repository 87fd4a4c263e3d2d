use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::profile::models::{
    AchievementInput, EducationInput, ExperienceInput, ProjectInput, SkillInput,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

const MAX_GPA: f64 = 10.0;

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn require(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if is_blank(value) {
        errors.push(FieldError::new(field, "is required"));
    }
}

/// Validates an experience entry.
///
/// Requires company, position and start date. An end date must not precede
/// the start date, and a current position cannot carry an end date.
pub fn validate_experience(input: &ExperienceInput) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require(&mut errors, "company", &input.company);
    require(&mut errors, "position", &input.position);
    match (input.start_date, input.end_date) {
        (None, _) => errors.push(FieldError::new("start_date", "is required")),
        (Some(start), Some(end)) if end < start => {
            errors.push(FieldError::new("end_date", "must not be before start_date"))
        }
        _ => {}
    }
    if input.is_current && input.end_date.is_some() {
        errors.push(FieldError::new(
            "end_date",
            "must be empty for a current position",
        ));
    }
    errors
}

pub fn validate_skill(input: &SkillInput) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require(&mut errors, "name", &input.name);
    if !(1..=5).contains(&input.proficiency_level) {
        errors.push(FieldError::new(
            "proficiency_level",
            "must be between 1 and 5",
        ));
    }
    if input.years_experience.is_some_and(|y| y < 0.0 || y.is_nan()) {
        errors.push(FieldError::new("years_experience", "must not be negative"));
    }
    errors
}

pub fn validate_education(input: &EducationInput) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require(&mut errors, "institution", &input.institution);
    require(&mut errors, "degree", &input.degree);
    if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
        if end < start {
            errors.push(FieldError::new("end_date", "must not be before start_date"));
        }
    }
    if input
        .gpa
        .is_some_and(|gpa| !(0.0..=MAX_GPA).contains(&gpa))
    {
        errors.push(FieldError::new("gpa", "must be between 0.0 and 10.0"));
    }
    errors
}

pub fn validate_project(input: &ProjectInput) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require(&mut errors, "title", &input.title);
    if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
        if end < start {
            errors.push(FieldError::new("end_date", "must not be before start_date"));
        }
    }
    errors
}

pub fn validate_achievement(input: &AchievementInput) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require(&mut errors, "title", &input.title);
    errors
}

/// Joins field errors into a single `AppError::Validation`, or passes when empty.
pub fn ensure_valid(errors: Vec<FieldError>) -> Result<(), AppError> {
    if errors.is_empty() {
        return Ok(());
    }
    let message = errors
        .iter()
        .map(|e| format!("{} {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");
    Err(AppError::Validation(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn valid_experience() -> ExperienceInput {
        ExperienceInput {
            company: "Acme".into(),
            position: "Engineer".into(),
            start_date: date(2020, 1, 1),
            end_date: date(2022, 6, 30),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_experience_passes() {
        assert!(validate_experience(&valid_experience()).is_empty());
    }

    #[test]
    fn test_blank_required_fields_are_all_reported() {
        let input = ExperienceInput {
            company: "   ".into(),
            ..Default::default()
        };
        let fields: Vec<_> = validate_experience(&input)
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["company", "position", "start_date"]);
    }

    #[test]
    fn test_end_before_start_rejected() {
        let input = ExperienceInput {
            end_date: date(2019, 1, 1),
            ..valid_experience()
        };
        assert_eq!(validate_experience(&input)[0].field, "end_date");
    }

    #[test]
    fn test_current_position_with_end_date_rejected() {
        let input = ExperienceInput {
            is_current: true,
            ..valid_experience()
        };
        assert_eq!(validate_experience(&input).len(), 1);
    }

    #[test]
    fn test_skill_proficiency_bounds() {
        let mut input = SkillInput {
            name: "Rust".into(),
            ..Default::default()
        };
        assert!(validate_skill(&input).is_empty());
        input.proficiency_level = 0;
        assert_eq!(validate_skill(&input)[0].field, "proficiency_level");
        input.proficiency_level = 6;
        assert_eq!(validate_skill(&input).len(), 1);
    }

    #[test]
    fn test_negative_years_rejected() {
        let input = SkillInput {
            name: "Go".into(),
            years_experience: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(validate_skill(&input)[0].field, "years_experience");
    }

    #[test]
    fn test_education_requires_institution_and_degree() {
        let errors = validate_education(&EducationInput::default());
        assert_eq!(errors.len(), 2);

        let input = EducationInput {
            institution: "MIT".into(),
            degree: "BSc".into(),
            gpa: Some(11.0),
            ..Default::default()
        };
        assert_eq!(validate_education(&input)[0].field, "gpa");
    }

    #[test]
    fn test_project_and_achievement_require_title() {
        assert_eq!(validate_project(&ProjectInput::default()).len(), 1);
        assert_eq!(validate_achievement(&AchievementInput::default()).len(), 1);
    }

    #[test]
    fn test_ensure_valid_joins_messages() {
        let err = ensure_valid(validate_experience(&ExperienceInput::default())).unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("company is required"));
                assert!(msg.contains("start_date is required"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(ensure_valid(vec![]).is_ok());
    }
}
