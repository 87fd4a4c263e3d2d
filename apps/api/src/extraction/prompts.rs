// Profile extraction prompt templates.

pub const EXTRACTION_SYSTEM: &str = "\
You are a precise résumé data extractor. \
You MUST respond with a single valid JSON object only, with no markdown fences, no explanations. \
Only extract facts stated in the source. Never invent employers, dates or numbers. \
Omit any field you cannot find instead of guessing.";

pub const EXTRACTION_PROMPT: &str = r#"Extract the structured career profile contained in the source below.

SOURCE ({source_kind}):
{source_text}

OUTPUT SCHEMA (return exactly this structure, use empty arrays for missing sections):
{
  "experiences": [{"company": "string", "position": "string", "location": "string" | null,
                   "start_date": "YYYY-MM-DD" | null, "end_date": "YYYY-MM-DD" | null,
                   "is_current": boolean, "description": "string" | null,
                   "achievements": ["string"]}],
  "skills": [{"name": "string", "category": "string" | null,
              "proficiency_level": 1-5, "years_experience": number | null}],
  "education": [{"institution": "string", "degree": "string", "field_of_study": "string" | null,
                 "start_date": "YYYY-MM-DD" | null, "end_date": "YYYY-MM-DD" | null,
                 "gpa": number | null, "description": "string" | null}],
  "projects": [{"title": "string", "description": "string" | null, "technologies": ["string"],
                "start_date": "YYYY-MM-DD" | null, "end_date": "YYYY-MM-DD" | null,
                "project_url": "string" | null, "repository_url": "string" | null}],
  "achievements": [{"title": "string", "description": "string" | null, "category": "string" | null,
                    "issuer": "string" | null, "date_achieved": "YYYY-MM-DD" | null}]
}

RULES:
1. Dates must be "YYYY-MM-DD". Use "YYYY-01-01" if only the year is known.
2. A role described as current ("present", "now") has is_current = true and end_date = null.
3. proficiency_level: 5 expert, 4 advanced, 3 intermediate (default), 2 basic, 1 beginner.
4. Return ONLY the JSON object."#;
