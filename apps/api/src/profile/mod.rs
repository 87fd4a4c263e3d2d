// Profile data: the five résumé sections, their validation, completeness
// scoring and summaries. Extracted data from documents and interviews is
// written through `import`.

pub mod completeness;
pub mod handlers;
pub mod import;
pub mod models;
pub mod prompts;
pub mod repository;
pub mod summary;
pub mod validation;
