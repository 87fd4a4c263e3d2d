// Document upload, storage and processing into parsed résumés.

pub mod handlers;
pub mod storage;
pub mod text;
pub mod validation;
