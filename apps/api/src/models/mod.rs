pub mod document;
pub mod graph;
pub mod interview;
pub mod profile;
