//! Property graph over relational tables, plus projection of the profile
//! into it.

pub mod handlers;
pub mod models;
pub mod repository;
pub mod sync;
