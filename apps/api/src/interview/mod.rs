pub mod handlers;
pub mod question_bank;
pub mod repository;
pub mod sequencer;
pub mod session;
