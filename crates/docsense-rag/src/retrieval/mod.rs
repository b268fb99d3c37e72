//! Retrieval and answer gating

pub mod engine;

pub use engine::AnswerEngine;
