//! Quizflow Core Library
//!
//! This crate contains the dialogue engine for the Teacher-Student quiz:
//! the phase state machine, the per-turn command interpreter, the session
//! store, the completion-client abstraction, the prompt library, and the
//! LLM-as-judge reward evaluator used by the trainer.

pub mod command;
pub mod engine;
pub mod judge;
pub mod llm_client;
pub mod phase;
pub mod prompts;
pub mod session;
pub mod store;
