//! Quizflow API Library Crate
//!
//! This library contains all the core logic for the quiz web service:
//! application state, configuration, request handlers, the SSE streaming
//! protocol, and routing. The `api` binary is a thin wrapper around it.

pub mod config;
pub mod handlers;
pub mod models;
pub mod protocol;
pub mod router;
pub mod state;
