//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources like the dialogue engine and the session store.

use crate::config::Config;
use quizflow_core::{engine::QuizEngine, store::SessionStore};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers. The engine is `None` until initialization completes; turn
/// requests against an uninitialized engine are answered with 503.
#[derive(Clone)]
pub struct AppState {
    pub engine: Option<Arc<QuizEngine>>,
    pub sessions: Arc<dyn SessionStore>,
    pub config: Arc<Config>,
}
