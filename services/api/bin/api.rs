//! Main Entrypoint for the Quizflow API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing the prompt library and chat-completion client.
//! 3. Constructing the Axum router and applying middleware.
//! 4. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use quizflow_api::{
    config::{Config, Provider},
    router::create_router,
    state::AppState,
};
use quizflow_core::{
    engine::QuizEngine,
    llm_client::OpenAICompatibleClient,
    prompts::PromptLibrary,
    store::MemorySessionStore,
};
use std::{fs, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Prompts ---
    let mut prompts = if config.prompts_path.is_dir() {
        PromptLibrary::from_dir(&config.prompts_path)
            .with_context(|| format!("Failed to load prompts from {:?}", config.prompts_path))?
    } else {
        warn!(
            path = ?config.prompts_path,
            "Prompts directory not found; using built-in templates"
        );
        PromptLibrary::builtin()
    };

    if let Some(path) = &config.student_prompt_path {
        let optimized = fs::read_to_string(path)
            .with_context(|| format!("Failed to read optimized student prompt from {:?}", path))?;
        prompts.override_student_answer(optimized);
        info!(path = ?path, "Loaded optimized student prompt");
    }

    // --- 4. Initialize Shared Services ---
    let openai_config = match &config.provider {
        Provider::OpenAI => {
            info!("Using OpenAI provider.");
            let api_key = config.openai_api_key.as_ref().unwrap();
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base("https://api.openai.com/v1/")
        }
        Provider::Gemini => {
            info!("Using Gemini provider.");
            let api_key = config.gemini_api_key.as_ref().unwrap();
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base("https://generativelanguage.googleapis.com/v1beta/openai")
        }
    };
    let client = Arc::new(OpenAICompatibleClient::new(
        openai_config,
        config.chat_model.clone(),
    ));
    let engine = Arc::new(QuizEngine::new(client, prompts));
    let sessions = Arc::new(MemorySessionStore::new(config.session_ttl));

    let app_state = AppState {
        engine: Some(engine),
        sessions,
        config: Arc::new(config.clone()),
    };

    // --- 5. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 6. Start Server ---
    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        bind_address = %config.bind_address,
        session_ttl_secs = config.session_ttl.as_secs(),
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server has shut down.");
    Ok(())
}
