//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the chat endpoints and OpenAPI documentation.

use crate::{
    handlers,
    models::{ChatRequest, ChatResponse, ErrorResponse, HealthResponse},
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::chat, handlers::chat_stream, handlers::health),
    components(schemas(ChatRequest, ChatResponse, HealthResponse, ErrorResponse)),
    tags(
        (name = "Quizflow API", description = "Teacher/Student quiz dialogue endpoints")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: AppState) -> Router {
    // Group all routes that require AppState into their own router.
    let api_router = Router::new()
        .route("/chat", post(handlers::chat))
        .route("/chat/stream", post(handlers::chat_stream))
        .route("/health", get(handlers::health))
        .with_state(app_state);

    // Merge the stateful routes with the stateless Swagger UI routes.
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
