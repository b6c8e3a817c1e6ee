//! Axum Handlers for the Chat API
//!
//! This module contains the batched and streaming dialogue endpoints and the
//! health probe. It uses `utoipa` doc comments to generate OpenAPI docs.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, KeepAliveStream, Sse},
    },
};
use quizflow_core::engine::{QuizEngine, TurnEvent};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, instrument};

use crate::{
    models::{ChatRequest, ChatResponse, ErrorResponse, HealthResponse},
    protocol::StreamEvent,
    state::AppState,
};

/// Deliberate pacing between streamed events so delivery stays perceptible
/// rather than burst-delivered.
const EVENT_PACING: Duration = Duration::from_millis(100);

/// Returned when a turn produced no phase output (e.g. `Complete` without a
/// recognized keyword).
const EMPTY_TURN_FALLBACK: &str = "응답을 생성할 수 없습니다.";

#[derive(Debug)]
pub enum ApiError {
    ServiceUnavailable(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ServiceUnavailable(message) => {
                (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

fn engine_of(state: &AppState) -> Result<Arc<QuizEngine>, ApiError> {
    state
        .engine
        .clone()
        .ok_or_else(|| ApiError::ServiceUnavailable("Engine not initialized".to_string()))
}

/// Execute one dialogue turn and return all output at once.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Turn executed", body = ChatResponse),
        (status = 503, description = "Engine not initialized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(name = "chat", skip_all, fields(session_id))]
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let engine = engine_of(&state)?;

    let (session_id, handle) = state
        .sessions
        .get_or_create(request.session_id.as_deref())
        .await;
    tracing::Span::current().record("session_id", session_id.as_str());

    // Holding the per-session lock across the turn serializes concurrent
    // turns against the same key.
    let mut session = handle.lock().await;
    let outcome = engine.run_turn(session.clone(), request.message.trim()).await?;

    let response = if outcome.messages.is_empty() {
        EMPTY_TURN_FALLBACK.to_string()
    } else {
        outcome
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    *session = outcome.session;

    Ok(Json(ChatResponse {
        response,
        session_id,
    }))
}

/// Execute one dialogue turn, streaming each phase's output as SSE events.
#[utoipa::path(
    post,
    path = "/chat/stream",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "SSE event stream", content_type = "text/event-stream"),
        (status = 503, description = "Engine not initialized", body = ErrorResponse)
    )
)]
#[instrument(name = "chat_stream", skip_all)]
pub async fn chat_stream(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<KeepAliveStream<ReceiverStream<Result<Event, Infallible>>>>, ApiError> {
    let engine = engine_of(&state)?;
    let sessions = state.sessions.clone();
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(16);

    tokio::spawn(async move {
        let (session_id, handle) = sessions.get_or_create(request.session_id.as_deref()).await;
        let mut session = handle.lock().await;
        send_event(&tx, &StreamEvent::Session { session_id }).await;

        let (turn_tx, mut turn_rx) = mpsc::channel::<TurnEvent>(8);
        let snapshot = session.clone();
        let input = request.message.trim().to_string();
        let turn = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.run_turn_with_events(snapshot, &input, turn_tx).await })
        };

        while let Some(event) = turn_rx.recv().await {
            tokio::time::sleep(EVENT_PACING).await;
            match event {
                TurnEvent::Phase(message) => {
                    send_event(
                        &tx,
                        &StreamEvent::NodeStart {
                            node: message.node,
                            label: message.label,
                        },
                    )
                    .await;
                    send_event(
                        &tx,
                        &StreamEvent::Message {
                            node: message.node,
                            content: message.content,
                        },
                    )
                    .await;
                    send_event(&tx, &StreamEvent::NodeEnd { node: message.node }).await;
                }
                TurnEvent::Waiting { message } => {
                    send_event(&tx, &StreamEvent::Waiting { message }).await;
                }
            }
        }

        // The store is only updated from the authoritative post-execution
        // state; a mid-stream failure leaves it untouched.
        match turn.await {
            Ok(Ok(outcome)) => {
                *session = outcome.session;
                info!(phase = ?session.phase, "Turn committed");
            }
            Ok(Err(e)) => {
                error!("Streaming turn failed: {:?}", e);
                send_event(
                    &tx,
                    &StreamEvent::Error {
                        message: e.to_string(),
                    },
                )
                .await;
            }
            Err(e) => {
                error!("Turn task panicked: {:?}", e);
                send_event(
                    &tx,
                    &StreamEvent::Error {
                        message: "turn execution aborted".to_string(),
                    },
                )
                .await;
            }
        }
        send_event(&tx, &StreamEvent::Done).await;
    });

    Ok(Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default()))
}

/// Report whether the dialogue engine is initialized.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service health", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        engine_initialized: state.engine.is_some(),
    })
}

/// Serializes and queues one SSE event. A send failure means the client is
/// gone; delivery stops but the turn still runs to completion.
async fn send_event(tx: &mpsc::Sender<Result<Event, Infallible>>, event: &StreamEvent) {
    match Event::default().json_data(event) {
        Ok(sse) => {
            let _ = tx.send(Ok(sse)).await;
        }
        Err(e) => error!("Failed to serialize stream event: {:?}", e),
    }
}
