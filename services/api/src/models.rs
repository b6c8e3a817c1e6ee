//! API Models
//!
//! Request/response bodies for the chat endpoints, annotated for OpenAPI
//! documentation with `utoipa`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single dialogue turn request, shared by the batched and streaming
/// endpoints. A missing `session_id` means "create a new session".
#[derive(Deserialize, ToSchema, Debug, Clone)]
pub struct ChatRequest {
    #[schema(example = "보통 난이도로 수학 문제 풀래")]
    pub message: String,
    #[schema(value_type = Option<String>)]
    pub session_id: Option<String>,
}

/// The batched turn response: all phase outputs joined together, plus the
/// session key the client must send on its next turn.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: &'static str,
    pub engine_initialized: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_session_id_is_optional() {
        let with: ChatRequest =
            serde_json::from_str(r#"{"message": "다음", "session_id": "abc"}"#).unwrap();
        assert_eq!(with.session_id.as_deref(), Some("abc"));

        let without: ChatRequest = serde_json::from_str(r#"{"message": "다음"}"#).unwrap();
        assert_eq!(without.session_id, None);
    }

    #[test]
    fn chat_request_message_is_required() {
        let result: Result<ChatRequest, _> = serde_json::from_str(r#"{"session_id": "abc"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn chat_response_round_trips() {
        let response = ChatResponse {
            response: "🎓 **퀴즈 설정 완료!**".to_string(),
            session_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        let parsed: ChatResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.response, response.response);
        assert_eq!(parsed.session_id, response.session_id);
    }

    #[test]
    fn error_response_shape() {
        let error = ErrorResponse {
            message: "Engine not initialized".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&error).unwrap(),
            r#"{"message":"Engine not initialized"}"#
        );
    }
}
