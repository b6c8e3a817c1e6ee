//! Defines the typed event protocol of the SSE streaming endpoint.

use quizflow_core::phase::TurnNode;
use serde::Serialize;

/// Events emitted on `/chat/stream`, in this structural order per phase:
/// one `session` up front, then for each phase `node_start` / `message` /
/// `node_end` with `waiting` hints in between, and an unconditional `done`
/// at the end (after `error`, if the turn failed).
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Announces the resolved session key before execution starts.
    Session { session_id: String },
    /// A phase handler is about to surface output.
    NodeStart { node: TurnNode, label: String },
    /// A phase handler's full message.
    Message { node: TurnNode, content: String },
    /// The phase handler's output is complete.
    NodeEnd { node: TurnNode },
    /// The next actor is working; shown between phases.
    Waiting { message: String },
    /// The turn failed; the stream ends after this (plus `done`).
    Error { message: String },
    /// Completion sentinel, always the last event.
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_snake_case_type_tags() {
        let event = StreamEvent::Session {
            session_id: "abc".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"type":"session","session_id":"abc"}"#
        );

        let event = StreamEvent::NodeStart {
            node: TurnNode::TeacherQuestion,
            label: "👨‍🏫 Teacher (문제 #1)".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.starts_with(r#"{"type":"node_start","node":"teacher_question""#));

        assert_eq!(
            serde_json::to_string(&StreamEvent::Done).unwrap(),
            r#"{"type":"done"}"#
        );
    }

    #[test]
    fn error_event_carries_message() {
        let event = StreamEvent::Error {
            message: "completion failed".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"type":"error","message":"completion failed"}"#
        );
    }
}
