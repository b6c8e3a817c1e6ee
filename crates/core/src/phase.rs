//! The phases of the quiz dialogue protocol and the nodes that execute them.

use serde::{Deserialize, Serialize};

/// A stage of the quiz dialogue protocol.
///
/// The protocol advances `Setup → Questioning → Answering → Evaluating →
/// Complete`. `Complete` only exits through the command interpreter: a reset
/// keyword returns to `Setup`, an advance keyword returns to `Questioning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhase {
    /// Waiting for the user to pick a difficulty and a subject.
    Setup,
    /// The Teacher agent poses a question.
    Questioning,
    /// The Student agent answers the question.
    Answering,
    /// The Teacher agent evaluates the answer.
    Evaluating,
    /// One round finished; awaiting a reset or advance command.
    Complete,
}

/// Identifies which phase handler produced a message within a turn.
///
/// Node identifiers are the wire names used by the streaming protocol; the
/// human-readable label sits next to the content in [`crate::engine::PhaseMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnNode {
    Setup,
    TeacherQuestion,
    StudentAnswer,
    TeacherEvaluate,
}

impl TurnNode {
    /// Wire name of the node, as used in streamed events.
    pub fn name(&self) -> &'static str {
        match self {
            TurnNode::Setup => "setup",
            TurnNode::TeacherQuestion => "teacher_question",
            TurnNode::StudentAnswer => "student_answer",
            TurnNode::TeacherEvaluate => "teacher_evaluate",
        }
    }
}
