//! Per-turn command interpretation.
//!
//! The interpreter runs exactly once per turn, before any completion call,
//! so that its decision determines which phase handler executes.

use crate::phase::QuizPhase;

/// Synonyms for "start over". Matched anywhere in the input, any phase.
const RESET_KEYWORDS: &[&str] = &["새로", "리셋", "reset", "다시", "처음"];

/// Synonyms for "next question". Only honored from `Complete`.
const ADVANCE_KEYWORDS: &[&str] = &["다음", "계속", "next", "continue", "더"];

/// The forced transition requested by the user's message, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnCommand {
    /// Unconditionally reinitialize the session to `Setup`.
    Reset,
    /// Move from `Complete` back to `Questioning` for another round.
    Advance,
    /// No recognized keyword; normal phase routing applies.
    Pass,
}

/// Inspects free-text input for reset/advance keywords.
///
/// Reset takes priority over advance and overrides phase-based routing
/// entirely; advance is ignored unless the session is in `Complete`.
pub fn interpret(input: &str, phase: QuizPhase) -> TurnCommand {
    let lowered = input.to_lowercase();
    if RESET_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        return TurnCommand::Reset;
    }
    if phase == QuizPhase::Complete && ADVANCE_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        return TurnCommand::Advance;
    }
    TurnCommand::Pass
}
