//! Session state and setup-message parsing.

use crate::phase::QuizPhase;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed subject catalog, scanned in priority order during setup parsing.
/// The first catalog entry found in the user's message wins.
pub const SUBJECT_CATALOG: &[&str] = &[
    "수학",
    "과학",
    "역사",
    "영어",
    "일반상식",
    "프로그래밍",
    "지리",
];

/// Quiz difficulty bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Matches a difficulty keyword anywhere in the (already lowercased) input.
    fn from_input(input: &str) -> Option<Self> {
        if input.contains("쉬움") || input.contains("쉬운") || input.contains("easy") {
            Some(Difficulty::Easy)
        } else if input.contains("보통") || input.contains("중간") || input.contains("medium") {
            Some(Difficulty::Medium)
        } else if input.contains("어려움") || input.contains("어려운") || input.contains("hard")
        {
            Some(Difficulty::Hard)
        } else {
            None
        }
    }

    /// Maps a dataset difficulty label (e.g. "쉬움") to a bucket. Labels
    /// outside the three buckets (the trap questions use "함정") return `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "쉬움" => Some(Difficulty::Easy),
            "보통" => Some(Difficulty::Medium),
            "어려움" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Easy => "쉬움",
            Difficulty::Medium => "보통",
            Difficulty::Hard => "어려움",
        };
        write!(f, "{}", label)
    }
}

/// The per-session dialogue state.
///
/// Owned by the session store; the engine only ever works on a transient
/// copy for the duration of one turn. `difficulty` and `subject` are both
/// set or both unset: the state machine cannot leave `Setup` until the setup
/// handler has resolved both from one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSession {
    pub phase: QuizPhase,
    pub difficulty: Option<Difficulty>,
    pub subject: Option<String>,
    pub current_question: Option<String>,
    pub student_answer: Option<String>,
    pub round_count: u32,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self {
            phase: QuizPhase::Setup,
            difficulty: None,
            subject: None,
            current_question: None,
            student_answer: None,
            round_count: 0,
        }
    }
}

impl QuizSession {
    /// Reinitializes the session to a fresh `Setup` state.
    pub fn reset(&mut self) {
        *self = QuizSession::default();
    }
}

/// Extracts a difficulty and a subject from a free-text setup message.
///
/// Case-insensitive substring matching against fixed keyword tables. Either
/// axis may be absent; the setup handler stays in `Setup` until both resolve.
pub fn parse_setup(input: &str) -> (Option<Difficulty>, Option<String>) {
    let lowered = input.to_lowercase();
    let difficulty = Difficulty::from_input(&lowered);
    let subject = SUBJECT_CATALOG
        .iter()
        .find(|s| input.contains(*s))
        .map(|s| s.to_string());
    (difficulty, subject)
}
