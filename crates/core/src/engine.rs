//! The dialogue orchestrator.
//!
//! One turn takes the session's resolved entry phase and executes phase
//! handlers until the protocol next awaits user input: an unresolved `Setup`
//! stops at the guide message, while a setup-completing or advance message
//! drives `Questioning → Answering → Evaluating → Complete` automatically,
//! issuing up to three completion calls in sequence.

use crate::{
    command::{self, TurnCommand},
    llm_client::{CompletionClient, chat_messages},
    phase::{QuizPhase, TurnNode},
    prompts::PromptLibrary,
    session::{Difficulty, QuizSession, parse_setup},
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, instrument};

/// One phase handler's output within a turn.
#[derive(Debug, Clone)]
pub struct PhaseMessage {
    pub node: TurnNode,
    pub label: String,
    pub content: String,
}

/// Events surfaced during incremental delivery, in production order.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// A phase handler finished and produced a message.
    Phase(PhaseMessage),
    /// A hint that the next actor is working, shown between phases.
    Waiting { message: String },
}

/// The result of one fully-executed turn. The caller commits `session` back
/// to the store only after the turn completes.
#[derive(Debug)]
pub struct TurnOutcome {
    pub messages: Vec<PhaseMessage>,
    pub session: QuizSession,
}

const DEFAULT_SUBJECT: &str = "일반상식";

const GUIDE_MESSAGE: &str = "🎓 **Teacher-Student 퀴즈에 오신 것을 환영합니다!**

퀴즈를 시작하려면 **난이도**와 **영역**을 알려주세요.

📊 **난이도**: 쉬움 / 보통 / 어려움
📚 **영역**: 수학 / 과학 / 역사 / 영어 / 일반상식 / 프로그래밍 / 지리

예시: \"보통 난이도로 수학 문제 풀래\" 또는 \"쉬운 역사 퀴즈\"";

const EVALUATE_FOOTER: &str = "---
💡 *다음 문제를 원하시면 '다음' 또는 '계속'을 입력하세요.*
*새로운 설정을 원하시면 '새로 시작'을 입력하세요.*";

/// Composes the command interpreter, the phase state machine, and the
/// completion client into per-turn execution.
pub struct QuizEngine {
    client: Arc<dyn CompletionClient>,
    prompts: PromptLibrary,
}

impl QuizEngine {
    pub fn new(client: Arc<dyn CompletionClient>, prompts: PromptLibrary) -> Self {
        Self { client, prompts }
    }

    /// Executes a turn in batched mode: all messages are collected and
    /// returned together.
    pub async fn run_turn(&self, session: QuizSession, input: &str) -> Result<TurnOutcome> {
        self.drive(session, input, None).await
    }

    /// Executes a turn in incremental mode: each phase handler's output is
    /// sent through `events` as soon as it is produced, interleaved with
    /// waiting hints. The returned outcome carries the authoritative
    /// post-turn state; a dropped receiver does not abort execution.
    pub async fn run_turn_with_events(
        &self,
        session: QuizSession,
        input: &str,
        events: mpsc::Sender<TurnEvent>,
    ) -> Result<TurnOutcome> {
        self.drive(session, input, Some(&events)).await
    }

    #[instrument(name = "quiz_turn", skip_all, fields(entry_phase = ?session.phase))]
    async fn drive(
        &self,
        mut session: QuizSession,
        input: &str,
        events: Option<&mpsc::Sender<TurnEvent>>,
    ) -> Result<TurnOutcome> {
        let mut messages = Vec::new();

        // The interpreter runs exactly once, before any completion call.
        match command::interpret(input, session.phase) {
            TurnCommand::Reset => {
                info!("Reset command received, reinitializing session");
                session.reset();
            }
            TurnCommand::Advance => {
                info!("Advance command received, starting next round");
                session.phase = QuizPhase::Questioning;
            }
            TurnCommand::Pass => {}
        }

        loop {
            match session.phase {
                QuizPhase::Setup => {
                    let proceed = self
                        .handle_setup(&mut session, input, &mut messages, events)
                        .await;
                    if !proceed {
                        break;
                    }
                }
                QuizPhase::Questioning => {
                    self.handle_teacher_question(&mut session, &mut messages, events)
                        .await?;
                }
                QuizPhase::Answering => {
                    self.handle_student_answer(&mut session, &mut messages, events)
                        .await?;
                }
                QuizPhase::Evaluating => {
                    self.handle_teacher_evaluate(&mut session, &mut messages, events)
                        .await?;
                }
                // Terminal for this turn: a reset or advance keyword in a
                // later message is the only way forward.
                QuizPhase::Complete => break,
            }
        }

        Ok(TurnOutcome { messages, session })
    }

    /// Parses difficulty/subject from the input. Returns `true` when setup
    /// resolved and automatic execution should continue into `Questioning`.
    async fn handle_setup(
        &self,
        session: &mut QuizSession,
        input: &str,
        messages: &mut Vec<PhaseMessage>,
        events: Option<&mpsc::Sender<TurnEvent>>,
    ) -> bool {
        let (difficulty, subject) = parse_setup(input);
        if let (Some(difficulty), Some(subject)) = (difficulty, subject) {
            let content = format!(
                "🎓 **퀴즈 설정 완료!**\n\n📊 난이도: {}\n📚 영역: {}\n\n이제 Teacher가 문제를 출제합니다!",
                difficulty, subject
            );
            session.difficulty = Some(difficulty);
            session.subject = Some(subject);
            session.round_count = 0;
            session.phase = QuizPhase::Questioning;
            emit(
                events,
                messages,
                PhaseMessage {
                    node: TurnNode::Setup,
                    label: "🎓 퀴즈 설정".to_string(),
                    content,
                },
            )
            .await;
            emit_waiting(events, "👨‍🏫 Teacher가 문제를 준비 중...").await;
            true
        } else {
            emit(
                events,
                messages,
                PhaseMessage {
                    node: TurnNode::Setup,
                    label: "🎓 퀴즈 설정".to_string(),
                    content: GUIDE_MESSAGE.to_string(),
                },
            )
            .await;
            false
        }
    }

    async fn handle_teacher_question(
        &self,
        session: &mut QuizSession,
        messages: &mut Vec<PhaseMessage>,
        events: Option<&mpsc::Sender<TurnEvent>>,
    ) -> Result<()> {
        let difficulty = session.difficulty.unwrap_or(Difficulty::Medium);
        let subject = session
            .subject
            .clone()
            .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
        session.round_count += 1;

        let (system, user) =
            self.prompts
                .teacher_question_messages(difficulty, &subject, session.round_count);
        let question = self.complete_text(&system, &user).await?;

        let label = format!("👨‍🏫 Teacher (문제 #{})", session.round_count);
        let content = format!("**{}**\n\n{}", label, question);
        session.current_question = Some(question);
        session.phase = QuizPhase::Answering;
        emit(
            events,
            messages,
            PhaseMessage {
                node: TurnNode::TeacherQuestion,
                label,
                content,
            },
        )
        .await;
        emit_waiting(events, "🧑‍🎓 Student가 생각 중...").await;
        Ok(())
    }

    async fn handle_student_answer(
        &self,
        session: &mut QuizSession,
        messages: &mut Vec<PhaseMessage>,
        events: Option<&mpsc::Sender<TurnEvent>>,
    ) -> Result<()> {
        let difficulty = session.difficulty.unwrap_or(Difficulty::Medium);
        let question = session.current_question.clone().unwrap_or_default();

        let (system, user) = self.prompts.student_answer_messages(difficulty, &question);
        let answer = self.complete_text(&system, &user).await?;

        let content = format!("🧑‍🎓 **Student**\n\n{}", answer);
        session.student_answer = Some(answer);
        session.phase = QuizPhase::Evaluating;
        emit(
            events,
            messages,
            PhaseMessage {
                node: TurnNode::StudentAnswer,
                label: "🧑‍🎓 Student".to_string(),
                content,
            },
        )
        .await;
        emit_waiting(events, "👨‍🏫 Teacher가 평가 중...").await;
        Ok(())
    }

    async fn handle_teacher_evaluate(
        &self,
        session: &mut QuizSession,
        messages: &mut Vec<PhaseMessage>,
        events: Option<&mpsc::Sender<TurnEvent>>,
    ) -> Result<()> {
        let question = session.current_question.clone().unwrap_or_default();
        let answer = session.student_answer.clone().unwrap_or_default();

        let (system, user) = self.prompts.teacher_evaluate_messages(&question, &answer);
        let feedback = self.complete_text(&system, &user).await?;

        let content = format!(
            "👨‍🏫 **Teacher (평가)**\n\n{}\n\n{}",
            feedback, EVALUATE_FOOTER
        );
        session.phase = QuizPhase::Complete;
        emit(
            events,
            messages,
            PhaseMessage {
                node: TurnNode::TeacherEvaluate,
                label: "👨‍🏫 Teacher (평가)".to_string(),
                content,
            },
        )
        .await;
        Ok(())
    }

    async fn complete_text(&self, system: &str, user: &str) -> Result<String> {
        let request = chat_messages(system, user)?;
        self.client
            .complete(request)
            .await?
            .context("Completion returned no content")
    }
}

async fn emit(
    events: Option<&mpsc::Sender<TurnEvent>>,
    messages: &mut Vec<PhaseMessage>,
    message: PhaseMessage,
) {
    if let Some(tx) = events {
        // A dropped receiver only stops delivery, never the turn itself.
        let _ = tx.send(TurnEvent::Phase(message.clone())).await;
    }
    messages.push(message);
}

async fn emit_waiting(events: Option<&mpsc::Sender<TurnEvent>>, message: &str) {
    if let Some(tx) = events {
        let _ = tx
            .send(TurnEvent::Waiting {
                message: message.to_string(),
            })
            .await;
    }
}
