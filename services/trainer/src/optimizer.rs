//! The prompt-optimization loop.
//!
//! Each round scores a candidate Student prompt over a sampled batch of
//! training tasks with the LLM judge, accepts it when its average reward
//! beats the running best, and records every accepted version in an
//! append-only history. Candidate generation sits behind a trait so the
//! rewrite model is swappable.

use crate::dataset::QuizTask;
use anyhow::{Context, Result};
use async_trait::async_trait;
use quizflow_core::{
    judge::AnswerJudge,
    llm_client::{CompletionClient, chat_messages},
    prompts::PromptLibrary,
};
use rand::seq::index::sample;
use std::sync::Arc;
use tracing::{debug, info, warn};

const REWRITE_INSTRUCTION: &str = "당신은 프롬프트 엔지니어입니다. 아래 Student 시스템 프롬프트를 개선하세요.

목표: Student가 함정 문제를 주의 깊게 읽고 정답을 맞히는 비율을 높이는 것.

규칙:
1. {difficulty}와 {persona} 슬롯은 반드시 그대로 유지하세요
2. 개선된 프롬프트 전문만 출력하세요. 설명은 쓰지 마세요";

/// One scored Student completion during training.
#[derive(Debug, Clone)]
pub struct RolloutSample {
    pub question: String,
    pub expected: String,
    pub produced: Option<String>,
    pub reward: f64,
}

/// An accepted prompt version. Round 0 is the initial prompt; entries are
/// append-only with strictly increasing round numbers.
#[derive(Debug, Clone)]
pub struct PromptRecord {
    pub round: u32,
    pub text: String,
}

/// End-of-run summary of one optimization run.
#[derive(Debug)]
pub struct TrainingReport {
    pub rounds: u32,
    pub rollouts: usize,
    pub best_reward: f64,
    pub best_prompt: String,
    pub history: Vec<PromptRecord>,
}

/// Produces the next candidate prompt from the current best and its failures.
#[async_trait]
pub trait CandidateStrategy: Send + Sync {
    async fn propose(
        &self,
        best_prompt: &str,
        best_reward: f64,
        failures: &[RolloutSample],
    ) -> Result<String>;
}

/// Candidate generation by asking the chat model to rewrite the prompt,
/// grounded in the previous round's failed rollouts.
pub struct LlmRewriteStrategy {
    client: Arc<dyn CompletionClient>,
}

impl LlmRewriteStrategy {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CandidateStrategy for LlmRewriteStrategy {
    async fn propose(
        &self,
        best_prompt: &str,
        best_reward: f64,
        failures: &[RolloutSample],
    ) -> Result<String> {
        let mut digest = String::new();
        for failure in failures {
            digest.push_str(&format!(
                "- 문제: {}\n  정답: {}\n  Student 답변: {}\n",
                failure.question,
                failure.expected,
                failure.produced.as_deref().unwrap_or("[없음]"),
            ));
        }
        let user = format!(
            "현재 프롬프트 (평균 reward {:.2}):\n---\n{}\n---\n\n틀린 문제들:\n{}",
            best_reward,
            best_prompt,
            if digest.is_empty() {
                "(없음)".to_string()
            } else {
                digest
            },
        );
        let messages = chat_messages(REWRITE_INSTRUCTION, &user)?;
        self.client
            .complete(messages)
            .await?
            .map(|text| text.trim().to_string())
            .context("Rewrite completion returned no content")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OptimizerSettings {
    pub rounds: u32,
    pub batch_size: usize,
}

/// Drives rollout scoring and best-candidate tracking.
pub struct PromptOptimizer {
    client: Arc<dyn CompletionClient>,
    judge: AnswerJudge,
    strategy: Arc<dyn CandidateStrategy>,
    prompts: PromptLibrary,
    settings: OptimizerSettings,
}

impl PromptOptimizer {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        judge: AnswerJudge,
        strategy: Arc<dyn CandidateStrategy>,
        prompts: PromptLibrary,
        settings: OptimizerSettings,
    ) -> Self {
        Self {
            client,
            judge,
            strategy,
            prompts,
            settings,
        }
    }

    /// Runs the full loop: a baseline round over the initial prompt, then
    /// `rounds` propose/score/accept iterations.
    pub async fn run(&self, train: &[QuizTask], initial_prompt: String) -> Result<TrainingReport> {
        let mut rollouts = 0;
        let mut history = vec![PromptRecord {
            round: 0,
            text: initial_prompt.clone(),
        }];

        let (mut best_reward, mut failures) =
            self.score_batch(&initial_prompt, train, &mut rollouts).await;
        let mut best_prompt = initial_prompt;
        info!(baseline = best_reward, "Scored initial prompt");

        for round in 1..=self.settings.rounds {
            let candidate = self
                .strategy
                .propose(&best_prompt, best_reward, &failures)
                .await
                .with_context(|| format!("Candidate generation failed in round {}", round))?;
            let (avg, candidate_failures) =
                self.score_batch(&candidate, train, &mut rollouts).await;

            if avg > best_reward {
                info!(round, avg, previous_best = best_reward, "Accepted candidate");
                best_reward = avg;
                best_prompt = candidate.clone();
                history.push(PromptRecord {
                    round,
                    text: candidate,
                });
                failures = candidate_failures;
            } else {
                info!(round, avg, best_reward, "Rejected candidate");
            }
        }

        Ok(TrainingReport {
            rounds: self.settings.rounds,
            rollouts,
            best_reward,
            best_prompt,
            history,
        })
    }

    /// Scores a prompt over every task in the slice, without sampling.
    /// Used for the held-out validation pass at the end of a run.
    pub async fn validate(&self, prompt: &str, tasks: &[QuizTask]) -> f64 {
        if tasks.is_empty() {
            return 0.0;
        }
        let mut total = 0.0;
        for task in tasks {
            total += self.rollout(prompt, task).await.reward;
        }
        total / tasks.len() as f64
    }

    async fn score_batch(
        &self,
        prompt: &str,
        train: &[QuizTask],
        rollouts: &mut usize,
    ) -> (f64, Vec<RolloutSample>) {
        let amount = self.settings.batch_size.min(train.len());
        if amount == 0 {
            return (0.0, Vec::new());
        }
        let mut rng = rand::rng();
        let indices = sample(&mut rng, train.len(), amount);

        let mut total = 0.0;
        let mut failures = Vec::new();
        for index in indices {
            let sample = self.rollout(prompt, &train[index]).await;
            *rollouts += 1;
            total += sample.reward;
            if sample.reward < 1.0 {
                failures.push(sample);
            }
        }
        (total / amount as f64, failures)
    }

    /// One rollout: render the candidate template for the task, complete the
    /// Student answer, judge it. Missing or failed completions score 0.0 and
    /// never abort the round.
    async fn rollout(&self, template: &str, task: &QuizTask) -> RolloutSample {
        let persona = self.prompts.persona_for_label(task.difficulty);
        let system = template
            .replace("{difficulty}", task.difficulty)
            .replace("{persona}", persona);
        let user = format!("문제: {}\n\n이 문제의 정답을 말해주세요.", task.question);

        let produced = match chat_messages(&system, &user) {
            Ok(messages) => match self.client.complete(messages).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(question = %task.question, error = ?e, "Student completion failed");
                    None
                }
            },
            Err(e) => {
                warn!(error = ?e, "Failed to build student messages");
                None
            }
        };

        let reward = match produced.as_deref() {
            Some(answer) => match self
                .judge
                .evaluate(answer.trim(), task.expected_answer, task.question)
                .await
            {
                Ok(reward) => reward,
                Err(e) => {
                    warn!(question = %task.question, error = ?e, "Judge call failed");
                    0.0
                }
            },
            None => 0.0,
        };
        debug!(
            question = %task.question,
            expected = %task.expected_answer,
            reward,
            "Rollout scored"
        );

        RolloutSample {
            question: task.question.to_string(),
            expected: task.expected_answer.to_string(),
            produced,
            reward,
        }
    }
}

/// The seed of the optimization loop: the dialogue Student template plus an
/// explicit answer-format footer the optimizer can sharpen.
pub fn initial_student_prompt(prompts: &PromptLibrary) -> String {
    format!(
        "{}\n\n문제의 난이도: {{difficulty}}\n\n답변 형식:\n- 최종 답을 \"정답은 [답]입니다\" 형식으로 명확히 제시하세요\n- 간결하게 답하세요",
        prompts.student_answer_template().trim_end()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::create_dataset;
    use async_openai::types::ChatCompletionRequestMessage;

    /// Answers "좋은 답" when the rendered system prompt contains the marker,
    /// "나쁜 답" otherwise. Used as the Student client.
    struct MarkerStudent {
        marker: &'static str,
    }

    #[async_trait]
    impl CompletionClient for MarkerStudent {
        async fn complete(
            &self,
            messages: Vec<ChatCompletionRequestMessage>,
        ) -> Result<Option<String>> {
            let rendered = format!("{:?}", messages);
            if rendered.contains(self.marker) {
                Ok(Some("좋은 답".to_string()))
            } else {
                Ok(Some("나쁜 답".to_string()))
            }
        }
    }

    /// Judges "1" iff the rubric contains the good answer.
    struct GoodAnswerJudgeClient;

    #[async_trait]
    impl CompletionClient for GoodAnswerJudgeClient {
        async fn complete(
            &self,
            messages: Vec<ChatCompletionRequestMessage>,
        ) -> Result<Option<String>> {
            let rendered = format!("{:?}", messages);
            Ok(Some(
                if rendered.contains("좋은 답") { "1" } else { "0" }.to_string(),
            ))
        }
    }

    struct FilteredStudent;

    #[async_trait]
    impl CompletionClient for FilteredStudent {
        async fn complete(
            &self,
            _messages: Vec<ChatCompletionRequestMessage>,
        ) -> Result<Option<String>> {
            Ok(None)
        }
    }

    struct FixedStrategy {
        candidate: &'static str,
    }

    #[async_trait]
    impl CandidateStrategy for FixedStrategy {
        async fn propose(
            &self,
            _best_prompt: &str,
            _best_reward: f64,
            _failures: &[RolloutSample],
        ) -> Result<String> {
            Ok(self.candidate.to_string())
        }
    }

    fn optimizer(
        student: Arc<dyn CompletionClient>,
        strategy: Arc<dyn CandidateStrategy>,
        rounds: u32,
    ) -> PromptOptimizer {
        PromptOptimizer::new(
            student,
            AnswerJudge::new(Arc::new(GoodAnswerJudgeClient)),
            strategy,
            PromptLibrary::builtin(),
            OptimizerSettings {
                rounds,
                batch_size: 4,
            },
        )
    }

    #[tokio::test]
    async fn improving_candidate_becomes_new_best() {
        let opt = optimizer(
            Arc::new(MarkerStudent { marker: "개선" }),
            Arc::new(FixedStrategy {
                candidate: "개선된 프롬프트 {difficulty} {persona}",
            }),
            1,
        );
        let report = opt
            .run(&create_dataset(), "기본 프롬프트 {difficulty} {persona}".to_string())
            .await
            .unwrap();

        assert_eq!(report.best_reward, 1.0);
        assert!(report.best_prompt.contains("개선"));
        assert_eq!(report.history.len(), 2);
        assert_eq!(report.history[0].round, 0);
        assert_eq!(report.history[1].round, 1);
        assert_eq!(report.rollouts, 8);
    }

    #[tokio::test]
    async fn worse_candidate_is_rejected_and_history_untouched() {
        // The initial prompt carries the marker; the candidate does not.
        let opt = optimizer(
            Arc::new(MarkerStudent { marker: "기본" }),
            Arc::new(FixedStrategy {
                candidate: "개선 시도 {difficulty} {persona}",
            }),
            2,
        );
        let report = opt
            .run(&create_dataset(), "기본 프롬프트 {difficulty} {persona}".to_string())
            .await
            .unwrap();

        assert_eq!(report.best_reward, 1.0);
        assert!(report.best_prompt.contains("기본"));
        assert_eq!(report.history.len(), 1);
        assert_eq!(report.rollouts, 12);
    }

    #[tokio::test]
    async fn filtered_student_output_scores_zero_without_aborting() {
        let opt = optimizer(
            Arc::new(FilteredStudent),
            Arc::new(FixedStrategy { candidate: "후보" }),
            0,
        );
        let report = opt
            .run(&create_dataset(), "초기 프롬프트".to_string())
            .await
            .unwrap();

        assert_eq!(report.best_reward, 0.0);
        assert_eq!(report.rollouts, 4);
        assert_eq!(report.history.len(), 1);
    }

    #[tokio::test]
    async fn validation_scores_every_task() {
        let opt = optimizer(
            Arc::new(MarkerStudent { marker: "기본" }),
            Arc::new(FixedStrategy { candidate: "후보" }),
            0,
        );
        let tasks = create_dataset();
        let score = opt.validate("기본 프롬프트", &tasks[..6]).await;
        assert_eq!(score, 1.0);
    }

    #[test]
    fn initial_prompt_keeps_template_slots() {
        let prompt = initial_student_prompt(&PromptLibrary::builtin());
        assert!(prompt.contains("{persona}"));
        assert!(prompt.contains("{difficulty}"));
        assert!(prompt.contains("정답은 [답]입니다"));
    }
}
