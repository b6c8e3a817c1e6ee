//! LLM-as-judge reward evaluation.

use crate::llm_client::{CompletionClient, user_message};
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

// Semantic-containment rubric: paraphrases, contained answers, and
// equivalent values all count as correct. The judge must emit the bare
// token "1" or "0"; parsing below accepts nothing looser.
const JUDGE_RUBRIC: &str = "당신은 채점자입니다. 학생 답변이 정답과 의미적으로 일치하는지 판단하세요.

문제: {question}
정답: {expected_answer}
학생 답변: {student_answer}

평가 기준:
- 표현이 달라도 의미가 같으면 정답 (예: \"H₂O\" = \"H2O\", \"세종대왕\" = \"세종\")
- 정답이 포함되어 있으면 정답 (예: 정답 \"goes\"에 \"He goes to school\"도 정답)
- 숫자는 값이 같으면 정답 (예: \"15\" = \"15입니다\" = \"정답은 15\")
- 언어가 달라도 의미가 같으면 정답 (예: \"apple\" = \"애플\")

다른 말은 하지 말고 1 (정답) 또는 0 (오답)만 출력하세요:";

/// Scores a produced answer against the expected answer with one judge
/// completion call.
pub struct AnswerJudge {
    client: Arc<dyn CompletionClient>,
}

impl AnswerJudge {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Returns 1.0 iff the judge's output, after trimming, is exactly the
    /// literal token "1". Any other text, and missing/filtered output, is
    /// 0.0. Transport errors propagate to the caller.
    pub async fn evaluate(
        &self,
        student_answer: &str,
        expected_answer: &str,
        question: &str,
    ) -> Result<f64> {
        let prompt = JUDGE_RUBRIC
            .replace("{question}", question)
            .replace("{expected_answer}", expected_answer)
            .replace("{student_answer}", student_answer);
        let verdict = self.client.complete(user_message(&prompt)?).await?;

        let reward = match verdict.as_deref() {
            Some(text) if text.trim() == "1" => 1.0,
            _ => 0.0,
        };
        debug!(expected = %expected_answer, reward, "Judge verdict");
        Ok(reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::MockCompletionClient;

    fn judge_returning(verdict: Option<&str>) -> AnswerJudge {
        let mut client = MockCompletionClient::new();
        let verdict = verdict.map(str::to_string);
        client
            .expect_complete()
            .returning(move |_| Ok(verdict.clone()));
        AnswerJudge::new(Arc::new(client))
    }

    #[tokio::test]
    async fn literal_one_scores_full_reward() {
        let judge = judge_returning(Some("1"));
        assert_eq!(judge.evaluate("15", "15", "5 + 10은?").await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn surrounding_whitespace_is_trimmed() {
        let judge = judge_returning(Some(" 1\n"));
        assert_eq!(judge.evaluate("15", "15", "5 + 10은?").await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn any_other_text_scores_zero() {
        for verdict in ["0", "정답은 1", "1점", "yes"] {
            let judge = judge_returning(Some(verdict));
            assert_eq!(judge.evaluate("14", "15", "5 + 10은?").await.unwrap(), 0.0);
        }
    }

    #[tokio::test]
    async fn missing_content_scores_zero_without_error() {
        let judge = judge_returning(None);
        assert_eq!(judge.evaluate("15", "15", "5 + 10은?").await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn rubric_embeds_all_three_fields() {
        let mut client = MockCompletionClient::new();
        client.expect_complete().returning(|messages| {
            let rendered = format!("{:?}", messages);
            assert!(rendered.contains("물의 화학식은?"));
            assert!(rendered.contains("H2O"));
            assert!(rendered.contains("물은 H2O입니다"));
            Ok(Some("1".to_string()))
        });
        let judge = AnswerJudge::new(Arc::new(client));
        judge
            .evaluate("물은 H2O입니다", "H2O", "물의 화학식은?")
            .await
            .unwrap();
    }
}
