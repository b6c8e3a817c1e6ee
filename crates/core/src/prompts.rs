//! Prompt templates for the Teacher, Student, and their personas.
//!
//! Templates are plain strings with named `{slot}` markers, loadable from a
//! directory of `.md` files keyed by file stem. Built-in defaults cover every
//! key so a partial directory only overrides what it provides.

use crate::session::Difficulty;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Persona used when a task's difficulty label has no dedicated persona
/// (the trap questions in the training dataset use the label "함정").
pub const DEFAULT_PERSONA: &str = "학생입니다.";

const TEACHER_QUESTION: &str = "당신은 친절하고 격려하는 선생님(Teacher Agent)입니다.
학생에게 {subject} 분야의 {difficulty} 난이도 문제를 출제해야 합니다.

규칙:
1. 문제는 명확하고 답이 있는 것이어야 합니다
2. {difficulty} 난이도에 맞게 출제하세요:
   - 쉬움: 기초적인 개념, 간단한 계산
   - 보통: 약간의 사고력이 필요한 문제
   - 어려움: 깊은 이해와 응용력이 필요한 문제
3. 문제만 출제하고, 답은 말하지 마세요
4. 친근하고 격려하는 톤을 유지하세요

현재 {round_count}번째 문제입니다.
";

const STUDENT_ANSWER: &str = "당신은 {persona}
선생님의 문제에 답변해야 합니다.

규칙:
1. 풀이 과정을 보여주세요
2. 최선을 다해 답하되, 확실하지 않으면 \"잘 모르겠어요\"라고 솔직히 말해도 됩니다
3. 학생답게 자연스러운 말투를 사용하세요
4. 답변 후 선생님의 피드백을 기다리세요
";

const TEACHER_EVALUATE: &str = "당신은 친절하고 격려하는 선생님(Teacher Agent)입니다.
학생의 답변을 평가하고 피드백을 제공해야 합니다.

문제: {question}
학생 답변: {student_answer}

규칙:
1. 먼저 정답 여부를 명확히 알려주세요 (⭕ 정답 / ❌ 오답 / 🔺 부분 정답)
2. 정답인 경우: 칭찬하고 추가 설명을 해주세요
3. 오답인 경우: 격려하며 올바른 답과 설명을 알려주세요
4. 핵심 개념이나 팁을 짧게 설명해주세요
5. 친절하고 교육적인 톤을 유지하세요
";

const PERSONA_EASY: &str =
    "열심히 공부하는 초등학생으로, 대부분의 문제를 잘 풀지만 가끔 실수합니다.";
const PERSONA_MEDIUM: &str =
    "호기심 많은 중학생으로, 적극적으로 풀이 과정을 보여주며 약 70% 정도의 정답률을 보입니다.";
const PERSONA_HARD: &str =
    "도전적인 고등학생으로, 어려운 문제도 논리적으로 접근하지만 완벽하지 않을 수 있습니다.";

/// A rendered (system, user) message pair for one completion call.
pub type PromptPair = (String, String);

/// The set of prompt templates the dialogue engine and trainer draw from.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    teacher_question: String,
    student_answer: String,
    teacher_evaluate: String,
    personas: HashMap<Difficulty, String>,
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptLibrary {
    /// The embedded default templates.
    pub fn builtin() -> Self {
        let personas = HashMap::from([
            (Difficulty::Easy, PERSONA_EASY.to_string()),
            (Difficulty::Medium, PERSONA_MEDIUM.to_string()),
            (Difficulty::Hard, PERSONA_HARD.to_string()),
        ]);
        Self {
            teacher_question: TEACHER_QUESTION.to_string(),
            student_answer: STUDENT_ANSWER.to_string(),
            teacher_evaluate: TEACHER_EVALUATE.to_string(),
            personas,
        }
    }

    /// Loads templates from a directory of `.md` files keyed by file stem
    /// (`teacher_question.md`, `student_answer.md`, `teacher_evaluate.md`,
    /// `student_persona_easy.md`, ...). Keys not present in the directory
    /// keep their built-in defaults.
    pub fn from_dir(path: &Path) -> Result<Self> {
        let mut library = Self::builtin();
        for entry in fs::read_dir(path)
            .with_context(|| format!("Failed to read prompts directory '{}'", path.display()))?
        {
            let entry = entry?;
            let file = entry.path();
            if !file.is_file() || file.extension().and_then(|s| s.to_str()) != Some("md") {
                continue;
            }
            let key = file
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?
                .to_string();
            let content = fs::read_to_string(&file)?.trim_end().to_string();
            match key.as_str() {
                "teacher_question" => library.teacher_question = content,
                "student_answer" => library.student_answer = content,
                "teacher_evaluate" => library.teacher_evaluate = content,
                "student_persona_easy" => {
                    library.personas.insert(Difficulty::Easy, content);
                }
                "student_persona_medium" => {
                    library.personas.insert(Difficulty::Medium, content);
                }
                "student_persona_hard" => {
                    library.personas.insert(Difficulty::Hard, content);
                }
                _ => tracing::debug!(key = %key, "Ignoring unknown prompt file"),
            }
        }
        Ok(library)
    }

    /// Replaces the Student system template, e.g. with an optimized prompt
    /// produced by the trainer.
    pub fn override_student_answer(&mut self, template: String) {
        self.student_answer = template;
    }

    /// The raw Student template, with its `{persona}` slot unrendered.
    /// The trainer uses this as the seed of the optimization loop.
    pub fn student_answer_template(&self) -> &str {
        &self.student_answer
    }

    /// Persona text for a difficulty bucket.
    pub fn persona(&self, difficulty: Difficulty) -> &str {
        self.personas
            .get(&difficulty)
            .map(String::as_str)
            .unwrap_or(DEFAULT_PERSONA)
    }

    /// Persona text for a raw dataset label, falling back to the default
    /// persona for labels outside the three buckets.
    pub fn persona_for_label(&self, label: &str) -> &str {
        match Difficulty::from_label(label) {
            Some(d) => self.persona(d),
            None => DEFAULT_PERSONA,
        }
    }

    pub fn teacher_question_messages(
        &self,
        difficulty: Difficulty,
        subject: &str,
        round_count: u32,
    ) -> PromptPair {
        let system = self
            .teacher_question
            .replace("{difficulty}", &difficulty.to_string())
            .replace("{subject}", subject)
            .replace("{round_count}", &round_count.to_string());
        let user = format!(
            "{} 분야의 {} 난이도 문제를 출제해주세요.",
            subject, difficulty
        );
        (system, user)
    }

    pub fn student_answer_messages(&self, difficulty: Difficulty, question: &str) -> PromptPair {
        let system = self
            .student_answer
            .replace("{persona}", self.persona(difficulty))
            .replace("{difficulty}", &difficulty.to_string());
        let user = format!("선생님 문제: {}\n\n이 문제에 답해보세요.", question);
        (system, user)
    }

    pub fn teacher_evaluate_messages(&self, question: &str, student_answer: &str) -> PromptPair {
        let system = self
            .teacher_evaluate
            .replace("{question}", question)
            .replace("{student_answer}", student_answer);
        let user = "학생의 답변을 평가해주세요.".to_string();
        (system, user)
    }
}
