use serde::{Deserialize, Serialize};

use super::difficulty::{classify, Difficulty};
use super::error::GenerationFailure;
use super::extract::json_object_slice;
use crate::services::llm_provider::{CompletionModel, CompletionRequest};

pub const OPTION_COUNT: usize = 4;

const QUESTION_TEMPERATURE: f32 = 1.0;
const QUESTION_MAX_TOKENS: u32 = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl Question {
    pub fn has_option(&self, answer: &str) -> bool {
        let answer = answer.trim();
        self.options.iter().any(|option| option.trim() == answer)
    }

    /// Checks the four-option contract: non-blank text and options, answer among options.
    pub fn validated(self) -> Result<Self, GenerationFailure> {
        if self.question.trim().is_empty() {
            return Err(GenerationFailure::InvalidShape("question text is empty".into()));
        }
        if self.options.len() != OPTION_COUNT {
            return Err(GenerationFailure::InvalidShape(format!(
                "expected {OPTION_COUNT} options, got {}",
                self.options.len()
            )));
        }
        if self.options.iter().any(|option| option.trim().is_empty()) {
            return Err(GenerationFailure::InvalidShape("blank option".into()));
        }
        if !self.has_option(&self.correct_answer) {
            return Err(GenerationFailure::InvalidShape(
                "correct_answer is not one of the options".into(),
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: Question,
    pub level: Difficulty,
}

pub fn question_prompt(topic: &str, level: Difficulty) -> String {
    format!(
        r#"Generate a {level} difficulty multiple-choice question on the topic: {topic}.
The question should have exactly 4 options, with one correct answer.
The correct answer must be copied verbatim from the options.
Return only JSON in exactly this shape:

{{
    "question": "<question text>",
    "options": ["option1", "option2", "option3", "option4"],
    "correct_answer": "<correct option>"
}}"#
    )
}

/// Parses the model output into a validated four-option question.
pub fn parse_question(raw: &str) -> Result<Question, GenerationFailure> {
    let json = json_object_slice(raw).ok_or(GenerationFailure::NoJsonObject)?;
    let question: Question = serde_json::from_str(json).map_err(GenerationFailure::Malformed)?;
    question.validated()
}

/// One completion call, no retries.
pub async fn request_question(
    model: &dyn CompletionModel,
    topic: &str,
    level: Difficulty,
) -> Result<Question, GenerationFailure> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(GenerationFailure::EmptyTopic);
    }

    let request = CompletionRequest::user_prompt(
        question_prompt(topic, level),
        QUESTION_TEMPERATURE,
        QUESTION_MAX_TOKENS,
    );
    let raw = model.complete(&request).await?;
    parse_question(&raw).map_err(|err| {
        tracing::warn!(topic, %level, error = %err, "unusable question from model");
        err
    })
}

pub async fn generate_question(
    model: &dyn CompletionModel,
    topic: &str,
    mastery: f64,
) -> Result<GeneratedQuestion, GenerationFailure> {
    let level = classify(mastery);
    let question = request_question(model, topic, level).await?;
    tracing::info!(topic, mastery, %level, "generated question");
    Ok(GeneratedQuestion { question, level })
}
