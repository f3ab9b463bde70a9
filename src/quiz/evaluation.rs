use serde::{Deserialize, Serialize};

use super::error::EvaluationFailure;
use super::extract::json_object_slice;
use crate::services::llm_provider::{CompletionModel, CompletionRequest};

pub const CORRECT_SCORE_THRESHOLD: f64 = 0.7;
pub const NO_CORRECTION: &str = "None needed";

const EVALUATION_TEMPERATURE: f32 = 0.3;
const EVALUATION_MAX_TOKENS: u32 = 300;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: f64,
    pub feedback: String,
    pub correction: String,
    pub is_correct: bool,
}

impl Evaluation {
    /// Stand-in used whenever the model's verdict cannot be obtained.
    pub fn fallback() -> Self {
        Self {
            score: 0.0,
            feedback: "Could not evaluate".to_string(),
            correction: "N/A".to_string(),
            is_correct: false,
        }
    }

    pub fn needs_correction(&self) -> bool {
        self.correction.trim() != NO_CORRECTION
    }
}

/// Evaluation as the model (or a remote endpoint) reports it; the flag is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvaluation {
    pub score: f64,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub correction: Option<String>,
    #[serde(default)]
    pub is_correct: Option<bool>,
}

impl RawEvaluation {
    pub fn into_evaluation(self) -> Result<Evaluation, EvaluationFailure> {
        if !self.score.is_finite() {
            return Err(EvaluationFailure::InvalidScore);
        }
        let score = self.score.clamp(0.0, 1.0);
        let is_correct = derive_correctness(self.is_correct, score);
        Ok(Evaluation {
            score,
            feedback: self.feedback.unwrap_or_default(),
            correction: self
                .correction
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| NO_CORRECTION.to_string()),
            is_correct,
        })
    }
}

/// The explicit flag wins; otherwise `score >= 0.7`.
pub fn derive_correctness(flag: Option<bool>, score: f64) -> bool {
    flag.unwrap_or(score >= CORRECT_SCORE_THRESHOLD)
}

pub fn evaluation_prompt(question: &str, answer: &str, topic: &str) -> String {
    format!(
        r#"Question: {question}
Student Answer: {answer}
Topic: {topic}

Evaluate this answer and give:
1. A score between 0 and 1
2. Brief feedback
3. A correction, or exactly "{NO_CORRECTION}" if the answer is correct
4. Whether the answer is correct, as a boolean

Return only JSON like this: {{"score": 0.8, "feedback": "Good job!", "correction": "{NO_CORRECTION}", "is_correct": true}}"#
    )
}

pub fn parse_evaluation(raw: &str) -> Result<Evaluation, EvaluationFailure> {
    let json = json_object_slice(raw).ok_or(EvaluationFailure::NoJsonObject)?;
    let parsed: RawEvaluation = serde_json::from_str(json).map_err(EvaluationFailure::Malformed)?;
    parsed.into_evaluation()
}

pub async fn request_evaluation(
    model: &dyn CompletionModel,
    question: &str,
    answer: &str,
    topic: &str,
) -> Result<Evaluation, EvaluationFailure> {
    let request = CompletionRequest::user_prompt(
        evaluation_prompt(question, answer, topic),
        EVALUATION_TEMPERATURE,
        EVALUATION_MAX_TOKENS,
    );
    let raw = model.complete(&request).await?;
    parse_evaluation(&raw)
}

/// Never fails: any error degrades to [`Evaluation::fallback`].
pub async fn evaluate_or_fallback(
    model: &dyn CompletionModel,
    question: &str,
    answer: &str,
    topic: &str,
) -> Evaluation {
    match request_evaluation(model, question, answer, topic).await {
        Ok(evaluation) => evaluation,
        Err(err) => {
            tracing::warn!(topic, error = %err, "evaluation failed, using fallback");
            Evaluation::fallback()
        }
    }
}
