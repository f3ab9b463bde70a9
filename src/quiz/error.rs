use thiserror::Error;

use crate::services::llm_provider::LLMError;

/// The question endpoint could not produce a usable question.
#[derive(Debug, Error)]
pub enum GenerationFailure {
    #[error("topic must not be empty")]
    EmptyTopic,
    #[error("completion request failed: {0}")]
    Model(#[from] LLMError),
    #[error("no JSON object in model output")]
    NoJsonObject,
    #[error("malformed question JSON: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("invalid question: {0}")]
    InvalidShape(String),
    #[error("question service error: {0}")]
    Remote(String),
}

/// The evaluation endpoint failed. Callers degrade to the fallback evaluation.
#[derive(Debug, Error)]
pub enum EvaluationFailure {
    #[error("completion request failed: {0}")]
    Model(#[from] LLMError),
    #[error("no JSON object in model output")]
    NoJsonObject,
    #[error("malformed evaluation JSON: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("evaluation score is not a number in range")]
    InvalidScore,
    #[error("evaluation service error: {0}")]
    Remote(String),
}

/// A mastery or streak write (or read) did not go through. Logged, never surfaced.
#[derive(Debug, Error)]
pub enum PersistenceWarning {
    #[error("mastery store not configured")]
    Unavailable,
    #[error("invalid identifier {0:?}")]
    InvalidId(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("mastery service error: {0}")]
    Remote(String),
}
