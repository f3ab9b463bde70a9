use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::difficulty::Difficulty;
use super::error::{EvaluationFailure, GenerationFailure, PersistenceWarning};
use super::evaluation::RawEvaluation;
use super::question::{GeneratedQuestion, Question};
use super::service::{AdaptiveQuiz, AnswerOutcome, AnswerSubmission};

const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(15);

/// What a quiz session needs from the outside world, one call per suspend point.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    async fn fetch_mastery(&self, user_id: &str, topic_id: &str)
        -> Result<Option<f64>, PersistenceWarning>;

    async fn generate_question(
        &self,
        topic: &str,
        mastery: f64,
    ) -> Result<GeneratedQuestion, GenerationFailure>;

    async fn evaluate_answer(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<AnswerOutcome, EvaluationFailure>;
}

/// Runs the quiz logic in-process.
#[derive(Clone)]
pub struct LocalQuizBackend {
    quiz: AdaptiveQuiz,
}

impl LocalQuizBackend {
    pub fn new(quiz: AdaptiveQuiz) -> Self {
        Self { quiz }
    }
}

#[async_trait]
impl QuizBackend for LocalQuizBackend {
    async fn fetch_mastery(
        &self,
        user_id: &str,
        topic_id: &str,
    ) -> Result<Option<f64>, PersistenceWarning> {
        let record = self.quiz.current_mastery(user_id, topic_id).await?;
        Ok(record.map(|r| r.mastery_level))
    }

    async fn generate_question(
        &self,
        topic: &str,
        mastery: f64,
    ) -> Result<GeneratedQuestion, GenerationFailure> {
        self.quiz.generate_question(topic, mastery).await
    }

    async fn evaluate_answer(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<AnswerOutcome, EvaluationFailure> {
        Ok(self.quiz.evaluate_answer(submission).await)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuizEnvelope {
    #[serde(default)]
    success: bool,
    error: Option<String>,
    question: Option<Question>,
    level: Option<Difficulty>,
    evaluation: Option<RawEvaluation>,
    new_mastery: Option<f64>,
}

impl QuizEnvelope {
    fn failure_message(&self, status: reqwest::StatusCode) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| format!("request failed with status {status}"))
    }
}

#[derive(Debug, Deserialize)]
struct MasteryEnvelope {
    #[serde(default)]
    success: bool,
    error: Option<String>,
    data: Option<MasteryData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MasteryData {
    mastery_level: f64,
    #[serde(default)]
    exists: bool,
}

/// HTTP client of the adaptive-quiz endpoint served by this crate.
#[derive(Clone)]
pub struct AdaptiveQuizClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl AdaptiveQuizClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_CLIENT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            client,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn quiz_url(&self) -> String {
        format!("{}/functions/v1/adaptive-quiz", self.base_url)
    }

    /// Ids become single percent-encoded path segments.
    fn mastery_url(&self, user_id: &str, topic_id: &str) -> Result<reqwest::Url, PersistenceWarning> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| PersistenceWarning::Remote(format!("invalid base url {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| PersistenceWarning::Remote(format!("{} cannot be a base url", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "mastery", user_id, topic_id]);
        Ok(url)
    }

    async fn post_quiz(&self, body: serde_json::Value) -> Result<(reqwest::StatusCode, QuizEnvelope), String> {
        let mut request = self.client.post(self.quiz_url()).json(&body);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key).header("apikey", key);
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        let envelope = response
            .json::<QuizEnvelope>()
            .await
            .map_err(|e| format!("invalid response body (status {status}): {e}"))?;
        Ok((status, envelope))
    }
}

#[async_trait]
impl QuizBackend for AdaptiveQuizClient {
    async fn fetch_mastery(
        &self,
        user_id: &str,
        topic_id: &str,
    ) -> Result<Option<f64>, PersistenceWarning> {
        let url = self.mastery_url(user_id, topic_id)?;
        let mut request = self.client.get(url);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key).header("apikey", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PersistenceWarning::Remote(e.to_string()))?;
        let status = response.status();
        let envelope = response
            .json::<MasteryEnvelope>()
            .await
            .map_err(|e| PersistenceWarning::Remote(e.to_string()))?;

        if !status.is_success() || !envelope.success {
            return Err(PersistenceWarning::Remote(
                envelope.error.unwrap_or_else(|| format!("status {status}")),
            ));
        }

        Ok(envelope
            .data
            .filter(|data| data.exists)
            .map(|data| data.mastery_level))
    }

    async fn generate_question(
        &self,
        topic: &str,
        mastery: f64,
    ) -> Result<GeneratedQuestion, GenerationFailure> {
        let body = serde_json::json!({
            "action": "generate_question",
            "topic": topic,
            "mastery": mastery,
        });
        let (status, envelope) = self.post_quiz(body).await.map_err(GenerationFailure::Remote)?;

        if !status.is_success() || !envelope.success {
            return Err(GenerationFailure::Remote(envelope.failure_message(status)));
        }

        let question = envelope
            .question
            .ok_or_else(|| GenerationFailure::Remote("response carried no question".into()))?
            .validated()?;
        let level = envelope
            .level
            .unwrap_or_else(|| super::difficulty::classify(mastery));

        Ok(GeneratedQuestion { question, level })
    }

    async fn evaluate_answer(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<AnswerOutcome, EvaluationFailure> {
        let body = serde_json::json!({
            "action": "evaluate_answer",
            "question": submission.question,
            "answer": submission.answer,
            "topic": submission.topic,
            "userId": submission.user_id,
            "topicId": submission.topic_id,
            "mastery": submission.previous_mastery,
        });
        let (status, envelope) = self.post_quiz(body).await.map_err(EvaluationFailure::Remote)?;

        if !status.is_success() || !envelope.success {
            return Err(EvaluationFailure::Remote(envelope.failure_message(status)));
        }

        let evaluation = envelope
            .evaluation
            .ok_or_else(|| EvaluationFailure::Remote("response carried no evaluation".into()))?
            .into_evaluation()?;

        Ok(AnswerOutcome {
            evaluation,
            new_mastery: envelope.new_mastery.or(submission.previous_mastery),
        })
    }
}
