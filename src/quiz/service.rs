use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::{GenerationFailure, PersistenceWarning};
use super::evaluation::{evaluate_or_fallback, Evaluation};
use super::question::{self, GeneratedQuestion};
use crate::db::operations::MasteryRecord;
use crate::services::llm_provider::CompletionModel;
use crate::services::mastery_store::MasteryStore;

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerSubmission {
    pub question: String,
    pub answer: String,
    pub topic: String,
    pub user_id: String,
    pub topic_id: String,
    /// Mastery the learner currently sees; kept when the store update fails.
    pub previous_mastery: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub evaluation: Evaluation,
    pub new_mastery: Option<f64>,
}

/// Question generation and answer evaluation against one completion model
/// and an optional mastery store.
#[derive(Clone)]
pub struct AdaptiveQuiz {
    model: Arc<dyn CompletionModel>,
    store: Option<Arc<dyn MasteryStore>>,
}

impl AdaptiveQuiz {
    pub fn new(model: Arc<dyn CompletionModel>, store: Option<Arc<dyn MasteryStore>>) -> Self {
        Self { model, store }
    }

    pub async fn generate_question(
        &self,
        topic: &str,
        mastery: f64,
    ) -> Result<GeneratedQuestion, GenerationFailure> {
        question::generate_question(self.model.as_ref(), topic, mastery).await
    }

    /// Evaluates, then reports the outcome to the mastery store.
    ///
    /// Never fails. Model problems yield the fallback evaluation; store
    /// problems are logged and leave `previous_mastery` in place.
    pub async fn evaluate_answer(&self, submission: &AnswerSubmission) -> AnswerOutcome {
        let evaluation = evaluate_or_fallback(
            self.model.as_ref(),
            &submission.question,
            &submission.answer,
            &submission.topic,
        )
        .await;

        let new_mastery = match self
            .record_answer(&submission.user_id, &submission.topic_id, evaluation.is_correct)
            .await
        {
            Ok(level) => Some(level),
            Err(warning) => {
                tracing::warn!(
                    user_id = %submission.user_id,
                    topic_id = %submission.topic_id,
                    error = %warning,
                    "mastery update failed, keeping previous value"
                );
                submission.previous_mastery
            }
        };

        if evaluation.is_correct {
            if let Err(warning) = self.record_streak(&submission.user_id).await {
                tracing::warn!(user_id = %submission.user_id, error = %warning, "streak update failed");
            }
        }

        AnswerOutcome { evaluation, new_mastery }
    }

    pub async fn current_mastery(
        &self,
        user_id: &str,
        topic_id: &str,
    ) -> Result<Option<MasteryRecord>, PersistenceWarning> {
        self.require_store()?.current_mastery(user_id, topic_id).await
    }

    pub async fn record_answer(
        &self,
        user_id: &str,
        topic_id: &str,
        is_correct: bool,
    ) -> Result<f64, PersistenceWarning> {
        self.require_store()?
            .update_mastery_level(user_id, topic_id, is_correct)
            .await
    }

    pub async fn record_streak(&self, user_id: &str) -> Result<(), PersistenceWarning> {
        self.require_store()?.update_user_streak(user_id).await
    }

    fn require_store(&self) -> Result<&Arc<dyn MasteryStore>, PersistenceWarning> {
        self.store.as_ref().ok_or(PersistenceWarning::Unavailable)
    }
}
