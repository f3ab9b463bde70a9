#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use parking_lot::Mutex;

use neolearn_backend::config::Config;
use neolearn_backend::db::operations::{LeaderboardEntry, MasteryRecord, StreakRecord};
use neolearn_backend::quiz::PersistenceWarning;
use neolearn_backend::services::llm_provider::{CompletionModel, CompletionRequest, LLMError};
use neolearn_backend::services::mastery_store::MasteryStore;
use neolearn_backend::state::AppState;

pub const USER_ID: &str = "3f0e4c1a-6a8e-4b7a-9d5e-1c2b3a4d5e6f";
pub const TOPIC_ID: &str = "9b1d2c3e-4f5a-4b6c-8d7e-0f1a2b3c4d5e";

pub fn question_json(correct: &str) -> String {
    format!(
        r#"{{"question": "Which value is correct?", "options": ["{correct}", "B", "C", "D"], "correct_answer": "{correct}"}}"#
    )
}

pub fn evaluation_json(score: f64, is_correct: bool) -> String {
    format!(
        r#"{{"score": {score}, "feedback": "Checked.", "correction": "None needed", "is_correct": {is_correct}}}"#
    )
}

/// Replays canned completions in order; an exhausted script answers with an error.
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, LLMError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_responses<I, S>(responses: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let model = Self::default();
        model
            .responses
            .lock()
            .extend(responses.into_iter().map(|r| Ok(r.into())));
        Arc::new(model)
    }

    pub fn push_ok(&self, response: impl Into<String>) {
        self.responses.lock().push_back(Ok(response.into()));
    }

    pub fn push_err(&self) {
        self.responses.lock().push_back(Err(LLMError::EmptyChoices));
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LLMError> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or(Err(LLMError::EmptyChoices))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MasteryCall {
    pub user_id: String,
    pub topic_id: String,
    pub is_correct: bool,
}

/// In-memory store that records every mutation and replays scripted mastery levels.
#[derive(Default)]
pub struct RecordingStore {
    initial: Mutex<Option<f64>>,
    levels: Mutex<VecDeque<f64>>,
    fail_updates: Mutex<bool>,
    mastery_calls: Mutex<Vec<MasteryCall>>,
    streak_calls: Mutex<Vec<String>>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_levels(initial: Option<f64>, levels: impl IntoIterator<Item = f64>) -> Arc<Self> {
        let store = Self::default();
        *store.initial.lock() = initial;
        store.levels.lock().extend(levels);
        Arc::new(store)
    }

    pub fn with_mastery(initial: f64) -> Arc<Self> {
        let store = Self::default();
        *store.initial.lock() = Some(initial);
        Arc::new(store)
    }

    pub fn failing() -> Arc<Self> {
        let store = Self::default();
        *store.fail_updates.lock() = true;
        Arc::new(store)
    }

    pub fn set_failing(&self, failing: bool) {
        *self.fail_updates.lock() = failing;
    }

    pub fn mastery_calls(&self) -> Vec<MasteryCall> {
        self.mastery_calls.lock().clone()
    }

    pub fn streak_calls(&self) -> Vec<String> {
        self.streak_calls.lock().clone()
    }
}

#[async_trait]
impl MasteryStore for RecordingStore {
    async fn current_mastery(
        &self,
        user_id: &str,
        topic_id: &str,
    ) -> Result<Option<MasteryRecord>, PersistenceWarning> {
        Ok(self.initial.lock().map(|level| MasteryRecord {
            user_id: user_id.to_string(),
            topic_id: topic_id.to_string(),
            mastery_level: level,
            questions_attempted: 3,
            questions_correct: 2,
            last_attempted_at: None,
        }))
    }

    async fn update_mastery_level(
        &self,
        user_id: &str,
        topic_id: &str,
        is_correct: bool,
    ) -> Result<f64, PersistenceWarning> {
        self.mastery_calls.lock().push(MasteryCall {
            user_id: user_id.to_string(),
            topic_id: topic_id.to_string(),
            is_correct,
        });
        if *self.fail_updates.lock() {
            return Err(PersistenceWarning::Remote("update_mastery_level unavailable".into()));
        }
        let next = self.levels.lock().pop_front();
        let level = next.unwrap_or_else(|| self.initial.lock().unwrap_or(0.0));
        *self.initial.lock() = Some(level);
        Ok(level)
    }

    async fn update_user_streak(&self, user_id: &str) -> Result<(), PersistenceWarning> {
        self.streak_calls.lock().push(user_id.to_string());
        if *self.fail_updates.lock() {
            return Err(PersistenceWarning::Remote("update_user_streak unavailable".into()));
        }
        Ok(())
    }

    async fn current_streak(&self, user_id: &str) -> Result<Option<StreakRecord>, PersistenceWarning> {
        let count = self.streak_calls.lock().len() as i64;
        Ok((count > 0).then(|| StreakRecord {
            user_id: user_id.to_string(),
            current_streak: count,
            longest_streak: count,
            last_activity_date: None,
        }))
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, PersistenceWarning> {
        let entries = (0..3)
            .map(|i| LeaderboardEntry {
                user_id: format!("user-{i}"),
                username: Some(format!("learner{i}")),
                full_name: None,
                avatar_url: None,
                avg_mastery: 0.9 - i as f64 * 0.1,
            })
            .take(limit.max(0) as usize)
            .collect();
        Ok(entries)
    }
}

pub fn test_state(
    model: Arc<dyn CompletionModel>,
    store: Option<Arc<dyn MasteryStore>>,
) -> AppState {
    AppState::from_parts(Config::default(), None, model, store)
}

pub fn create_test_app_with(
    model: Arc<dyn CompletionModel>,
    store: Option<Arc<dyn MasteryStore>>,
) -> Router {
    neolearn_backend::app(test_state(model, store))
}

pub async fn create_test_app() -> Router {
    std::env::set_var("DATABASE_URL", "");
    std::env::set_var("LLM_API_KEY", "");
    std::env::set_var("GROQ_API_KEY", "");

    neolearn_backend::create_app().await
}
