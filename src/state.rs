use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::config::Config;
use crate::db::DatabaseProxy;
use crate::quiz::AdaptiveQuiz;
use crate::services::llm_provider::CompletionModel;
use crate::services::mastery_store::{MasteryStore, PgMasteryStore};

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    config: Arc<Config>,
    db_proxy: Option<Arc<DatabaseProxy>>,
    model: Arc<dyn CompletionModel>,
    store: Option<Arc<dyn MasteryStore>>,
    quiz: AdaptiveQuiz,
}

impl AppState {
    pub fn new(
        config: Config,
        db_proxy: Option<Arc<DatabaseProxy>>,
        model: Arc<dyn CompletionModel>,
    ) -> Self {
        let store = db_proxy
            .as_ref()
            .map(|proxy| Arc::new(PgMasteryStore::new(Arc::clone(proxy))) as Arc<dyn MasteryStore>);
        Self::from_parts(config, db_proxy, model, store)
    }

    /// Wires explicit collaborators; tests pass stub models and stores here.
    pub fn from_parts(
        config: Config,
        db_proxy: Option<Arc<DatabaseProxy>>,
        model: Arc<dyn CompletionModel>,
        store: Option<Arc<dyn MasteryStore>>,
    ) -> Self {
        let quiz = AdaptiveQuiz::new(Arc::clone(&model), store.clone());
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            config: Arc::new(config),
            db_proxy,
            model,
            store,
            quiz,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn db_proxy(&self) -> Option<Arc<DatabaseProxy>> {
        self.db_proxy.clone()
    }

    pub fn model(&self) -> &dyn CompletionModel {
        self.model.as_ref()
    }

    pub fn store(&self) -> Option<Arc<dyn MasteryStore>> {
        self.store.clone()
    }

    pub fn quiz(&self) -> &AdaptiveQuiz {
        &self.quiz
    }
}
