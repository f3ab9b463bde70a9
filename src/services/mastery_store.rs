use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::operations::{self, LeaderboardEntry, MasteryRecord, StreakRecord};
use crate::db::DatabaseProxy;
use crate::quiz::error::PersistenceWarning;

/// Where mastery and streak state lives. The update rules belong to the store;
/// callers only report outcomes and read back the result.
#[async_trait]
pub trait MasteryStore: Send + Sync {
    async fn current_mastery(
        &self,
        user_id: &str,
        topic_id: &str,
    ) -> Result<Option<MasteryRecord>, PersistenceWarning>;

    /// Records one answer and returns the store's new mastery level.
    async fn update_mastery_level(
        &self,
        user_id: &str,
        topic_id: &str,
        is_correct: bool,
    ) -> Result<f64, PersistenceWarning>;

    async fn update_user_streak(&self, user_id: &str) -> Result<(), PersistenceWarning>;

    async fn current_streak(&self, user_id: &str) -> Result<Option<StreakRecord>, PersistenceWarning>;

    async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, PersistenceWarning>;
}

/// Postgres-backed store; the mutations are the database's stored procedures.
#[derive(Clone)]
pub struct PgMasteryStore {
    proxy: Arc<DatabaseProxy>,
}

impl PgMasteryStore {
    pub fn new(proxy: Arc<DatabaseProxy>) -> Self {
        Self { proxy }
    }
}

fn parse_id(raw: &str) -> Result<Uuid, PersistenceWarning> {
    Uuid::parse_str(raw.trim()).map_err(|_| PersistenceWarning::InvalidId(raw.to_string()))
}

#[async_trait]
impl MasteryStore for PgMasteryStore {
    async fn current_mastery(
        &self,
        user_id: &str,
        topic_id: &str,
    ) -> Result<Option<MasteryRecord>, PersistenceWarning> {
        let record =
            operations::select_mastery(&self.proxy, parse_id(user_id)?, parse_id(topic_id)?).await?;
        Ok(record)
    }

    async fn update_mastery_level(
        &self,
        user_id: &str,
        topic_id: &str,
        is_correct: bool,
    ) -> Result<f64, PersistenceWarning> {
        let level = operations::call_update_mastery_level(
            &self.proxy,
            parse_id(user_id)?,
            parse_id(topic_id)?,
            is_correct,
        )
        .await?;
        Ok(level)
    }

    async fn update_user_streak(&self, user_id: &str) -> Result<(), PersistenceWarning> {
        operations::call_update_user_streak(&self.proxy, parse_id(user_id)?).await?;
        Ok(())
    }

    async fn current_streak(&self, user_id: &str) -> Result<Option<StreakRecord>, PersistenceWarning> {
        let streak = operations::select_streak(&self.proxy, parse_id(user_id)?).await?;
        Ok(streak)
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, PersistenceWarning> {
        let entries = operations::select_leaderboard(&self.proxy, limit).await?;
        Ok(entries)
    }
}
