use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::operations::{LeaderboardEntry, StreakRecord};
use crate::quiz::{classify, Difficulty, MasteryLabel, PersistenceWarning};
use crate::response::AppError;
use crate::services::mastery_store::MasteryStore;
use crate::state::AppState;

const DEFAULT_LEADERBOARD_SIZE: i64 = 5;
const MAX_LEADERBOARD_SIZE: i64 = 50;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MasteryView {
    user_id: String,
    topic_id: String,
    mastery_level: f64,
    questions_attempted: i64,
    questions_correct: i64,
    last_attempted_at: Option<DateTime<Utc>>,
    label: MasteryLabel,
    next_level: Difficulty,
    exists: bool,
}

#[derive(Debug, Deserialize)]
struct LeaderboardQuery {
    limit: Option<i64>,
}

pub fn mastery_router() -> Router<AppState> {
    Router::new().route("/:userId/:topicId", get(get_mastery))
}

pub fn streak_router() -> Router<AppState> {
    Router::new().route("/:userId", get(get_streak))
}

pub fn leaderboard_router() -> Router<AppState> {
    Router::new().route("/", get(get_leaderboard))
}

fn require_store(state: &AppState) -> Result<std::sync::Arc<dyn MasteryStore>, AppError> {
    state
        .store()
        .ok_or_else(|| AppError::service_unavailable("Mastery store is not configured"))
}

fn store_error(err: PersistenceWarning) -> AppError {
    match err {
        PersistenceWarning::InvalidId(id) => AppError::validation(format!("invalid identifier: {id}")),
        PersistenceWarning::Unavailable => AppError::service_unavailable("Mastery store is not configured"),
        other => AppError::internal(other.to_string()),
    }
}

async fn get_mastery(
    State(state): State<AppState>,
    Path((user_id, topic_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let store = require_store(&state)?;
    let record = store.current_mastery(&user_id, &topic_id).await.map_err(store_error)?;

    let view = match record {
        Some(record) => MasteryView {
            label: MasteryLabel::from_score(record.mastery_level),
            next_level: classify(record.mastery_level),
            user_id: record.user_id,
            topic_id: record.topic_id,
            mastery_level: record.mastery_level,
            questions_attempted: record.questions_attempted,
            questions_correct: record.questions_correct,
            last_attempted_at: record.last_attempted_at,
            exists: true,
        },
        None => MasteryView {
            user_id,
            topic_id,
            mastery_level: 0.0,
            questions_attempted: 0,
            questions_correct: 0,
            last_attempted_at: None,
            label: MasteryLabel::Beginner,
            next_level: Difficulty::Easy,
            exists: false,
        },
    };

    Ok(Json(SuccessResponse { success: true, data: view }))
}

async fn get_streak(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let store = require_store(&state)?;
    let streak = store
        .current_streak(&user_id)
        .await
        .map_err(store_error)?
        .unwrap_or(StreakRecord {
            user_id,
            current_streak: 0,
            longest_streak: 0,
            last_activity_date: None,
        });

    Ok(Json(SuccessResponse { success: true, data: streak }))
}

async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<impl IntoResponse, AppError> {
    let store = require_store(&state)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_SIZE)
        .clamp(1, MAX_LEADERBOARD_SIZE);

    let entries: Vec<LeaderboardEntry> = store.leaderboard(limit).await.map_err(store_error)?;
    Ok(Json(SuccessResponse { success: true, data: entries }))
}
