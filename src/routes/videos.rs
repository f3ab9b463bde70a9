use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::services::videos::{recommend_video, VideoRecommendation};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct SearchVideosRequest {
    #[serde(default)]
    topic: String,
    #[serde(default)]
    level: String,
}

#[derive(Debug, Serialize)]
struct SearchVideosResponse {
    success: bool,
    recommendation: VideoRecommendation,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    fallback: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(search))
}

/// Unreadable bodies still get the fallback video.
async fn search(State(state): State<AppState>, body: String) -> Json<SearchVideosResponse> {
    let request: SearchVideosRequest = serde_json::from_str(&body).unwrap_or_default();
    let result = recommend_video(state.model(), &request.topic, &request.level).await;

    Json(SearchVideosResponse {
        success: true,
        recommendation: result.recommendation,
        fallback: result.fallback,
    })
}
