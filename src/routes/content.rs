use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::response::AppError;
use crate::services::content::{generate_personalized_content, ContentError, ContentRequest};
use crate::state::AppState;

const NO_PREFERENCES: &str = "No specific preferences provided";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    topic: String,
    #[serde(default)]
    content_level: Option<String>,
    #[serde(default)]
    preferences: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateContentResponse {
    success: bool,
    content: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(generate))
}

async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateContentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    let request = ContentRequest {
        topic: payload.topic.trim().to_string(),
        content_level: payload
            .content_level
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "beginner".to_string()),
        preferences: payload
            .preferences
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| NO_PREFERENCES.to_string()),
    };

    let content = generate_personalized_content(state.model(), &request)
        .await
        .map_err(|err| match err {
            ContentError::EmptyTopic => AppError::validation("topic is required"),
            other => {
                tracing::warn!(topic = %request.topic, error = %other, "content generation failed");
                AppError::upstream("CONTENT_FAILED", format!("Failed to generate content: {other}"))
            }
        })?;

    Ok(Json(GenerateContentResponse { success: true, content }))
}
