use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::quiz::{AnswerSubmission, Difficulty, Evaluation, GenerationFailure, Question};
use crate::response::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum QuizRequest {
    GenerateQuestion {
        topic: String,
        #[serde(default)]
        mastery: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    EvaluateAnswer {
        question: String,
        answer: String,
        topic: String,
        user_id: String,
        topic_id: String,
        #[serde(default)]
        mastery: Option<f64>,
    },
}

#[derive(Debug, Serialize)]
struct GenerateQuestionResponse {
    success: bool,
    question: Question,
    level: Difficulty,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateAnswerResponse {
    success: bool,
    evaluation: Evaluation,
    new_mastery: Option<f64>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(handle))
}

async fn handle(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let request: QuizRequest = serde_json::from_value(body)
        .map_err(|err| AppError::bad_request(format!("Invalid action: {err}")))?;

    match request {
        QuizRequest::GenerateQuestion { topic, mastery } => {
            generate_question(&state, &topic, mastery.unwrap_or(0.0)).await
        }
        QuizRequest::EvaluateAnswer { question, answer, topic, user_id, topic_id, mastery } => {
            let submission = AnswerSubmission {
                question,
                answer,
                topic,
                user_id,
                topic_id,
                previous_mastery: mastery,
            };
            evaluate_answer(&state, submission).await
        }
    }
}

async fn generate_question(state: &AppState, topic: &str, mastery: f64) -> Result<Response, AppError> {
    tracing::info!(topic, mastery, "processing generate_question");

    let generated = state
        .quiz()
        .generate_question(topic, mastery)
        .await
        .map_err(|err| match err {
            GenerationFailure::EmptyTopic => AppError::validation("topic is required"),
            other => {
                tracing::warn!(topic, error = %other, "question generation failed");
                AppError::upstream("GENERATION_FAILED", format!("Failed to generate question: {other}"))
            }
        })?;

    Ok(Json(GenerateQuestionResponse {
        success: true,
        question: generated.question,
        level: generated.level,
    })
    .into_response())
}

async fn evaluate_answer(state: &AppState, submission: AnswerSubmission) -> Result<Response, AppError> {
    for (field, value) in [
        ("question", &submission.question),
        ("answer", &submission.answer),
        ("userId", &submission.user_id),
        ("topicId", &submission.topic_id),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::validation(format!("{field} is required")));
        }
    }

    tracing::info!(topic = %submission.topic, user_id = %submission.user_id, "processing evaluate_answer");
    let outcome = state.quiz().evaluate_answer(&submission).await;

    Ok(Json(EvaluateAnswerResponse {
        success: true,
        evaluation: outcome.evaluation,
        new_mastery: outcome.new_mastery,
    })
    .into_response())
}
