use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

use common::{evaluation_json, question_json, RecordingStore, ScriptedModel, TOPIC_ID, USER_ID};

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_root_without_database() {
    let app = common::create_test_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "not_configured");
}

#[tokio::test]
async fn test_health_live() {
    let app = common::create_test_app().await;

    let response = app.oneshot(get("/health/live")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_info() {
    let app = common::create_test_app().await;

    let response = app.oneshot(get("/api/health/info")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["service"], "neolearn-backend");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = common::create_test_app().await;

    let response = app.oneshot(get("/api/nope")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_cors_preflight_allows_client_headers() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/functions/v1/adaptive-quiz")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "apikey,x-client-info")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_generate_question_from_prose_wrapped_output() {
    let model = ScriptedModel::with_responses([format!(
        "Here is your question:\n{}\nGood luck!",
        question_json("Paris")
    )]);
    let app = common::create_test_app_with(model.clone(), None);

    let response = app
        .oneshot(post_json(
            "/functions/v1/adaptive-quiz",
            json!({"action": "generate_question", "topic": "Geography", "mastery": 0.5}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["level"], "intermediate");
    assert_eq!(body["question"]["correct_answer"], "Paris");
    assert_eq!(body["question"]["options"].as_array().unwrap().len(), 4);

    let requests = model.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].temperature, 1.0);
    assert!(requests[0].messages[0].content.contains("intermediate difficulty"));
}

#[tokio::test]
async fn test_generate_question_without_mastery_is_easy() {
    let model = ScriptedModel::with_responses([question_json("4")]);
    let app = common::create_test_app_with(model, None);

    let response = app
        .oneshot(post_json(
            "/functions/v1/adaptive-quiz",
            json!({"action": "generate_question", "topic": "Arithmetic"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["level"], "easy");
}

#[tokio::test]
async fn test_generation_failure_is_not_retried() {
    let model = ScriptedModel::with_responses(["I cannot help with that."]);
    let app = common::create_test_app_with(model.clone(), None);

    let response = app
        .oneshot(post_json(
            "/functions/v1/adaptive-quiz",
            json!({"action": "generate_question", "topic": "Algebra", "mastery": 0.9}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "GENERATION_FAILED");
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn test_unknown_action_is_rejected() {
    let model = ScriptedModel::new();
    let app = common::create_test_app_with(model.clone(), None);

    let response = app
        .oneshot(post_json(
            "/functions/v1/adaptive-quiz",
            json!({"action": "delete_everything"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("Invalid action"));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = common::create_test_app_with(ScriptedModel::new(), None);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/functions/v1/adaptive-quiz")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_evaluate_answer_falls_back_and_records_incorrect() {
    let model = ScriptedModel::with_responses(["no verdict today"]);
    let store = RecordingStore::with_levels(Some(0.5), [0.45]);
    let app = common::create_test_app_with(model, Some(store.clone()));

    let response = app
        .oneshot(post_json(
            "/functions/v1/adaptive-quiz",
            json!({
                "action": "evaluate_answer",
                "question": "Capital of France?",
                "answer": "Lyon",
                "topic": "Geography",
                "userId": USER_ID,
                "topicId": TOPIC_ID,
                "mastery": 0.5
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["evaluation"]["score"], 0.0);
    assert_eq!(body["evaluation"]["feedback"], "Could not evaluate");
    assert_eq!(body["evaluation"]["correction"], "N/A");
    assert_eq!(body["evaluation"]["is_correct"], false);
    assert_eq!(body["newMastery"], 0.45);

    let calls = store.mastery_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].user_id, USER_ID);
    assert_eq!(calls[0].topic_id, TOPIC_ID);
    assert!(!calls[0].is_correct);
    assert!(store.streak_calls().is_empty());
}

#[tokio::test]
async fn test_correct_answer_bumps_streak() {
    let model = ScriptedModel::with_responses([evaluation_json(0.9, true)]);
    let store = RecordingStore::with_levels(Some(0.5), [0.6]);
    let app = common::create_test_app_with(model, Some(store.clone()));

    let response = app
        .oneshot(post_json(
            "/functions/v1/adaptive-quiz",
            json!({
                "action": "evaluate_answer",
                "question": "Capital of France?",
                "answer": "Paris",
                "topic": "Geography",
                "userId": USER_ID,
                "topicId": TOPIC_ID
            }),
        ))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["evaluation"]["is_correct"], true);
    assert_eq!(body["newMastery"], 0.6);
    assert_eq!(store.streak_calls(), vec![USER_ID.to_string()]);
}

#[tokio::test]
async fn test_store_failure_keeps_reported_mastery() {
    let model = ScriptedModel::with_responses([evaluation_json(0.8, true)]);
    let store = RecordingStore::failing();
    let app = common::create_test_app_with(model, Some(store.clone()));

    let response = app
        .oneshot(post_json(
            "/functions/v1/adaptive-quiz",
            json!({
                "action": "evaluate_answer",
                "question": "2 + 2?",
                "answer": "4",
                "topic": "Arithmetic",
                "userId": USER_ID,
                "topicId": TOPIC_ID,
                "mastery": 0.4
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["evaluation"]["is_correct"], true);
    assert_eq!(body["newMastery"], 0.4);
}

#[tokio::test]
async fn test_evaluate_answer_requires_ids() {
    let model = ScriptedModel::new();
    let app = common::create_test_app_with(model.clone(), None);

    let response = app
        .oneshot(post_json(
            "/functions/v1/adaptive-quiz",
            json!({
                "action": "evaluate_answer",
                "question": "2 + 2?",
                "answer": "4",
                "topic": "Arithmetic",
                "userId": " ",
                "topicId": TOPIC_ID
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_mastery_without_store_is_unavailable() {
    let app = common::create_test_app_with(ScriptedModel::new(), None);

    let response = app
        .oneshot(get(&format!("/api/mastery/{USER_ID}/{TOPIC_ID}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_mastery_view_reports_next_level() {
    let store = RecordingStore::with_mastery(0.72);
    let app = common::create_test_app_with(ScriptedModel::new(), Some(store));

    let response = app
        .oneshot(get(&format!("/api/mastery/{USER_ID}/{TOPIC_ID}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["masteryLevel"], 0.72);
    assert_eq!(body["data"]["label"], "Advanced");
    assert_eq!(body["data"]["nextLevel"], "hard");
    assert_eq!(body["data"]["exists"], true);
}

#[tokio::test]
async fn test_missing_mastery_starts_at_zero() {
    let store = RecordingStore::new();
    let app = common::create_test_app_with(ScriptedModel::new(), Some(store));

    let response = app
        .oneshot(get(&format!("/api/mastery/{USER_ID}/{TOPIC_ID}")))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["data"]["masteryLevel"], 0.0);
    assert_eq!(body["data"]["nextLevel"], "easy");
    assert_eq!(body["data"]["exists"], false);
}

#[tokio::test]
async fn test_leaderboard_honours_limit() {
    let store = RecordingStore::new();
    let app = common::create_test_app_with(ScriptedModel::new(), Some(store));

    let response = app.oneshot(get("/api/leaderboard?limit=2")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["username"], "learner0");
}

#[tokio::test]
async fn test_streak_defaults_to_zero() {
    let store = RecordingStore::new();
    let app = common::create_test_app_with(ScriptedModel::new(), Some(store));

    let response = app.oneshot(get(&format!("/api/streaks/{USER_ID}"))).await.unwrap();

    let body = body_json(response).await;
    assert_eq!(body["data"]["currentStreak"], 0);
    assert_eq!(body["data"]["userId"], USER_ID);
}

#[tokio::test]
async fn test_video_search_falls_back_on_model_error() {
    let model = ScriptedModel::new();
    model.push_err();
    let app = common::create_test_app_with(model, None);

    let response = app
        .oneshot(post_json(
            "/functions/v1/search-youtube-videos",
            json!({"topic": "Fractions", "level": "beginner"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["fallback"], true);
    assert_eq!(body["recommendation"]["videoId"], "u_nd9IVKoR4");
    assert_eq!(body["recommendation"]["title"], "Fractions - Khan Academy Tutorial");
}

#[tokio::test]
async fn test_video_search_returns_model_pick() {
    let model = ScriptedModel::with_responses([r#"```json
{"video": {"title": "Fractions for Beginners", "videoId": "abcDEF12345", "description": "Intro", "duration": "8 minutes"}}
```"#]);
    let app = common::create_test_app_with(model, None);

    let response = app
        .oneshot(post_json(
            "/functions/v1/search-youtube-videos",
            json!({"topic": "Fractions", "level": "beginner"}),
        ))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["recommendation"]["videoId"], "abcDEF12345");
    assert!(body.get("fallback").is_none());
}

#[tokio::test]
async fn test_generate_content() {
    let model = ScriptedModel::with_responses(["# Photosynthesis\n\nPlants turn light into sugar."]);
    let app = common::create_test_app_with(model.clone(), None);

    let response = app
        .oneshot(post_json(
            "/functions/v1/generate-pdf-content",
            json!({"topic": "Photosynthesis", "contentLevel": "advanced"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["content"].as_str().unwrap().starts_with("# Photosynthesis"));
    let prompt = &model.requests()[0].messages[0].content;
    assert!(prompt.contains("Content Level: advanced"));
    assert!(prompt.contains("User Preferences: No specific preferences provided"));
}

#[tokio::test]
async fn test_generate_content_requires_topic() {
    let model = ScriptedModel::new();
    let app = common::create_test_app_with(model.clone(), None);

    let response = app
        .oneshot(post_json(
            "/functions/v1/generate-pdf-content",
            json!({"topic": "   "}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(model.call_count(), 0);
}
