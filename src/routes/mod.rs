mod adaptive_quiz;
mod content;
mod health;
mod mastery;
mod videos;

use axum::http::{header, HeaderName, Method};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::response::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let healthcheck_endpoint = state.config().healthcheck_endpoint.clone();

    let mut app = Router::new()
        .nest("/functions/v1/adaptive-quiz", adaptive_quiz::router())
        .nest("/functions/v1/generate-pdf-content", content::router())
        .nest("/functions/v1/search-youtube-videos", videos::router())
        .nest("/api/mastery", mastery::mastery_router())
        .nest("/api/streaks", mastery::streak_router())
        .nest("/api/leaderboard", mastery::leaderboard_router());

    let mut health_paths: Vec<String> = vec!["/health".to_string()];
    if healthcheck_endpoint != "/" && !health_paths.contains(&healthcheck_endpoint) {
        health_paths.push(healthcheck_endpoint);
    }
    if !health_paths.iter().any(|path| path == "/api/health") {
        health_paths.push("/api/health".to_string());
    }

    for path in &health_paths {
        app = app.nest(path.as_str(), health::router());
    }

    app.fallback(fallback_handler).with_state(state)
}

/// Browser clients call the function routes cross-origin with the hosted client's headers.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

async fn fallback_handler() -> Response {
    AppError::not_found("Route not found").into_response()
}
