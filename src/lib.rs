pub mod config;
pub mod db;
pub mod logging;
pub mod quiz;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use std::sync::Arc;

use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::llm_provider::LLMProvider;
use crate::state::AppState;

/// Full HTTP surface over an already-wired state.
pub fn app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(routes::cors_layer())
}

pub async fn create_app() -> axum::Router {
    let db_proxy = match db::DatabaseProxy::from_env().await {
        Ok(proxy) => Some(proxy),
        Err(err) => {
            tracing::debug!(error = %err, "running without mastery persistence");
            None
        }
    };

    let state = AppState::new(Config::from_env(), db_proxy, Arc::new(LLMProvider::from_env()));
    app(state)
}
