pub mod content;
pub mod llm_provider;
pub mod mastery_store;
pub mod videos;
