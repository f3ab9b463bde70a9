use thiserror::Error;

use crate::services::llm_provider::{CompletionModel, CompletionRequest, LLMError};

const CONTENT_TEMPERATURE: f32 = 0.7;
const CONTENT_MAX_TOKENS: u32 = 2000;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("topic must not be empty")]
    EmptyTopic,
    #[error("completion request failed: {0}")]
    Model(#[from] LLMError),
    #[error("model returned no content")]
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentRequest {
    pub topic: String,
    pub content_level: String,
    pub preferences: String,
}

pub fn content_prompt(request: &ContentRequest) -> String {
    let ContentRequest { topic, content_level, preferences } = request;
    format!(
        r#"Generate comprehensive educational content for the topic: "{topic}"

Content Level: {content_level}
User Preferences: {preferences}

Please create detailed, well-structured content that includes:
- Clear explanations appropriate for {content_level} level
- Real-world examples and applications
- Key concepts and definitions
- Practice exercises or examples
- Summary points

Format the content with proper headings, subheadings, and bullet points.
Make it comprehensive enough for a PDF document (minimum 1000 words).
Tailor the complexity and examples to the {content_level} level and to these preferences: {preferences}"#
    )
}

/// Free-text study material for one topic; the only contract is "non-empty".
pub async fn generate_personalized_content(
    model: &dyn CompletionModel,
    request: &ContentRequest,
) -> Result<String, ContentError> {
    if request.topic.trim().is_empty() {
        return Err(ContentError::EmptyTopic);
    }

    let completion = CompletionRequest::user_prompt(
        content_prompt(request),
        CONTENT_TEMPERATURE,
        CONTENT_MAX_TOKENS,
    );
    let content = model.complete(&completion).await?;
    if content.trim().is_empty() {
        return Err(ContentError::Empty);
    }

    tracing::info!(topic = %request.topic, level = %request.content_level, chars = content.len(), "generated content");
    Ok(content)
}
