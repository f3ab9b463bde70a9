use serde::{Deserialize, Serialize};

use crate::quiz::extract::json_object_slice;
use crate::services::llm_provider::{ChatMessage, CompletionModel, CompletionRequest};

const VIDEO_TEMPERATURE: f32 = 0.2;
const VIDEO_MAX_TOKENS: u32 = 800;
const VIDEO_ID_LEN: usize = 11;
const FALLBACK_VIDEO_ID: &str = "u_nd9IVKoR4";

const CURATOR_SYSTEM_PROMPT: &str = "You are an expert educational content curator specializing in finding \
high-quality YouTube educational videos. Always respond with valid JSON containing real YouTube video IDs \
from educational channels only. Never suggest music videos or non-educational content.";

const CHANNELS: &[&str] = &[
    "Khan Academy",
    "Math Antics",
    "Numberock",
    "MashUp Math",
    "Professor Leonard",
    "3Blue1Brown",
    "Crash Course",
    "TED-Ed",
    "Organic Chemistry Tutor",
    "Math & Learning Videos 4 Kids",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecommendation {
    pub title: String,
    pub video_id: String,
    pub description: String,
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    pub recommendation: VideoRecommendation,
    pub fallback: bool,
}

#[derive(Debug, Deserialize)]
struct RecommendationEnvelope {
    video: VideoRecommendation,
}

pub fn fallback_video(topic: &str, level: &str) -> VideoRecommendation {
    VideoRecommendation {
        title: format!("{topic} - Khan Academy Tutorial"),
        video_id: FALLBACK_VIDEO_ID.to_string(),
        description: format!(
            "A comprehensive introduction to {topic} concepts for {level} learners from Khan Academy"
        ),
        duration: "10-15 minutes".to_string(),
    }
}

fn is_plausible_video_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn video_prompt(topic: &str, level: &str) -> String {
    let channels = CHANNELS
        .iter()
        .map(|c| format!("- {c}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Find 1 high-quality YouTube educational video about "{topic}" suitable for {level} level learners.

Focus on these reputable educational channels:
{channels}

Provide exactly 1 recommendation in this JSON format:
{{
  "video": {{
    "title": "Clear, descriptive title about {topic}",
    "videoId": "real-youtube-video-id",
    "description": "Why this video suits {level} learners studying {topic}",
    "duration": "Approximate duration"
  }}
}}

The videoId must be a real 11-character YouTube video ID from an educational channel."#
    )
}

pub fn parse_recommendation(raw: &str) -> Option<VideoRecommendation> {
    let json = json_object_slice(raw)?;
    let envelope: RecommendationEnvelope = serde_json::from_str(json).ok()?;
    let video = envelope.video;
    (is_plausible_video_id(video.video_id.trim()) && !video.title.trim().is_empty()).then_some(
        VideoRecommendation {
            video_id: video.video_id.trim().to_string(),
            ..video
        },
    )
}

/// Always yields a video: any model or parse problem falls back to a fixed tutorial.
pub async fn recommend_video(
    model: &dyn CompletionModel,
    topic: &str,
    level: &str,
) -> RecommendationResult {
    let topic = if topic.trim().is_empty() { "Mathematics" } else { topic.trim() };
    let level = if level.trim().is_empty() { "beginner" } else { level.trim() };

    let request = CompletionRequest {
        messages: vec![
            ChatMessage::system(CURATOR_SYSTEM_PROMPT),
            ChatMessage::user(video_prompt(topic, level)),
        ],
        temperature: VIDEO_TEMPERATURE,
        max_tokens: VIDEO_MAX_TOKENS,
    };

    match model.complete(&request).await {
        Ok(raw) => match parse_recommendation(&raw) {
            Some(recommendation) => RecommendationResult { recommendation, fallback: false },
            None => {
                tracing::warn!(topic, "unusable video recommendation, using fallback");
                RecommendationResult { recommendation: fallback_video(topic, level), fallback: true }
            }
        },
        Err(err) => {
            tracing::warn!(topic, error = %err, "video recommendation failed, using fallback");
            RecommendationResult { recommendation: fallback_video(topic, level), fallback: true }
        }
    }
}
