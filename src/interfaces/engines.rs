use async_trait::async_trait;
use serde::Deserialize;

use crate::domains::chat::EngineKind;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Signed affection change plus an optional mood, as decoded off the
/// provider wire. Providers encode the delta as a number or a "+N"
/// string; both forms decode here.
#[derive(Debug, Clone, Deserialize)]
pub struct EmotionDelta {
    #[serde(default, deserialize_with = "crate::services::parse::lenient_i64")]
    pub affection_delta: i64,
    #[serde(default)]
    pub mood: Option<String>,
}

/// Structured reply produced by an engine after wire-format decoding.
#[derive(Debug, Clone)]
pub struct EngineReply {
    pub dialogue: String,
    pub action: Option<String>,
    pub scene_description: Option<String>,
    pub emotion_delta: Option<EmotionDelta>,
    /// Provider text before extraction, kept for tracing.
    pub raw: String,
}

#[async_trait]
pub trait ChatEngine: Send + Sync {
    fn kind(&self) -> EngineKind;

    /// Generates and decodes one turn. Transport retries happen inside;
    /// an undecodable reply is an `UpstreamParse` error.
    async fn generate(&self, request: &GenerationRequest) -> Result<EngineReply>;
}
