use std::time::Duration;

use async_openai::types::chat::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
};
use async_trait::async_trait;
use rand::RngExt;
use reqwest::StatusCode;
use tracing::warn;

use crate::domains::chat::EngineKind;
use crate::error::{CoreError, Result};
use crate::interfaces::engines::{ChatEngine, EngineReply, GenerationRequest};
use crate::services::parse::decode_reply;

// Initial request plus three retries, backed off 100/400/1600 ms.
const MAX_ATTEMPTS: u32 = 4;
const BACKOFF_BASE_MS: u64 = 100;
const JITTER_MS: u64 = 100;

/// Chat engine backed by an OpenAI-compatible chat-completions endpoint.
/// Both the safe and the adult upstream speak this wire format; only the
/// base URL, key and model differ.
pub struct RemoteEngine {
    kind: EngineKind,
    model: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl RemoteEngine {
    pub fn safe(api_key: String, base_url: String, model: String) -> Self {
        Self::new(EngineKind::Safe, api_key, base_url, model)
    }

    pub fn adult(api_key: String, base_url: String, model: String) -> Self {
        Self::new(EngineKind::Adult, api_key, base_url, model)
    }

    fn new(kind: EngineKind, api_key: String, base_url: String, model: String) -> Self {
        Self {
            kind,
            model,
            api_key,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn build_request(&self, request: &GenerationRequest) -> Result<CreateChatCompletionRequest> {
        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system_prompt.clone())
            .build()
            .map_err(|e| CoreError::Internal(format!("system message build failed: {e}")))?;
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(request.user_prompt.clone())
            .build()
            .map_err(|e| CoreError::Internal(format!("user message build failed: {e}")))?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model);
        builder.messages(vec![system.into(), user.into()]);
        builder.temperature(request.temperature);
        builder.max_completion_tokens(request.max_tokens);
        builder
            .build()
            .map_err(|e| CoreError::Internal(format!("completion request build failed: {e}")))
    }

    /// Sends the completion request with bounded retries. Retries cover
    /// transport failures, 429 and 5xx; any other 4xx fails immediately
    /// since resending the same payload cannot change the answer.
    async fn raw_chat_completion(&self, request: &CreateChatCompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let provider = self.kind.as_str();
        let mut last_error = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let backoff = BACKOFF_BASE_MS * 4u64.pow(attempt - 1);
                let jitter = rand::rng().random_range(0..JITTER_MS);
                tokio::time::sleep(Duration::from_millis(backoff + jitter)).await;
            }

            let response = match self
                .client
                .post(url.clone())
                .bearer_auth(&self.api_key)
                .json(request)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(provider, attempt, error = %e, "completion transport failed");
                    last_error = Some(CoreError::Upstream {
                        provider: provider.to_string(),
                        message: format!("transport failed: {e}"),
                    });
                    continue;
                }
            };

            let status = response.status();
            let body = response.text().await.map_err(|e| CoreError::Upstream {
                provider: provider.to_string(),
                message: format!("response read failed: {e}"),
            })?;

            if status == StatusCode::OK {
                let parsed: CreateChatCompletionResponse = serde_json::from_str(&body)
                    .map_err(|e| {
                        CoreError::UpstreamParse(format!("completion decode failed: {e}"))
                    })?;
                return parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .filter(|content| !content.trim().is_empty())
                    .ok_or_else(|| {
                        CoreError::UpstreamParse("completion had no message content".to_string())
                    });
            }

            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if !retryable {
                return Err(CoreError::Upstream {
                    provider: provider.to_string(),
                    message: format!("completion failed ({status}): {body}"),
                });
            }
            warn!(provider, attempt, %status, "completion failed, will retry");
            last_error = Some(CoreError::Upstream {
                provider: provider.to_string(),
                message: format!("completion failed ({status}): {body}"),
            });
        }

        Err(last_error.unwrap_or_else(|| CoreError::Upstream {
            provider: provider.to_string(),
            message: "completion failed after retries".to_string(),
        }))
    }
}

#[async_trait]
impl ChatEngine for RemoteEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<EngineReply> {
        let wire = self.build_request(request)?;
        let raw = self.raw_chat_completion(&wire).await?;
        decode_reply(&raw)
    }
}
