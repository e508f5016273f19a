// OpenAI-compatible provider adapter
// Wraps the embeddings and chat-completions endpoints behind typed calls.


use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::OpenAiConfig;
use crate::{FolioError, Result};

const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// A single chat message in the wire format shared by the chat-completions
/// endpoint and this crate's responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    #[inline]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: EmbeddingsInput<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EmbeddingsInput<'a> {
    Single(&'a str),
    Batch(&'a [String]),
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible API providing embeddings and chat
/// completions. The underlying agent is blocking; async callers go through
/// the `embed`/`embed_batch`/`chat` wrappers which run on the blocking pool.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: Url,
    api_key: Option<String>,
    embedding_model: String,
    chat_model: String,
    embedding_dimension: usize,
    max_tokens: u32,
    temperature: f32,
    agent: ureq::Agent,
    retry_attempts: u32,
}

impl OpenAiClient {
    #[inline]
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let base_url = config
            .api_base_url()
            .map_err(|e| FolioError::Config(e.to_string()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_seconds)))
            .build()
            .into();

        Ok(Self {
            base_url,
            api_key: std::env::var(API_KEY_ENV_VAR).ok(),
            embedding_model: config.embedding_model.clone(),
            chat_model: config.chat_model.clone(),
            embedding_dimension: config.embedding_dimension as usize,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            agent,
            retry_attempts: config.retry_attempts,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    #[inline]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Expected length of every embedding vector produced by this client.
    #[inline]
    pub fn embedding_dimension(&self) -> usize {
        self.embedding_dimension
    }

    /// Generate an embedding for a single text input.
    #[inline]
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let client = self.clone();
        let text = text.to_string();
        run_blocking(move || client.embed_blocking(&text)).await
    }

    /// Generate embeddings for multiple texts in one provider call.
    /// The response is re-ordered to match the input order.
    #[inline]
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let client = self.clone();
        let texts = texts.to_vec();
        run_blocking(move || client.embed_batch_blocking(&texts)).await
    }

    /// Request a chat completion. Exactly one attempt is made; callers that
    /// need graceful degradation fall back on failure rather than retrying.
    #[inline]
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let client = self.clone();
        let messages = messages.to_vec();
        run_blocking(move || client.chat_blocking(&messages)).await
    }

    /// Check that the provider is reachable by listing available models.
    #[inline]
    pub async fn ping(&self) -> Result<()> {
        let client = self.clone();
        run_blocking(move || client.ping_blocking()).await
    }

    fn embed_blocking(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(FolioError::EmbeddingUnavailable(
                "Cannot embed empty text".to_string(),
            ));
        }

        debug!("Generating embedding for text (length: {})", text.len());

        let request = EmbeddingsRequest {
            model: &self.embedding_model,
            input: EmbeddingsInput::Single(text),
        };

        let response: EmbeddingsResponse = self
            .post_json_with_retry("embeddings", &request, self.retry_attempts)
            .map_err(FolioError::EmbeddingUnavailable)?;

        let mut data = response.data;
        if data.len() != 1 {
            return Err(FolioError::EmbeddingUnavailable(format!(
                "Expected 1 embedding in response, got {}",
                data.len()
            )));
        }

        let embedding = data.remove(0).embedding;
        self.check_dimension(embedding.len())?;

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }

    fn embed_batch_blocking(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!("Generating embeddings for {} texts", texts.len());

        let request = EmbeddingsRequest {
            model: &self.embedding_model,
            input: EmbeddingsInput::Batch(texts),
        };

        let response: EmbeddingsResponse = self
            .post_json_with_retry("embeddings", &request, self.retry_attempts)
            .map_err(FolioError::EmbeddingUnavailable)?;

        if response.data.len() != texts.len() {
            return Err(FolioError::EmbeddingUnavailable(format!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.data.len()
            )));
        }

        let mut data = response.data;
        data.sort_by_key(|d| d.index);

        let mut embeddings = Vec::with_capacity(data.len());
        for item in data {
            self.check_dimension(item.embedding.len())?;
            embeddings.push(item.embedding);
        }

        debug!("Generated {} embeddings total", embeddings.len());
        Ok(embeddings)
    }

    fn chat_blocking(&self, messages: &[ChatMessage]) -> Result<String> {
        debug!("Requesting chat completion with {} messages", messages.len());

        let request = ChatCompletionRequest {
            model: &self.chat_model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        // Single attempt: a failed generation triggers the deterministic
        // fallback instead of a retry loop.
        let response: ChatCompletionResponse = self
            .post_json_with_retry("chat/completions", &request, 1)
            .map_err(FolioError::GenerationUnavailable)?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(FolioError::GenerationUnavailable(
                "Chat completion response contained no content".to_string(),
            ));
        }

        Ok(content)
    }

    fn ping_blocking(&self) -> Result<()> {
        let url = self
            .base_url
            .join("models")
            .map_err(|e| FolioError::Config(format!("Failed to build models URL: {}", e)))?;

        debug!("Pinging provider at {}", url);

        self.make_request_with_retry(1, || {
            let mut request = self.agent.get(url.as_str());
            if let Some(key) = &self.api_key {
                request = request.header("Authorization", &format!("Bearer {}", key));
            }
            request
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
        .map_err(FolioError::EmbeddingUnavailable)?;

        debug!("Provider ping successful");
        Ok(())
    }

    fn check_dimension(&self, actual: usize) -> Result<()> {
        if actual != self.embedding_dimension {
            return Err(FolioError::EmbeddingUnavailable(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.embedding_dimension, actual
            )));
        }
        Ok(())
    }

    fn post_json_with_retry<Req, Resp>(
        &self,
        endpoint: &str,
        request: &Req,
        attempts: u32,
    ) -> std::result::Result<Resp, String>
    where
        Req: Serialize,
        Resp: for<'de> Deserialize<'de>,
    {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| format!("Failed to build {} URL: {}", endpoint, e))?;

        let request_json =
            serde_json::to_string(request).map_err(|e| format!("Failed to serialize request: {}", e))?;

        let response_text = self.make_request_with_retry(attempts, || {
            let mut builder = self
                .agent
                .post(url.as_str())
                .header("Content-Type", "application/json");
            if let Some(key) = &self.api_key {
                builder = builder.header("Authorization", &format!("Bearer {}", key));
            }
            builder
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        serde_json::from_str(&response_text)
            .map_err(|e| format!("Failed to parse {} response: {}", endpoint, e))
    }

    fn make_request_with_retry<F>(
        &self,
        attempts: u32,
        mut request_fn: F,
    ) -> std::result::Result<String, String>
    where
        F: FnMut() -> std::result::Result<String, ureq::Error>,
    {
        let attempts = attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            debug!("HTTP request attempt {}/{}", attempt, attempts);

            match request_fn() {
                Ok(response_text) => {
                    return Ok(response_text);
                }
                Err(error) => {
                    let should_retry = match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Server error (status {}), attempt {}/{}",
                                    status, attempt, attempts
                                );
                                true
                            } else {
                                warn!("Client error (status {}), not retrying", status);
                                return Err(format!("Client error: HTTP {}", status));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, attempts
                            );
                            true
                        }
                        _ => {
                            warn!("Non-retryable error: {}", error);
                            return Err(format!("Non-retryable error: {}", error));
                        }
                    };

                    if should_retry {
                        last_error = Some(format!("Request error: {}", error));
                    }

                    if attempt < attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        let delay = Duration::from_millis(delay_ms);
                        debug!("Waiting {:?} before retry", delay);
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| "Request failed after retries".to_string()))
    }
}

/// Run a blocking provider call without stalling the async runtime.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FolioError::Other(anyhow::anyhow!("Provider task failed: {}", e)))?
}
