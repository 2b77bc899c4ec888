//! OpenAI-compatible Provider Implementation
//!
//! Talks to any server exposing the `/chat/completions` surface: the hosted
//! OpenAI API, or a local model server with an OpenAI-compatible endpoint.
//!
//! # Features
//!
//! - Async HTTP communication with a blocking trait wrapper
//! - Forced tool calls for structured extraction
//! - Configurable endpoint, model, API key and timeout
//! - Optional extra attempts on transport failures (a single attempt by default)
//!
//! # Examples
//!
//! ```no_run
//! use datarip_llm::OpenAiProvider;
//!
//! let provider = OpenAiProvider::new("https://api.openai.com/v1", "gpt-4o-mini")
//!     .unwrap()
//!     .with_api_key("sk-...");
//! ```

use crate::LlmError;
use datarip_domain::traits::LlmProvider as LlmProviderTrait;
use datarip_domain::{ChatMessage, ToolDescriptor};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default timeout for one HTTP request (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of attempts per call (no retries)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// Provider for OpenAI-compatible chat-completion APIs
pub struct OpenAiProvider {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
    max_attempts: u32,
}

/// Request body for the chat completions API
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<[ToolSpec<'a>; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice<'a>>,
}

#[derive(Serialize)]
struct ToolSpec<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolDescriptor,
}

#[derive(Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: ToolChoiceFunction<'a>,
}

#[derive(Serialize)]
struct ToolChoiceFunction<'a> {
    name: &'a str,
}

/// Response from the chat completions API
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String,
}

impl OpenAiProvider {
    /// Create a new provider with the default timeout
    ///
    /// # Parameters
    ///
    /// - `endpoint`: API base URL (e.g., "https://api.openai.com/v1")
    /// - `model`: Model to use (e.g., "gpt-4o", "gpt-4o-mini")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new provider with an explicit request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        // Calls run on short-lived runtimes, so pooled connections would outlive them
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            client,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Create a provider against the hosted API
    pub fn default_endpoint(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the bearer token
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the number of attempts on transport failures (minimum 1)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Model name used for requests
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Plain chat completion
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The server is unreachable or returns an error status
    /// - The model is not available
    /// - The response has no choices or no text content
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            tools: None,
            tool_choice: None,
        };

        let message = self.send(&request).await?;
        message
            .content
            .ok_or_else(|| LlmError::InvalidResponse("Completion has no text content".to_string()))
    }

    /// Chat completion forced to call `tool`; returns the raw arguments JSON
    pub async fn chat_with_tool(
        &self,
        messages: &[ChatMessage],
        tool: &ToolDescriptor,
    ) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            tools: Some([ToolSpec {
                kind: "function",
                function: tool,
            }]),
            tool_choice: Some(ToolChoice {
                kind: "function",
                function: ToolChoiceFunction { name: &tool.name },
            }),
        };

        let message = self.send(&request).await?;
        let call = message
            .tool_calls
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("Completion has no tool call".to_string()))?;

        if call.function.name != tool.name {
            return Err(LlmError::InvalidResponse(format!(
                "Expected call to '{}', got '{}'",
                tool.name, call.function.name
            )));
        }

        Ok(call.function.arguments)
    }

    async fn send(&self, request: &ChatRequest<'_>) -> Result<ResponseMessage, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_attempts {
            let mut builder = self.client.post(&url).json(request);
            if let Some(key) = &self.api_key {
                builder = builder.bearer_auth(key);
            }

            match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response.json::<ChatResponse>().await.map_err(|e| {
                            LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
                        })?;
                        return body
                            .choices
                            .into_iter()
                            .next()
                            .map(|choice| choice.message)
                            .ok_or_else(|| {
                                LlmError::InvalidResponse("Response has no choices".to_string())
                            });
                    } else if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(self.model.clone()));
                    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        return Err(LlmError::RateLimitExceeded);
                    } else {
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        last_error = Some(LlmError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                        if status.is_client_error() {
                            break;
                        }
                    }
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_attempts {
                // Exponential backoff: 1s, 2s, 4s, etc.
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                warn!("Request to {} failed, retrying in {:?}", url, delay);
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("Max attempts exceeded".to_string())))
    }
}

/// Drive a provider future to completion from blocking code
fn block_on<F: Future>(future: F) -> Result<F::Output, LlmError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?;
    Ok(runtime.block_on(future))
}

impl LlmProviderTrait for OpenAiProvider {
    type Error = LlmError;

    fn generate(&self, messages: &[ChatMessage]) -> Result<String, Self::Error> {
        debug!("Chat completion with {} ({} messages)", self.model, messages.len());
        block_on(self.chat(messages))?
    }

    fn generate_tool_call(
        &self,
        messages: &[ChatMessage],
        tool: &ToolDescriptor,
    ) -> Result<String, Self::Error> {
        debug!("Tool call '{}' with {}", tool.name, self.model);
        block_on(self.chat_with_tool(messages, tool))?
    }
}
