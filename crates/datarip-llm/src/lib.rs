//! Datarip LLM Provider Layer
//!
//! Pluggable implementations of the `LlmProvider` trait from `datarip-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OpenAiProvider`: OpenAI-compatible `/chat/completions` API (also works
//!   against local servers that expose the same surface)
//!
//! # Examples
//!
//! ```
//! use datarip_llm::MockProvider;
//! use datarip_domain::ChatMessage;
//! use datarip_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate(&[ChatMessage::user("test prompt")]).unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod openai;

use datarip_domain::traits::LlmProvider as LlmProviderTrait;
use datarip_domain::{ChatMessage, Role, ToolDescriptor};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// A request seen by the [`MockProvider`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Messages sent
    pub messages: Vec<ChatMessage>,

    /// Name of the forced tool, for tool-call requests
    pub tool: Option<String>,
}

/// Mock LLM provider for deterministic testing
///
/// Responses are keyed by the content of the last user message; anything
/// without a specific response gets the default. Tool calls use the same
/// table, the response being the raw arguments JSON.
///
/// # Examples
///
/// ```
/// use datarip_llm::MockProvider;
/// use datarip_domain::ChatMessage;
/// use datarip_domain::traits::LlmProvider;
///
/// let provider = MockProvider::default();
/// provider.add_response("Alice is 30", r#"{"name": "Alice", "age": 30}"#);
/// let out = provider.generate(&[ChatMessage::user("Alice is 30")]).unwrap();
/// assert!(out.contains("Alice"));
/// assert_eq!(provider.call_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, String>>>,
    errors: Arc<Mutex<HashSet<String>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            errors: Arc::new(Mutex::new(HashSet::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Sleep this long inside every call (simulates a slow provider)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a specific response for a given user message
    pub fn add_response(&self, user_message: impl Into<String>, response: impl Into<String>) {
        lock(&self.responses).insert(user_message.into(), response.into());
    }

    /// Configure to return an error for a specific user message
    pub fn add_error(&self, user_message: impl Into<String>) {
        lock(&self.errors).insert(user_message.into());
    }

    /// Get the number of calls made
    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Every request seen so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Forget recorded requests
    pub fn reset_call_count(&self) {
        lock(&self.requests).clear();
    }

    fn respond(
        &self,
        messages: &[ChatMessage],
        tool: Option<&ToolDescriptor>,
    ) -> Result<String, LlmError> {
        lock(&self.requests).push(RecordedRequest {
            messages: messages.to_vec(),
            tool: tool.map(|t| t.name.clone()),
        });

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let key = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        if lock(&self.errors).contains(key) {
            return Err(LlmError::Other("Mock error".to_string()));
        }

        Ok(lock(&self.responses)
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.default_response.clone()))
    }
}

/// Lock a mock table, recovering the data if a panicking test poisoned it
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, messages: &[ChatMessage]) -> Result<String, Self::Error> {
        self.respond(messages, None)
    }

    fn generate_tool_call(
        &self,
        messages: &[ChatMessage],
        tool: &ToolDescriptor,
    ) -> Result<String, Self::Error> {
        self.respond(messages, Some(tool))
    }
}
