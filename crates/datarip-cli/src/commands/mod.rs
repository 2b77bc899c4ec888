//! Command implementations.

pub mod columns;
pub mod compile;
pub mod job;
pub mod resume;
pub mod run;

pub use self::columns::execute_columns;
pub use self::compile::execute_compile;
pub use self::resume::execute_resume;
pub use self::run::execute_run;

use crate::config::ProviderConfig;
use crate::error::Result;
use datarip_llm::OpenAiProvider;

/// Build a provider for `model` from the provider settings.
pub fn build_provider(config: &ProviderConfig, model: &str) -> Result<OpenAiProvider> {
    let provider = OpenAiProvider::with_timeout(&config.endpoint, model, config.request_timeout())?
        .with_max_attempts(config.max_attempts);
    match config.api_key() {
        Some(key) => Ok(provider.with_api_key(key)),
        None => {
            tracing::warn!(
                "{} is not set; sending requests to {} without an API key",
                config.api_key_env,
                config.endpoint
            );
            Ok(provider)
        }
    }
}
