//! Configuration for GeminiModel.

use model_core::ModelError;
use std::env;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default block threshold for the safety filters.
pub const DEFAULT_BLOCK_THRESHOLD: &str = "BLOCK_LOW_AND_ABOVE";

/// Harm categories filtered on every request.
pub const FILTERED_CATEGORIES: [&str; 2] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
];

/// Configuration for GeminiModel.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API base URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// Optional system instruction.
    pub system_prompt: Option<String>,

    /// Maximum tokens for response.
    pub max_output_tokens: Option<u32>,

    /// Temperature for generation (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Block threshold applied to [`FILTERED_CATEGORIES`].
    pub block_threshold: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            max_output_tokens: None,
            temperature: None,
            block_threshold: DEFAULT_BLOCK_THRESHOLD.to_string(),
        }
    }
}

impl GeminiConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `GEMINI_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `GEMINI_API_URL` - API URL (default: https://generativelanguage.googleapis.com)
    /// - `GEMINI_MODEL` - Model name (default: gemini-1.5-flash)
    /// - `GEMINI_SYSTEM_PROMPT` - System instruction
    /// - `GEMINI_MAX_OUTPUT_TOKENS` - Max output tokens
    /// - `GEMINI_TEMPERATURE` - Temperature
    /// - `GEMINI_BLOCK_THRESHOLD` - Safety threshold (default: BLOCK_LOW_AND_ABOVE)
    pub fn from_env() -> Result<Self, ModelError> {
        let api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ModelError::Configuration("GEMINI_API_KEY not set".to_string()))?;

        let api_url = env::var("GEMINI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let system_prompt = env::var("GEMINI_SYSTEM_PROMPT")
            .ok()
            .filter(|prompt| !prompt.trim().is_empty());

        let max_output_tokens = env::var("GEMINI_MAX_OUTPUT_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok());

        let temperature = env::var("GEMINI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok());

        let block_threshold = env::var("GEMINI_BLOCK_THRESHOLD")
            .unwrap_or_else(|_| DEFAULT_BLOCK_THRESHOLD.to_string());

        Ok(Self {
            api_url,
            api_key,
            model,
            system_prompt,
            max_output_tokens,
            temperature,
            block_threshold,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> GeminiConfigBuilder {
        GeminiConfigBuilder::default()
    }

    /// URL of the streaming endpoint for the configured model.
    pub fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// Builder for GeminiConfig.
#[derive(Debug, Default)]
pub struct GeminiConfigBuilder {
    config: GeminiConfig,
}

impl GeminiConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the system instruction.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Set the max output tokens.
    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.config.max_output_tokens = Some(tokens);
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Set the safety block threshold.
    pub fn block_threshold(mut self, threshold: impl Into<String>) -> Self {
        self.config.block_threshold = threshold.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GeminiConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeminiConfig::default();

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.api_key.is_empty());
        assert_eq!(config.model, "gemini-1.5-flash");
        assert!(config.system_prompt.is_none());
        assert_eq!(config.block_threshold, "BLOCK_LOW_AND_ABOVE");
    }

    #[test]
    fn test_builder_all_options() {
        let config = GeminiConfig::builder()
            .api_key("my-key")
            .api_url("https://custom.api.com/")
            .model("gemini-1.5-pro")
            .system_prompt("Be brief")
            .max_output_tokens(256)
            .temperature(0.3)
            .block_threshold("BLOCK_ONLY_HIGH")
            .build();

        assert_eq!(config.api_key, "my-key");
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.system_prompt.as_deref(), Some("Be brief"));
        assert_eq!(config.max_output_tokens, Some(256));
        assert_eq!(config.temperature, Some(0.3));
        assert_eq!(config.block_threshold, "BLOCK_ONLY_HIGH");
        assert_eq!(
            config.stream_url(),
            "https://custom.api.com/v1beta/models/gemini-1.5-pro:streamGenerateContent?alt=sse"
        );
    }

    // Environment-based tests are combined into a single test to avoid
    // race conditions when tests run in parallel (env vars are process-global).
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_all_gemini_vars() {
            for var in [
                "GEMINI_API_KEY",
                "GEMINI_API_URL",
                "GEMINI_MODEL",
                "GEMINI_SYSTEM_PROMPT",
                "GEMINI_MAX_OUTPUT_TOKENS",
                "GEMINI_TEMPERATURE",
                "GEMINI_BLOCK_THRESHOLD",
            ] {
                std::env::remove_var(var);
            }
        }

        // Missing API key should error
        clear_all_gemini_vars();
        match GeminiConfig::from_env() {
            Err(ModelError::Configuration(msg)) => assert!(msg.contains("GEMINI_API_KEY")),
            other => panic!("Expected Configuration error, got {:?}", other),
        }

        // Only API key set, defaults used
        clear_all_gemini_vars();
        std::env::set_var("GEMINI_API_KEY", "env-key");
        let config = GeminiConfig::from_env().unwrap();
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.max_output_tokens.is_none());

        // Overrides
        std::env::set_var("GEMINI_MODEL", "gemini-2.0-flash");
        std::env::set_var("GEMINI_MAX_OUTPUT_TOKENS", "512");
        std::env::set_var("GEMINI_TEMPERATURE", "0.9");
        let config = GeminiConfig::from_env().unwrap();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.max_output_tokens, Some(512));
        assert_eq!(config.temperature, Some(0.9));

        clear_all_gemini_vars();
    }
}
