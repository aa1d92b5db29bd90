//! Configuration for vehicle image search.
//!
//! All search behaviour is controlled through [`SearchConfig`], built via its
//! [`SearchConfigBuilder`]. The library never reads the environment: the API
//! credential and provider are handed in explicitly, so tests can swap in a
//! fake client and production code decides where secrets come from.

use crate::error::LensError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Largest accepted upload: 5 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Gemini model used when no model is configured for the Gemini backend.
/// Named providers fall back to their own default instead.
pub const DEFAULT_MODEL: &str = "gemini-flash-latest";

/// Configuration for an image search.
///
/// # Example
/// ```rust
/// use vehicle_lens::SearchConfig;
///
/// let config = SearchConfig::builder()
///     .api_key("test-key")
///     .model("gemini-2.0-flash")
///     .build()
///     .unwrap();
/// assert_eq!(config.model.as_deref(), Some("gemini-2.0-flash"));
/// ```
#[derive(Clone)]
pub struct SearchConfig {
    /// Gemini API key. Required unless `provider` or `provider_name` is set.
    pub api_key: Option<String>,

    /// Model identifier. Default: None, meaning `gemini-flash-latest` for the
    /// Gemini backend and the provider's own default for a named provider.
    pub model: Option<String>,

    /// Name of an edgequake-llm provider ("openai", "anthropic", …).
    /// When set, the provider factory reads its own credential.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over everything else.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Upload size ceiling in bytes (inclusive). Default: 5 MiB.
    pub max_upload_bytes: u64,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Classification wants the model's most likely answer, not variety.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 256.
    ///
    /// The reply is a four-key JSON object; 256 leaves room for a fence.
    pub max_tokens: usize,

    /// Parallel searches in batch mode. Default: 4.
    pub concurrency: usize,

    /// Per-call timeout for the model API. Default: None (no timeout).
    pub api_timeout_secs: Option<u64>,

    /// Download timeout for URL inputs in seconds. Default: 60.
    pub download_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            provider_name: None,
            provider: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            temperature: 0.1,
            max_tokens: 256,
            concurrency: 4,
            api_timeout_secs: None,
            download_timeout_secs: 60,
        }
    }
}

impl fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("concurrency", &self.concurrency)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl SearchConfig {
    /// Create a new builder for `SearchConfig`.
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder {
            config: Self::default(),
        }
    }

    /// Model for the Gemini backend: the configured one or [`DEFAULT_MODEL`].
    pub fn gemini_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`SearchConfig`].
#[derive(Debug)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        // An empty key is as good as none.
        self.config.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn max_upload_bytes(mut self, n: u64) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SearchConfig, LensError> {
        let c = &self.config;
        if c.max_upload_bytes == 0 {
            return Err(LensError::InvalidConfig(
                "max_upload_bytes must be > 0".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(LensError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(LensError::InvalidConfig("Model must not be empty".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = SearchConfig::default();
        assert_eq!(c.max_upload_bytes, 5 * 1024 * 1024);
        assert!(c.model.is_none());
        assert_eq!(c.gemini_model(), "gemini-flash-latest");
        assert!(c.api_key.is_none());
        assert!(c.api_timeout_secs.is_none());
    }

    #[test]
    fn builder_clamps() {
        let c = SearchConfig::builder()
            .temperature(5.0)
            .concurrency(0)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn named_provider_does_not_inherit_the_gemini_model() {
        let c = SearchConfig::builder().provider_name("openai").build().unwrap();
        assert!(c.model.is_none());

        let c = SearchConfig::builder()
            .provider_name("openai")
            .model("gpt-4.1-mini")
            .build()
            .unwrap();
        assert_eq!(c.model.as_deref(), Some("gpt-4.1-mini"));
    }

    #[test]
    fn blank_model_is_rejected() {
        let err = SearchConfig::builder().model("  ").build().unwrap_err();
        assert!(matches!(err, LensError::InvalidConfig(_)));
    }

    #[test]
    fn blank_api_key_is_treated_as_missing() {
        let c = SearchConfig::builder().api_key("   ").build().unwrap();
        assert!(c.api_key.is_none());
    }

    #[test]
    fn zero_upload_limit_is_rejected() {
        let err = SearchConfig::builder().max_upload_bytes(0).build().unwrap_err();
        assert!(matches!(err, LensError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = SearchConfig::builder().api_key("secret-123").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret-123"));
        assert!(dbg.contains("<redacted>"));
    }
}
