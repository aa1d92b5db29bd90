//! Model interaction: the [`InferenceClient`] seam and its edgequake-llm adapter.
//!
//! The pipeline only ever talks to `dyn InferenceClient`, so the concrete
//! backend (an edgequake-llm provider such as `GeminiProvider`, or a test
//! fake) is chosen at construction time.
//!
//! Clients make exactly one call per `infer`. There is no retry here; a
//! failed call is terminal for that search.

use crate::config::SearchConfig;
use crate::error::LensError;
use crate::pipeline::encode::EncodedPayload;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Hint reported when the default Gemini backend has no API key.
pub const MISSING_GEMINI_KEY_HINT: &str = "Gemini API key is not configured";

/// A vision model that answers a prompt about one image.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Fail fast when the client cannot possibly make a call
    /// (e.g. no credential). Called before the image is transcoded.
    fn ensure_configured(&self) -> Result<(), LensError> {
        Ok(())
    }

    /// Send the image and prompt; return the model's raw text reply.
    async fn infer(&self, payload: &EncodedPayload, prompt: &str) -> Result<String, LensError>;
}

/// [`InferenceClient`] backed by an edgequake-llm [`LLMProvider`].
///
/// The prompt and the image travel together in a single user message. A
/// client built with [`ProviderClient::unconfigured`] has no provider yet and
/// reports that from `ensure_configured`.
pub struct ProviderClient {
    provider: Option<Arc<dyn LLMProvider>>,
    provider_name: String,
    missing_hint: String,
    options: CompletionOptions,
    timeout: Option<Duration>,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &SearchConfig) -> Self {
        Self {
            provider_name: provider.name().to_string(),
            provider: Some(provider),
            missing_hint: String::new(),
            options: build_options(config),
            timeout: config.api_timeout_secs.map(Duration::from_secs),
        }
    }

    /// A client that cannot call anything until it is given a credential.
    pub fn unconfigured(
        provider_name: impl Into<String>,
        hint: impl Into<String>,
        config: &SearchConfig,
    ) -> Self {
        Self {
            provider: None,
            provider_name: provider_name.into(),
            missing_hint: hint.into(),
            options: build_options(config),
            timeout: config.api_timeout_secs.map(Duration::from_secs),
        }
    }

    fn provider(&self) -> Result<&Arc<dyn LLMProvider>, LensError> {
        self.provider
            .as_ref()
            .ok_or_else(|| LensError::ProviderNotConfigured {
                provider: self.provider_name.clone(),
                hint: self.missing_hint.clone(),
            })
    }
}

#[async_trait]
impl InferenceClient for ProviderClient {
    fn ensure_configured(&self) -> Result<(), LensError> {
        self.provider().map(|_| ())
    }

    async fn infer(&self, payload: &EncodedPayload, prompt: &str) -> Result<String, LensError> {
        let provider = self.provider()?;
        let start = Instant::now();
        let image = ImageData::new(payload.data.clone(), payload.mime_type.clone());
        let messages = vec![ChatMessage::user_with_images(prompt, vec![image])];

        let call = provider.chat(&messages, Some(&self.options));
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                LensError::InferenceFailed {
                    message: format!("no reply within {}s", limit.as_secs()),
                }
            })?,
            None => call.await,
        };
        let response = result.map_err(|e| LensError::InferenceFailed {
            message: e.to_string(),
        })?;

        debug!(
            "{} replied: {} input tokens, {} output tokens, {:?}",
            self.provider_name,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// Build `CompletionOptions` from the search config.
fn build_options(config: &SearchConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgequake_llm::MockProvider;

    #[test]
    fn build_options_defaults() {
        let config = SearchConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(256));
    }

    struct Unconfigured;

    #[async_trait]
    impl InferenceClient for Unconfigured {
        fn ensure_configured(&self) -> Result<(), LensError> {
            Err(LensError::ProviderNotConfigured {
                provider: "fake".into(),
                hint: "no key".into(),
            })
        }

        async fn infer(&self, _: &EncodedPayload, _: &str) -> Result<String, LensError> {
            Ok("{}".into())
        }
    }

    struct AlwaysReady;

    #[async_trait]
    impl InferenceClient for AlwaysReady {
        async fn infer(&self, payload: &EncodedPayload, _: &str) -> Result<String, LensError> {
            Ok(payload.mime_type.clone())
        }
    }

    #[tokio::test]
    async fn default_ensure_configured_is_ok() {
        let client: Arc<dyn InferenceClient> = Arc::new(AlwaysReady);
        client.ensure_configured().unwrap();
        let payload = EncodedPayload {
            data: String::new(),
            mime_type: "image/png".into(),
        };
        assert_eq!(client.infer(&payload, "p").await.unwrap(), "image/png");
    }

    fn payload() -> EncodedPayload {
        EncodedPayload {
            data: "/9j/".into(),
            mime_type: "image/jpeg".into(),
        }
    }

    #[tokio::test]
    async fn provider_client_returns_model_text() {
        let mock = Arc::new(MockProvider::new());
        mock.add_response(r#"{"make":"Volvo"}"#).await;
        let client = ProviderClient::new(mock, &SearchConfig::default());

        client.ensure_configured().unwrap();
        assert_eq!(client.infer(&payload(), "prompt").await.unwrap(), r#"{"make":"Volvo"}"#);
    }

    #[tokio::test]
    async fn unconfigured_client_refuses_to_call() {
        let client =
            ProviderClient::unconfigured("gemini", MISSING_GEMINI_KEY_HINT, &SearchConfig::default());

        let err = client.ensure_configured().unwrap_err();
        assert!(err.to_string().contains(MISSING_GEMINI_KEY_HINT), "got: {err}");
        assert!(matches!(
            client.infer(&payload(), "prompt").await,
            Err(LensError::ProviderNotConfigured { .. })
        ));
    }

    #[test]
    fn override_reports_missing_configuration() {
        let client: Arc<dyn InferenceClient> = Arc::new(Unconfigured);
        assert!(matches!(
            client.ensure_configured(),
            Err(LensError::ProviderNotConfigured { .. })
        ));
    }
}
