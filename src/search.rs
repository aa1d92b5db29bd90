//! Search entry points: the [`ExtractionPipeline`] and one-shot helpers.
//!
//! ## Two result channels
//!
//! `run` returns `Result<PipelineOutcome, ImageSearchError>`:
//!
//! * `Err(_)` — the request could not be processed at all: invalid upload,
//!   missing credential, unreadable file, model API failure. The message is
//!   prefixed with `"Image search failed: "`.
//! * `Ok(PipelineOutcome::Failure { .. })` — everything worked but the model's
//!   reply for this image was not usable JSON. The user can retry with a
//!   clearer photo.
//! * `Ok(PipelineOutcome::Success(_))` — all four attributes, possibly
//!   defaulted.
//!
//! Runs share no mutable state; one pipeline can serve any number of
//! concurrent searches.

use crate::config::{SearchConfig, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_MODEL};
use crate::error::{ImageSearchError, LensError};
use crate::output::PipelineOutcome;
use crate::pipeline::input::{self, UploadArtifact};
use crate::pipeline::llm::{InferenceClient, ProviderClient, MISSING_GEMINI_KEY_HINT};
use crate::pipeline::{encode, parse, validate};
use crate::prompts;
use edgequake_llm::{GeminiProvider, ProviderFactory, ProviderType};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Validate → encode → infer → parse, for one upload at a time.
#[derive(Clone)]
pub struct ExtractionPipeline {
    client: Arc<dyn InferenceClient>,
    max_upload_bytes: u64,
    concurrency: usize,
}

impl std::fmt::Debug for ExtractionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionPipeline")
            .field("client", &"<dyn InferenceClient>")
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl ExtractionPipeline {
    /// Pipeline over an explicit client with default limits.
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self {
            client,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            concurrency: 4,
        }
    }

    /// Pipeline whose client is resolved from `config`.
    pub fn from_config(config: &SearchConfig) -> Result<Self, LensError> {
        Ok(Self {
            client: resolve_client(config)?,
            max_upload_bytes: config.max_upload_bytes,
            concurrency: config.concurrency.max(1),
        })
    }

    pub fn with_max_upload_bytes(mut self, n: u64) -> Self {
        self.max_upload_bytes = n.max(1);
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Extract vehicle attributes from one upload.
    ///
    /// # Errors
    /// Returns `Err(ImageSearchError)` for hard failures only; an unreadable
    /// model reply is `Ok(PipelineOutcome::Failure { .. })`.
    pub async fn run(
        &self,
        artifact: Option<UploadArtifact>,
    ) -> Result<PipelineOutcome, ImageSearchError> {
        self.run_stages(artifact.as_ref()).await.map_err(|e| {
            error!("Image search failed: {}", e);
            ImageSearchError::from(e)
        })
    }

    async fn run_stages(
        &self,
        artifact: Option<&UploadArtifact>,
    ) -> Result<PipelineOutcome, LensError> {
        let start = Instant::now();

        // ── Step 1: Validate upload ──────────────────────────────────────
        let artifact = validate::validate(artifact, self.max_upload_bytes)?;
        info!(
            "Starting image search: {} ({} bytes)",
            artifact.media_type, artifact.byte_size
        );

        // ── Step 2: Check the client can make a call ─────────────────────
        self.client.ensure_configured()?;

        // ── Step 3: Encode to base64 ─────────────────────────────────────
        let payload = encode::encode(artifact, self.max_upload_bytes)?;

        // ── Step 4: Ask the model ────────────────────────────────────────
        let raw = self.client.infer(&payload, prompts::build_prompt()).await?;
        drop(payload);

        // ── Step 5: Parse the reply ──────────────────────────────────────
        match parse::parse_response(&raw) {
            Ok(attrs) => {
                if !attrs.confidence_in_range() {
                    warn!(
                        "Model confidence {} is outside [0, 1]; passing it through",
                        attrs.confidence
                    );
                }
                info!(
                    "Image search complete: make='{}' body='{}' color='{}' confidence={} in {}ms",
                    attrs.make,
                    attrs.body_type,
                    attrs.color,
                    attrs.confidence,
                    start.elapsed().as_millis()
                );
                Ok(PipelineOutcome::Success(attrs))
            }
            Err(cause) => {
                error!("Failed to parse AI response: {}", cause);
                debug!("Raw response: {}", raw);
                Ok(PipelineOutcome::unreadable(cause))
            }
        }
    }

    /// Run several independent searches, at most `concurrency` at a time.
    ///
    /// Results come back in input order; each keeps its own channel.
    pub async fn run_many(
        &self,
        artifacts: Vec<UploadArtifact>,
    ) -> Vec<Result<PipelineOutcome, ImageSearchError>> {
        stream::iter(artifacts)
            .map(|artifact| self.run(Some(artifact)))
            .buffered(self.concurrency)
            .collect()
            .await
    }
}

/// One-shot search over an in-memory or file-backed upload.
pub async fn search_image(
    artifact: UploadArtifact,
    config: &SearchConfig,
) -> Result<PipelineOutcome, ImageSearchError> {
    ExtractionPipeline::from_config(config)?
        .run(Some(artifact))
        .await
}

/// Search a local path or http(s) URL.
pub async fn search_input(
    input_str: impl AsRef<str>,
    config: &SearchConfig,
) -> Result<PipelineOutcome, ImageSearchError> {
    let pipeline = ExtractionPipeline::from_config(config)?;
    search_with(&pipeline, input_str.as_ref(), config.download_timeout_secs).await
}

/// Search many paths/URLs concurrently, returning results in input order.
///
/// # Errors
/// The outer `Err` means no search could start (client resolution failed).
pub async fn search_many<S: AsRef<str>>(
    inputs: &[S],
    config: &SearchConfig,
) -> Result<Vec<Result<PipelineOutcome, ImageSearchError>>, ImageSearchError> {
    let pipeline = ExtractionPipeline::from_config(config)?;
    let timeout = config.download_timeout_secs;
    let pipeline = &pipeline;

    Ok(stream::iter(inputs.iter())
        .map(|input_str| search_with(pipeline, input_str.as_ref(), timeout))
        .buffered(config.concurrency.max(1))
        .collect()
        .await)
}

/// Synchronous wrapper around [`search_image`].
///
/// Creates a temporary tokio runtime internally.
pub fn search_sync(
    artifact: UploadArtifact,
    config: &SearchConfig,
) -> Result<PipelineOutcome, ImageSearchError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| LensError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(search_image(artifact, config))
}

async fn search_with(
    pipeline: &ExtractionPipeline,
    input_str: &str,
    download_timeout_secs: u64,
) -> Result<PipelineOutcome, ImageSearchError> {
    let limit = pipeline.max_upload_bytes;
    let artifact = input::resolve_input(input_str, download_timeout_secs, limit)
        .await
        .map_err(|e| {
            error!("Image search failed for '{}': {}", input_str, e);
            ImageSearchError::from(e)
        })?;
    pipeline.run(Some(artifact)).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the inference client, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`) — used as-is.
/// 2. **Gemini with an explicit key** (`config.api_key`, with no provider
///    name or the name `gemini`) — a `GeminiProvider` on that key.
/// 3. **Named provider** (`config.provider_name`) — built by
///    [`ProviderFactory::create_with_model`]; the factory reads that
///    provider's own credential.
/// 4. **Gemini without a key** — a client that raises
///    `ProviderNotConfigured` when a search runs, not here.
fn resolve_client(config: &SearchConfig) -> Result<Arc<dyn InferenceClient>, LensError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::new(ProviderClient::new(Arc::clone(provider), config)));
    }

    let named = match config.provider_name.as_deref() {
        Some(name) => Some(
            ProviderType::from_str(name)
                .ok_or_else(|| LensError::InvalidConfig(format!("Unknown LLM provider: {name}")))?,
        ),
        None => None,
    };

    if matches!(named, None | Some(ProviderType::Gemini)) {
        if let Some(ref key) = config.api_key {
            let provider = GeminiProvider::new(key.as_str()).with_model(config.gemini_model());
            return Ok(Arc::new(ProviderClient::new(Arc::new(provider), config)));
        }
    }

    match named {
        Some(provider_type) => {
            let (provider, _) =
                ProviderFactory::create_with_model(provider_type, model_for(config, provider_type))
                    .map_err(|e| LensError::ProviderNotConfigured {
                        provider: config.provider_name.clone().unwrap_or_default(),
                        hint: e.to_string(),
                    })?;
            Ok(Arc::new(ProviderClient::new(provider, config)))
        }
        None => Ok(Arc::new(ProviderClient::unconfigured(
            "gemini",
            MISSING_GEMINI_KEY_HINT,
            config,
        ))),
    }
}

/// Model for a named provider. `None` lets the provider pick its default;
/// the Gemini model id is only ever sent to Gemini.
fn model_for(config: &SearchConfig, provider_type: ProviderType) -> Option<&str> {
    config
        .model
        .as_deref()
        .or((provider_type == ProviderType::Gemini).then_some(DEFAULT_MODEL))
}
