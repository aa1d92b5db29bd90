//! Error types for the vehicle-lens library.
//!
//! Two distinct result channels reflect two distinct failure modes:
//!
//! * [`LensError`] / [`ImageSearchError`] — **Hard**: the request could not be
//!   processed at all (bad upload, provider not configured, the model API
//!   failed). Returned as `Err(ImageSearchError)` from
//!   [`crate::search::ExtractionPipeline::run`], whose message carries the
//!   `"Image search failed: "` prefix.
//!
//! * [`ParseError`] — **Soft**: the pipeline worked, but the model's reply for
//!   this particular image could not be interpreted. Carried inside
//!   [`crate::output::PipelineOutcome::Failure`] so the caller can ask the user
//!   to try again with a clearer photo.

use std::path::PathBuf;
use thiserror::Error;

/// Every hard failure a pipeline stage can produce.
///
/// Input errors are raised before any network call is made.
#[derive(Debug, Error)]
pub enum LensError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No upload was supplied.
    #[error("No file provided")]
    MissingInput,

    /// Media type is empty or not an `image/*` type.
    #[error("Invalid file type '{media_type}'. Please upload an image file.")]
    InvalidMediaType { media_type: String },

    /// Declared upload size is above the configured ceiling.
    #[error("File size too large ({size} bytes). Please upload an image smaller than {limit} bytes.")]
    PayloadTooLarge { size: u64, limit: u64 },

    /// Input path does not exist.
    #[error("Image file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Reading the upload content failed while transcoding.
    #[error("Failed to read image '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Model errors ──────────────────────────────────────────────────────
    /// No credential or provider is available for the inference call.
    #[error("LLM provider '{provider}' is not configured: {hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The model API call failed; `message` keeps the underlying cause.
    #[error("Failed to analyze image with AI: {message}")]
    InferenceFailed { message: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LensError {
    /// `true` for errors caused by the upload itself rather than the system.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            LensError::MissingInput
                | LensError::InvalidMediaType { .. }
                | LensError::PayloadTooLarge { .. }
                | LensError::FileNotFound { .. }
        )
    }
}

/// A hard failure raised by the extraction pipeline.
///
/// Displays as `Image search failed: <cause>`.
#[derive(Debug, Error)]
#[error("Image search failed: {source}")]
pub struct ImageSearchError {
    #[from]
    source: LensError,
}

impl ImageSearchError {
    /// The underlying stage error.
    pub fn kind(&self) -> &LensError {
        &self.source
    }

    pub fn into_inner(self) -> LensError {
        self.source
    }
}

/// A model reply that could not be turned into attributes.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum ParseError {
    /// The cleaned text is not valid JSON.
    #[error("model response is not valid JSON: {detail}")]
    InvalidJson { detail: String },

    /// The JSON value is valid but not an object.
    #[error("model response is a JSON {found}, expected an object")]
    NotAnObject { found: String },
}
