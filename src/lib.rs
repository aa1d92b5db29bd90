//! # vehicle-lens
//!
//! Turn a vehicle photo into search attributes (make, body type, color and a
//! confidence score) using a Vision Language Model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Validate  media type must be image/*, size ≤ 5 MiB
//!  ├─ 2. Encode    bytes → base64
//!  ├─ 3. VLM       one call with the fixed extraction prompt
//!  ├─ 4. Parse     strip fences, strict JSON, per-field defaults
//!  └─ 5. Outcome   {success, data} or {success: false, error}
//! ```
//!
//! Hard failures (bad upload, missing API key, model API down) come back as
//! `Err(ImageSearchError)`. A reply the parser cannot read comes back as
//! `Ok(PipelineOutcome::Failure { .. })` asking the user for a clearer image.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vehicle_lens::{search_image, SearchConfig, UploadArtifact};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SearchConfig::builder()
//!         .api_key(std::env::var("GEMINI_API_KEY")?)
//!         .build()?;
//!     let upload = UploadArtifact::from_path("car.jpg")?;
//!     let outcome = search_image(upload, &config).await?;
//!     println!("{}", serde_json::to_string(&outcome)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `vehicle-lens` binary (clap + anyhow + dotenvy + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod search;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{SearchConfig, SearchConfigBuilder};
pub use error::{ImageSearchError, LensError, ParseError};
pub use output::{ExtractedAttributes, PipelineOutcome};
pub use pipeline::encode::EncodedPayload;
pub use pipeline::input::UploadArtifact;
pub use pipeline::llm::InferenceClient;
pub use search::{search_image, search_input, search_many, search_sync, ExtractionPipeline};
