//! Pipeline stages for vehicle image search.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the model backend can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ validate ──▶ encode ──▶ llm ──▶ parse
//! (upload)   (checks)    (base64)   (VLM)    (JSON → attributes)
//! ```
//!
//! 1. [`input`]    — describe a path, URL or in-memory upload as an artifact
//! 2. [`validate`] — media type and size checks; no I/O
//! 3. [`encode`]   — read the bytes (never more than the ceiling) and
//!    base64-wrap them
//! 4. [`llm`]      — the [`llm::InferenceClient`] seam over edgequake-llm;
//!    the only stage that talks to a model
//! 5. [`parse`]    — strip fences, strict JSON parse, per-field defaults

pub mod encode;
pub mod input;
pub mod llm;
pub mod parse;
pub mod validate;
