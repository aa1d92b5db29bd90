//! Upload intake: describe an image as an [`UploadArtifact`].
//!
//! An artifact is either bytes already in memory (an HTTP upload, a download)
//! or a local file whose content is read only when the transcoder needs it.
//! Size and media type are known up front in both cases so validation can
//! run before any bytes are read.

use crate::error::LensError;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where the artifact's bytes live.
#[derive(Debug, Clone)]
pub enum ArtifactContent {
    /// Content already in memory.
    Bytes(Vec<u8>),
    /// Content on disk; read during transcoding.
    File(PathBuf),
}

/// One uploaded image, consumed once by the pipeline.
#[derive(Debug, Clone)]
pub struct UploadArtifact {
    /// Declared size in bytes.
    pub byte_size: u64,
    /// Declared MIME type; empty when unknown.
    pub media_type: String,
    pub content: ArtifactContent,
}

impl UploadArtifact {
    /// Artifact from in-memory bytes with a declared media type.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        let bytes = bytes.into();
        Self {
            byte_size: bytes.len() as u64,
            media_type: media_type.into(),
            content: ArtifactContent::Bytes(bytes),
        }
    }

    /// Artifact backed by a local file.
    ///
    /// The media type is inferred from the file extension; unknown extensions
    /// give an empty media type, which validation rejects.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LensError> {
        let path = path.as_ref().to_path_buf();
        let meta = std::fs::metadata(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LensError::FileNotFound { path: path.clone() },
            _ => LensError::ReadFailed {
                path: path.clone(),
                source: e,
            },
        })?;
        if !meta.is_file() {
            return Err(LensError::FileNotFound { path });
        }

        let media_type = media_type_for_path(&path);
        debug!(
            "Resolved local image: {} ({} bytes, '{}')",
            path.display(),
            meta.len(),
            media_type
        );

        Ok(Self {
            byte_size: meta.len(),
            media_type,
            content: ArtifactContent::File(path),
        })
    }
}

/// Guess a MIME type from a file extension (`car.JPG` → `image/jpeg`).
pub fn media_type_for_path(path: &Path) -> String {
    ImageFormat::from_path(path)
        .map(|f| f.to_mime_type().to_string())
        .unwrap_or_default()
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a path or http(s) URL to an artifact.
///
/// Downloads are held to `max_bytes`: a larger `Content-Length` is refused
/// before the body is read, and a body that runs past the limit is dropped
/// as soon as it does.
pub async fn resolve_input(
    input: &str,
    timeout_secs: u64,
    max_bytes: u64,
) -> Result<UploadArtifact, LensError> {
    if is_url(input) {
        download_url(input, timeout_secs, max_bytes).await
    } else {
        UploadArtifact::from_path(input)
    }
}

/// Download a URL into memory.
///
/// The media type comes from the `Content-Type` header, falling back to the
/// URL's extension.
async fn download_url(
    url: &str,
    timeout_secs: u64,
    max_bytes: u64,
) -> Result<UploadArtifact, LensError> {
    info!("Downloading image from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| LensError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| transfer_error(url, timeout_secs, e))?;

    if !response.status().is_success() {
        return Err(LensError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    if let Some(declared) = response.content_length() {
        if declared > max_bytes {
            return Err(LensError::PayloadTooLarge {
                size: declared,
                limit: max_bytes,
            });
        }
    }

    let media_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(content_type_essence)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| media_type_for_path(Path::new(url_path(url))));

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| transfer_error(url, timeout_secs, e))?
    {
        body.extend_from_slice(&chunk);
        if body.len() as u64 > max_bytes {
            warn!("Download of {} exceeded {} bytes; aborting", url, max_bytes);
            return Err(LensError::PayloadTooLarge {
                size: body.len() as u64,
                limit: max_bytes,
            });
        }
    }

    debug!("Downloaded {} bytes ({})", body.len(), media_type);
    Ok(UploadArtifact::from_bytes(body, media_type))
}

fn transfer_error(url: &str, timeout_secs: u64, e: reqwest::Error) -> LensError {
    if e.is_timeout() {
        LensError::DownloadTimeout {
            url: url.to_string(),
            secs: timeout_secs,
        }
    } else {
        LensError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

/// `image/png; charset=binary` → `image/png`.
fn content_type_essence(header: &str) -> String {
    header
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Path component of a URL, without query or fragment.
fn url_path(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}
