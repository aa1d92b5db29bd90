//! Upload preconditions, checked before any external call.

use crate::error::LensError;
use crate::pipeline::input::UploadArtifact;

/// Check that an upload is present, is an image, and fits under `max_bytes`.
///
/// A size equal to `max_bytes` is accepted. Returns the artifact on success.
pub fn validate(
    artifact: Option<&UploadArtifact>,
    max_bytes: u64,
) -> Result<&UploadArtifact, LensError> {
    let artifact = artifact.ok_or(LensError::MissingInput)?;

    if !artifact.media_type.starts_with("image/") {
        return Err(LensError::InvalidMediaType {
            media_type: artifact.media_type.clone(),
        });
    }

    if artifact.byte_size > max_bytes {
        return Err(LensError::PayloadTooLarge {
            size: artifact.byte_size,
            limit: max_bytes,
        });
    }

    Ok(artifact)
}
