//! Transcoding: upload bytes → base64 text for the model request body.
//!
//! Vision APIs take images inline as base64 inside the JSON request. The
//! bytes are forwarded as uploaded; no re-encoding, so the model sees the
//! photo exactly as the user sent it.

use crate::error::LensError;
use crate::pipeline::input::{ArtifactContent, UploadArtifact};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Base64 image content plus its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    /// Standard-alphabet, padded base64.
    pub data: String,
    pub mime_type: String,
}

/// Read the artifact's content and base64-encode it.
///
/// File-backed artifacts are read here; a read failure is returned as
/// [`LensError::ReadFailed`]. At most `max_bytes` are accepted whatever the
/// declared size says: a file that grew after validation is rejected as
/// [`LensError::PayloadTooLarge`] without reading it to the end.
pub fn encode(artifact: &UploadArtifact, max_bytes: u64) -> Result<EncodedPayload, LensError> {
    let data = match &artifact.content {
        ArtifactContent::Bytes(bytes) => {
            check_size(bytes.len() as u64, max_bytes)?;
            STANDARD.encode(bytes)
        }
        ArtifactContent::File(path) => STANDARD.encode(read_capped(path, max_bytes)?),
    };
    debug!("Encoded image → {} bytes base64", data.len());

    Ok(EncodedPayload {
        data,
        mime_type: artifact.media_type.clone(),
    })
}

/// Read a file, stopping one byte past `max_bytes`.
fn read_capped(path: &Path, max_bytes: u64) -> Result<Vec<u8>, LensError> {
    let read_failed = |source| LensError::ReadFailed {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_failed)?;
    let mut bytes = Vec::new();
    file.take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(read_failed)?;

    check_size(bytes.len() as u64, max_bytes)?;
    Ok(bytes)
}

fn check_size(size: u64, limit: u64) -> Result<(), LensError> {
    if size > limit {
        return Err(LensError::PayloadTooLarge { size, limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn encode_round_trips_bytes() {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let artifact = UploadArtifact::from_bytes(bytes.clone(), "image/jpeg");
        let payload = encode(&artifact, DEFAULT_MAX_UPLOAD_BYTES).expect("encode should succeed");
        assert_eq!(payload.mime_type, "image/jpeg");
        let decoded = STANDARD.decode(&payload.data).expect("valid base64");
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn encode_reads_file_content() {
        let mut f = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        f.write_all(b"\x89PNG\r\n\x1a\n").unwrap();
        let artifact = UploadArtifact::from_path(f.path()).unwrap();
        let payload = encode(&artifact, DEFAULT_MAX_UPLOAD_BYTES).unwrap();
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(STANDARD.decode(&payload.data).unwrap(), b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn encode_surfaces_read_failure() {
        let artifact = UploadArtifact {
            byte_size: 10,
            media_type: "image/png".into(),
            content: ArtifactContent::File(PathBuf::from("/no/such/dir/car.png")),
        };
        let err = encode(&artifact, DEFAULT_MAX_UPLOAD_BYTES).unwrap_err();
        assert!(matches!(err, LensError::ReadFailed { .. }));
    }

    #[test]
    fn empty_content_encodes_to_empty_string() {
        let payload = encode(&UploadArtifact::from_bytes(Vec::new(), "image/png"), 1).unwrap();
        assert!(payload.data.is_empty());
    }

    #[test]
    fn file_that_grew_after_validation_is_rejected() {
        let mut f = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        f.write_all(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        let artifact = UploadArtifact::from_path(f.path()).unwrap();
        assert_eq!(artifact.byte_size, 4);

        f.write_all(&[0u8; 4096]).unwrap();
        f.flush().unwrap();

        let err = encode(&artifact, 16).unwrap_err();
        assert!(
            matches!(err, LensError::PayloadTooLarge { size: 17, limit: 16 }),
            "got: {err:?}"
        );
    }

    #[test]
    fn file_at_the_limit_is_accepted() {
        let mut f = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        f.write_all(&[7u8; 16]).unwrap();
        let artifact = UploadArtifact::from_path(f.path()).unwrap();
        let payload = encode(&artifact, 16).unwrap();
        assert_eq!(STANDARD.decode(&payload.data).unwrap().len(), 16);
    }

    #[test]
    fn oversized_bytes_are_rejected() {
        let artifact = UploadArtifact::from_bytes(vec![0u8; 8], "image/png");
        let err = encode(&artifact, 7).unwrap_err();
        assert!(matches!(err, LensError::PayloadTooLarge { size: 8, limit: 7 }));
    }
}
