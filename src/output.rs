//! Result types returned to callers.

use crate::error::ParseError;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// User-facing message attached to a soft failure.
pub const CLEARER_IMAGE_MESSAGE: &str =
    "Failed to parse AI response. Please try with a clearer image.";

/// Canonical search attributes extracted from one vehicle photo.
///
/// Every field is always present; values the model omitted are defaulted
/// (`""` for text, `0.0` for confidence).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedAttributes {
    pub make: String,
    pub body_type: String,
    pub color: String,
    /// Model-reported certainty. Not clamped; see [`Self::confidence_in_range`].
    pub confidence: f64,
}

impl ExtractedAttributes {
    /// `true` when `confidence` lies within `[0, 1]`.
    pub fn confidence_in_range(&self) -> bool {
        (0.0..=1.0).contains(&self.confidence)
    }
}

/// Outcome of one pipeline run that got as far as reading the model reply.
///
/// Serialises as `{"success":true,"data":{..}}` or
/// `{"success":false,"error":".."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Success(ExtractedAttributes),
    Failure {
        /// Message suitable for the end user.
        error: String,
        /// Why the reply was rejected.
        cause: ParseError,
    },
}

impl PipelineOutcome {
    pub(crate) fn unreadable(cause: ParseError) -> Self {
        PipelineOutcome::Failure {
            error: CLEARER_IMAGE_MESSAGE.to_string(),
            cause,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Success(_))
    }

    pub fn data(&self) -> Option<&ExtractedAttributes> {
        match self {
            PipelineOutcome::Success(data) => Some(data),
            PipelineOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PipelineOutcome::Success(_) => None,
            PipelineOutcome::Failure { error, .. } => Some(error),
        }
    }
}

impl Serialize for PipelineOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("PipelineOutcome", 2)?;
        match self {
            PipelineOutcome::Success(data) => {
                s.serialize_field("success", &true)?;
                s.serialize_field("data", data)?;
            }
            PipelineOutcome::Failure { error, .. } => {
                s.serialize_field("success", &false)?;
                s.serialize_field("error", error)?;
            }
        }
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_serialises_with_camel_case_fields() {
        let outcome = PipelineOutcome::Success(ExtractedAttributes {
            make: "Toyota".into(),
            body_type: "SUV".into(),
            color: "Red".into(),
            confidence: 0.9,
        });
        let v = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            v,
            json!({
                "success": true,
                "data": {"make": "Toyota", "bodyType": "SUV", "color": "Red", "confidence": 0.9}
            })
        );
    }

    #[test]
    fn failure_serialises_message_only() {
        let outcome = PipelineOutcome::unreadable(ParseError::InvalidJson {
            detail: "expected value".into(),
        });
        let v = serde_json::to_value(&outcome).unwrap();
        assert_eq!(v, json!({"success": false, "error": CLEARER_IMAGE_MESSAGE}));
        assert!(outcome.error().unwrap().contains("clearer image"));
        assert!(outcome.data().is_none());
    }

    #[test]
    fn confidence_range_check() {
        let mut attrs = ExtractedAttributes::default();
        assert!(attrs.confidence_in_range());
        attrs.confidence = 1.5;
        assert!(!attrs.confidence_in_range());
        attrs.confidence = -0.1;
        assert!(!attrs.confidence_in_range());
    }
}
