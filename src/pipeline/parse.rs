//! Response parsing: model text → [`ExtractedAttributes`].
//!
//! Three stages, in order:
//!
//! 1. **Normalise** — remove code-fence markers (` ``` ` or ` ```json `) and
//!    trim. Models wrap JSON in fences often enough despite the prompt that
//!    this one artefact is always cleaned up. Nothing else is forgiven.
//! 2. **Parse** — strict `serde_json` parse; the value must be an object.
//! 3. **Coalesce** — read each schema key, replacing a missing or falsy value
//!    (`null`, `false`, `0`, `""`) with the field default. A reply of `{}` is
//!    therefore valid and yields all defaults.

use crate::error::ParseError;
use crate::output::ExtractedAttributes;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static RE_CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?\n?").unwrap());

/// Parse a raw model reply into canonical attributes.
pub fn parse_response(raw: &str) -> Result<ExtractedAttributes, ParseError> {
    let cleaned = strip_code_fences(raw);

    let value: Value = serde_json::from_str(&cleaned).map_err(|e| ParseError::InvalidJson {
        detail: e.to_string(),
    })?;

    let object = match value {
        Value::Object(map) => map,
        other => {
            return Err(ParseError::NotAnObject {
                found: json_kind(&other).to_string(),
            })
        }
    };

    Ok(ExtractedAttributes {
        make: coalesce_text(&object, "make"),
        body_type: coalesce_text(&object, "bodyType"),
        color: coalesce_text(&object, "color"),
        confidence: coalesce_number(&object, "confidence"),
    })
}

// ── Stage 1: normalise ───────────────────────────────────────────────────────

/// Remove every code-fence marker and trim surrounding whitespace.
pub fn strip_code_fences(input: &str) -> String {
    RE_CODE_FENCE.replace_all(input, "").trim().to_string()
}

// ── Stage 3: coalesce ────────────────────────────────────────────────────────

/// Missing, `null`, `false`, `0` and `""` all count as absent.
fn present<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|v| !is_falsy(v))
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Strings pass through; other present values use their JSON text.
fn coalesce_text(object: &Map<String, Value>, key: &str) -> String {
    match present(object, key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Numbers pass through; numeric strings are parsed; anything else is `0`.
fn coalesce_number(object: &Map<String, Value>, key: &str) -> f64 {
    match present(object, key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_json() {
        let raw = "```json\n{\"make\":\"Toyota\",\"bodyType\":\"SUV\",\"color\":\"Red\",\"confidence\":0.9}\n```";
        let attrs = parse_response(raw).unwrap();
        assert_eq!(
            attrs,
            ExtractedAttributes {
                make: "Toyota".into(),
                body_type: "SUV".into(),
                color: "Red".into(),
                confidence: 0.9,
            }
        );
    }

    #[test]
    fn test_bare_fence_without_language() {
        let raw = "```\n{\"make\":\"Honda\"}\n```";
        assert_eq!(parse_response(raw).unwrap().make, "Honda");
    }

    #[test]
    fn test_plain_json_with_whitespace() {
        let raw = "  \n{\"make\":\"BMW\",\"bodyType\":\"Sedan\",\"color\":\"Black\",\"confidence\":0.75}\n\n";
        let attrs = parse_response(raw).unwrap();
        assert_eq!(attrs.body_type, "Sedan");
        assert_eq!(attrs.confidence, 0.75);
    }

    #[test]
    fn test_not_json() {
        let err = parse_response("not json at all").unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson { .. }));
    }

    #[test]
    fn test_prose_around_json_is_not_forgiven() {
        let err = parse_response("Sure! Here it is: {\"make\":\"Ford\"}").unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson { .. }));
    }

    #[test]
    fn test_empty_object_defaults_everything() {
        assert_eq!(parse_response("{}").unwrap(), ExtractedAttributes::default());
    }

    #[test]
    fn test_non_object_values_rejected() {
        let cases = [
            ("null", "null"),
            ("42", "number"),
            ("[1,2]", "array"),
            ("\"SUV\"", "string"),
            ("true", "boolean"),
        ];
        for (raw, kind) in cases {
            match parse_response(raw) {
                Err(ParseError::NotAnObject { found }) => assert_eq!(found, kind, "input {raw}"),
                other => panic!("{raw}: expected NotAnObject, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_falsy_values_default() {
        let raw = r#"{"make":null,"bodyType":false,"color":"","confidence":0}"#;
        assert_eq!(parse_response(raw).unwrap(), ExtractedAttributes::default());
    }

    #[test]
    fn test_non_string_text_fields_use_json_text() {
        let raw = r#"{"make":911,"bodyType":true,"color":"Silver"}"#;
        let attrs = parse_response(raw).unwrap();
        assert_eq!(attrs.make, "911");
        assert_eq!(attrs.body_type, "true");
        assert_eq!(attrs.color, "Silver");
    }

    #[test]
    fn test_confidence_coercion() {
        assert_eq!(parse_response(r#"{"confidence":"0.8"}"#).unwrap().confidence, 0.8);
        assert_eq!(parse_response(r#"{"confidence":"high"}"#).unwrap().confidence, 0.0);
        assert_eq!(parse_response(r#"{"confidence":[0.5]}"#).unwrap().confidence, 0.0);
    }

    #[test]
    fn test_out_of_range_confidence_passes_through() {
        let attrs = parse_response(r#"{"make":"Kia","confidence":1.7}"#).unwrap();
        assert_eq!(attrs.confidence, 1.7);
        assert!(!attrs.confidence_in_range());
    }

    #[test]
    fn test_extra_keys_ignored() {
        let raw = r#"{"make":"Audi","model":"A4","year":2019}"#;
        assert_eq!(parse_response(raw).unwrap().make, "Audi");
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("{}"), "{}");
        assert_eq!(strip_code_fences("   {\"a\":1}   "), "{\"a\":1}");
    }
}
