//! The extraction prompt sent alongside every image.
//!
//! The prompt is a contract with [`crate::pipeline::parse`]: it fixes the JSON
//! keys (`make`, `bodyType`, `color`, `confidence`) the parser reads. Any
//! change to the schema here must be mirrored in the parser.

/// Instruction sent with the vehicle photo.
///
/// Not parameterised per call.
pub const EXTRACTION_PROMPT: &str = r#"Look at this vehicle photo and identify what a shopper would search for:
1. Make (the manufacturer)
2. Body type (SUV, Sedan, Hatchback, Coupe, Convertible, Pickup, Van, etc.)
3. Color (the main exterior paint color)

Respond with a single JSON object using exactly these keys:
{
  "make": "",
  "bodyType": "",
  "color": "",
  "confidence": 0.0
}

"confidence" is a number between 0 and 1 giving your certainty in the overall identification.
Only respond with the JSON object, nothing else."#;

/// Return the extraction prompt.
pub fn build_prompt() -> &'static str {
    EXTRACTION_PROMPT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_every_schema_key() {
        let p = build_prompt();
        for key in ["\"make\"", "\"bodyType\"", "\"color\"", "\"confidence\""] {
            assert!(p.contains(key), "prompt is missing {key}");
        }
    }

    #[test]
    fn prompt_is_stable_between_calls() {
        assert_eq!(build_prompt(), build_prompt());
        assert!(build_prompt().contains("Only respond with the JSON object"));
    }
}
