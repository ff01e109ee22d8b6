use regex::Regex;
use serde_json::Value;

use crate::errors::ApiError;
use crate::services::ai::prompt::{DATA_END, DATA_START};

/// Locate the model's JSON payload inside a free-text completion.
///
/// Framing protocol, in strict order:
/// 1. if both sentinel markers are present, the delimited span is
///    authoritative and only it is parsed;
/// 2. otherwise the whole body is parsed;
/// 3. on failure, markdown code fences are stripped and parsing retried;
/// 4. on failure, trailing commas are trimmed and parsing retried.
///
/// All attempts exhausted reports `MalformedOutput` to the caller; nothing is
/// swallowed. Only "valid JSON" is checked here; field-level validation is
/// the consumer's job (untrusted, all-optional decode).
pub fn extract_json(completion: &str) -> Result<Value, ApiError> {
    let candidate = match sentinel_span(completion) {
        Some(span) => span,
        None => completion.trim(),
    };

    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
        return Ok(value);
    }

    let unfenced = strip_code_fences(candidate);
    if let Ok(value) = serde_json::from_str::<Value>(&unfenced) {
        return Ok(value);
    }

    let repaired = strip_trailing_commas(&unfenced);
    serde_json::from_str::<Value>(&repaired).map_err(|e| {
        ApiError::MalformedOutput(format!("no parsable JSON in completion: {}", e))
    })
}

fn sentinel_span(text: &str) -> Option<&str> {
    let start = text.find(DATA_START)? + DATA_START.len();
    let end = text[start..].find(DATA_END)? + start;
    Some(text[start..end].trim())
}

fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop an optional language tag on the opening fence line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim().to_string()
}

fn strip_trailing_commas(text: &str) -> String {
    let re = Regex::new(r",\s*([}\]])").expect("trailing comma pattern is valid");
    re.replace_all(text, "$1").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_delimited_content_is_authoritative() {
        let completion = format!(
            "Here you go!\n{}\n{{\"activities\": []}}\n{}\nHope that helps.",
            DATA_START, DATA_END
        );
        let value = extract_json(&completion).unwrap();
        assert!(value["activities"].is_array());
    }

    #[test]
    fn whole_body_parse_is_the_fallback() {
        let value = extract_json("{\"days\": [1, 2, 3]}").unwrap();
        assert_eq!(value["days"][2], 3);
    }

    #[test]
    fn markdown_fences_are_stripped() {
        let completion = "```json\n{\"name\": \"Lisbon\"}\n```";
        let value = extract_json(completion).unwrap();
        assert_eq!(value["name"], "Lisbon");
    }

    #[test]
    fn trailing_commas_are_repaired() {
        let completion = "{\"items\": [1, 2,], \"done\": true,}";
        let value = extract_json(completion).unwrap();
        assert_eq!(value["items"][1], 2);
        assert_eq!(value["done"], true);
    }

    #[test]
    fn fenced_content_inside_sentinels_parses() {
        let completion = format!(
            "{}\n```json\n{{\"destinations\": [],}}\n```\n{}",
            DATA_START, DATA_END
        );
        let value = extract_json(&completion).unwrap();
        assert!(value["destinations"].is_array());
    }

    #[test]
    fn unparsable_output_is_reported_not_swallowed() {
        let err = extract_json("I could not produce the itinerary, sorry!").unwrap_err();
        assert!(matches!(err, ApiError::MalformedOutput(_)));
    }

    #[test]
    fn extraction_is_idempotent_over_its_own_output() {
        let completion = format!(
            "{}\n{{\"activities\": [{{\"name\": \"Louvre\", \"category\": \"Culture\"}}]}}\n{}",
            DATA_START, DATA_END
        );
        let first = extract_json(&completion).unwrap();
        let reserialized = serde_json::to_string(&first).unwrap();
        let second = extract_json(&reserialized).unwrap();
        assert_eq!(first, second);
    }
}
