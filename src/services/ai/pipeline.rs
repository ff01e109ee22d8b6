use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::ApiError;
use crate::services::ai::extract::extract_json;
use crate::services::ai::model_client::{ChatMessage, ChatModel, ModelParams};

/// Per-endpoint invocation settings. Every AI endpoint runs the same
/// prompt -> invoke -> extract sequence; only the prompt and these
/// parameters differ.
pub const ACTIVITY_SUGGESTIONS: ModelParams = ModelParams {
    model: "anthropic/claude-3.5-sonnet",
    temperature: 0.7,
    max_tokens: 2000,
};

pub const DESTINATION_SUGGESTIONS: ModelParams = ModelParams {
    model: "anthropic/claude-3.5-sonnet",
    temperature: 0.8,
    max_tokens: 3000,
};

pub const ITINERARY_GENERATION: ModelParams = ModelParams {
    model: "anthropic/claude-3.5-sonnet",
    temperature: 0.7,
    max_tokens: 4000,
};

pub const ASSISTANT_CHAT: ModelParams = ModelParams {
    model: "google/gemini-flash-1.5",
    temperature: 0.6,
    max_tokens: 1500,
};

/// Invoke the model with a single user prompt and extract the JSON payload
/// from its completion.
pub async fn run_to_json<M: ChatModel>(
    model: &M,
    prompt: String,
    params: &ModelParams,
) -> Result<Value, ApiError> {
    let messages = vec![ChatMessage::user(prompt)];
    let completion = model.invoke(&messages, params).await?;
    extract_json(&completion)
}

/// Decode the named array out of an extracted payload. Element fields stay
/// optional; only the array shape itself is required.
pub fn decode_array<T: DeserializeOwned>(value: &Value, key: &str) -> Result<Vec<T>, ApiError> {
    let array = value
        .get(key)
        .ok_or_else(|| ApiError::MalformedOutput(format!("missing `{}` array", key)))?;

    serde_json::from_value(array.clone())
        .map_err(|e| ApiError::MalformedOutput(format!("unexpected `{}` shape: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::itinerary::ActivityOption;
    use crate::services::ai::prompt::{DATA_END, DATA_START};

    struct StubModel {
        reply: Result<String, (u16, String)>,
    }

    impl ChatModel for StubModel {
        async fn invoke(
            &self,
            _messages: &[ChatMessage],
            _params: &ModelParams,
        ) -> Result<String, ApiError> {
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err((status, body)) => Err(ApiError::Upstream {
                    status: *status,
                    body: body.clone(),
                }),
            }
        }
    }

    #[test]
    fn valid_completion_yields_decoded_activities() {
        let stub = StubModel {
            reply: Ok(format!(
                "{}\n{{\"activities\":[{{\"name\":\"Musee d'Orsay\",\"duration\":\"2 hours\",\
                 \"bestTime\":\"Morning\",\"estimatedCost\":\"16 EUR\",\"category\":\"Culture\"}}]}}\n{}",
                DATA_START, DATA_END
            )),
        };

        let value = tokio_test::block_on(run_to_json(
            &stub,
            "prompt".to_string(),
            &ACTIVITY_SUGGESTIONS,
        ))
        .unwrap();

        let activities: Vec<ActivityOption> = decode_array(&value, "activities").unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].name.as_deref(), Some("Musee d'Orsay"));
        assert_eq!(activities[0].best_time.as_deref(), Some("Morning"));
    }

    #[test]
    fn upstream_failure_passes_through_unretried() {
        let stub = StubModel {
            reply: Err((500, "upstream exploded".to_string())),
        };

        let err = tokio_test::block_on(run_to_json(
            &stub,
            "prompt".to_string(),
            &ACTIVITY_SUGGESTIONS,
        ))
        .unwrap_err();

        match err {
            ApiError::Upstream { status, .. } => assert_eq!(status, 500),
            other => panic!("expected Upstream, got {:?}", other),
        }
    }

    #[test]
    fn prose_completion_is_malformed_output() {
        let stub = StubModel {
            reply: Ok("Sorry, I can't help with that.".to_string()),
        };

        let err = tokio_test::block_on(run_to_json(
            &stub,
            "prompt".to_string(),
            &ACTIVITY_SUGGESTIONS,
        ))
        .unwrap_err();
        assert!(matches!(err, ApiError::MalformedOutput(_)));
    }

    #[test]
    fn missing_array_key_is_malformed_output() {
        let value = serde_json::json!({"unexpected": []});
        let err = decode_array::<ActivityOption>(&value, "activities").unwrap_err();
        assert!(matches!(err, ApiError::MalformedOutput(_)));
    }

    #[test]
    fn unknown_element_fields_are_ignored_not_fatal() {
        let value = serde_json::json!({
            "activities": [{"name": "Walk", "surprise": {"nested": true}}]
        });
        let activities: Vec<ActivityOption> = decode_array(&value, "activities").unwrap();
        assert_eq!(activities[0].name.as_deref(), Some("Walk"));
        assert!(activities[0].category.is_none());
    }
}
