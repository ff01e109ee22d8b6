use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::error::Error;
use std::fmt;

/// Failure taxonomy for the whole API. Variants carry internal detail for
/// logging; what reaches the client goes through `client_message`, which
/// replaces internal variants with the caller-supplied fallback.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Authentication(String),
    Authorization(String),
    NotFound(String),
    Upstream { status: u16, body: String },
    EmptyCompletion,
    MalformedOutput(String),
    Persistence(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Authentication(msg) => write!(f, "Authentication error: {}", msg),
            ApiError::Authorization(msg) => write!(f, "Authorization error: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Upstream { status, body } => {
                write!(f, "Upstream error (status {}): {}", status, body)
            }
            ApiError::EmptyCompletion => write!(f, "Model returned an empty completion"),
            ApiError::MalformedOutput(msg) => write!(f, "Malformed model output: {}", msg),
            ApiError::Persistence(msg) => write!(f, "Persistence error: {}", msg),
        }
    }
}

impl Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16()).unwrap_or(0);
        ApiError::Upstream {
            status,
            body: err.to_string(),
        }
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(err: mongodb::error::Error) -> Self {
        ApiError::Persistence(err.to_string())
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::Authentication(_) => 401,
            ApiError::Authorization(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Upstream { .. }
            | ApiError::EmptyCompletion
            | ApiError::MalformedOutput(_)
            | ApiError::Persistence(_) => 500,
        }
    }

    /// What the client is allowed to see. Upstream bodies, raw model output,
    /// and database errors stay in the logs.
    pub fn client_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Validation(msg)
            | ApiError::Authentication(msg)
            | ApiError::Authorization(msg)
            | ApiError::NotFound(msg) => msg.clone(),
            ApiError::Upstream { .. }
            | ApiError::EmptyCompletion
            | ApiError::MalformedOutput(_)
            | ApiError::Persistence(_) => fallback.to_string(),
        }
    }

    fn json_body(&self, fallback: &str) -> serde_json::Value {
        json!({"error": self.client_message(fallback)})
    }

    pub fn to_response(&self, fallback: &str) -> HttpResponse {
        eprintln!("{}", self);
        let body = self.json_body(fallback);
        match self.status_code() {
            400 => HttpResponse::BadRequest().json(body),
            401 => HttpResponse::Unauthorized().json(body),
            403 => HttpResponse::Forbidden().json(body),
            404 => HttpResponse::NotFound().json(body),
            _ => HttpResponse::InternalServerError().json(body),
        }
    }
}

/// Lets middleware and extractors bail out with `ApiError` directly; actix
/// renders the same `{error}` JSON body the handlers produce.
impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(ApiError::status_code(self))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(ResponseError::status_code(self))
            .json(self.json_body("Internal server error"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(ApiError::Validation("x".into()).status_code(), 400);
        assert_eq!(ApiError::Authentication("x".into()).status_code(), 401);
        assert_eq!(ApiError::Authorization("x".into()).status_code(), 403);
        assert_eq!(ApiError::NotFound("x".into()).status_code(), 404);
        assert_eq!(
            ApiError::Upstream { status: 502, body: "x".into() }.status_code(),
            500
        );
        assert_eq!(ApiError::EmptyCompletion.status_code(), 500);
        assert_eq!(ApiError::MalformedOutput("x".into()).status_code(), 500);
        assert_eq!(ApiError::Persistence("x".into()).status_code(), 500);
    }

    #[test]
    fn internal_detail_never_reaches_the_client() {
        let err = ApiError::Upstream {
            status: 500,
            body: "secret provider payload".into(),
        };
        let msg = err.client_message("Failed to generate itinerary");
        assert_eq!(msg, "Failed to generate itinerary");
        assert!(!msg.contains("secret"));

        let err = ApiError::Persistence("connection string leaked".into());
        assert_eq!(err.client_message("Failed to save"), "Failed to save");
    }

    #[test]
    fn actix_error_responses_are_json_bodies() {
        let err = ApiError::Authentication("No authorization header".into());
        let resp = err.error_response();
        assert_eq!(resp.status().as_u16(), 401);

        let bytes = tokio_test::block_on(actix_web::body::to_bytes(resp.into_body())).unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "No authorization header");
    }

    #[test]
    fn client_facing_variants_keep_their_message() {
        let err = ApiError::Validation("Destination is required".into());
        assert_eq!(err.client_message("fallback"), "Destination is required");

        let err = ApiError::Authorization("You do not have access to this trip".into());
        assert_eq!(
            err.client_message("fallback"),
            "You do not have access to this trip"
        );
    }
}
