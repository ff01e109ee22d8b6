use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::errors::ApiError;

const DEFAULT_BASE_URL: &str = "https://verify.twilio.com/v2";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct VerificationResponse {
    status: String,
}

/// Twilio Verify wrapper. Code generation, delivery, and checking live on
/// the provider side; this only starts a verification and checks a code.
pub struct TwilioVerifyService {
    client: Client,
    account_sid: String,
    auth_token: String,
    verify_service_sid: String,
    base_url: String,
}

impl TwilioVerifyService {
    pub fn new() -> Result<Self, ApiError> {
        let account_sid = env::var("TWILIO_ACCOUNT_SID")
            .map_err(|_| ApiError::Validation("TWILIO_ACCOUNT_SID not set".to_string()))?;
        let auth_token = env::var("TWILIO_AUTH_TOKEN")
            .map_err(|_| ApiError::Validation("TWILIO_AUTH_TOKEN not set".to_string()))?;
        let verify_service_sid = env::var("TWILIO_VERIFY_SERVICE_SID")
            .map_err(|_| ApiError::Validation("TWILIO_VERIFY_SERVICE_SID not set".to_string()))?;
        let base_url =
            env::var("TWILIO_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::Upstream { status: 0, body: e.to_string() })?;

        Ok(Self {
            client,
            account_sid,
            auth_token,
            verify_service_sid,
            base_url,
        })
    }

    /// Ask the provider to send a one-time code. Returns the provider's
    /// status string (normally "pending").
    pub async fn start_verification(&self, phone_number: &str) -> Result<String, ApiError> {
        let url = format!(
            "{}/Services/{}/Verifications",
            self.base_url, self.verify_service_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", phone_number), ("Channel", "sms")])
            .send()
            .await?;

        Self::read_status(response).await
    }

    /// Check a one-time code. "approved" means the phone number is verified.
    pub async fn check_verification(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<String, ApiError> {
        let url = format!(
            "{}/Services/{}/VerificationCheck",
            self.base_url, self.verify_service_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", phone_number), ("Code", code)])
            .send()
            .await?;

        Self::read_status(response).await
    }

    async fn read_status(response: reqwest::Response) -> Result<String, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::Upstream { status: status.as_u16(), body });
        }

        let verification: VerificationResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream { status: 0, body: e.to_string() })?;
        Ok(verification.status)
    }
}
