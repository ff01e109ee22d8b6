use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use mongodb::options::ClientOptions;
use mongodb::Client;
use std::sync::Arc;

use roamline_api::middleware::auth::Claims;

pub const TEST_JWT_SECRET: &str = "test_secret";

pub fn set_jwt_secret() {
    std::env::set_var("JWT_SECRET", TEST_JWT_SECRET);
}

pub fn auth_token(user_id: &str) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: "traveler@example.com".to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(1)).timestamp() as usize,
        user_id: user_id.to_string(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_ref()),
    )
    .expect("test token generation failed")
}

/// A Mongo handle pointed at nothing, with timeouts short enough that a
/// test hitting it by accident fails fast instead of hanging. Handlers under
/// test here are expected to reject input before any database call.
pub async fn unreachable_mongo() -> Arc<Client> {
    let mut options = ClientOptions::parse("mongodb://127.0.0.1:1")
        .await
        .expect("static test URI parses");
    options.server_selection_timeout = Some(std::time::Duration::from_millis(50));
    options.connect_timeout = Some(std::time::Duration::from_millis(50));
    Arc::new(Client::with_options(options).expect("client construction is local"))
}
