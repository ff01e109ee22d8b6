use std::future::{ready, Ready};

use actix_web::{dev::Payload, Error, FromRequest, HttpMessage, HttpRequest};

use crate::errors::ApiError;
use crate::middleware::auth::Claims;

/// Handler-side view of the verified caller. Only obtainable behind
/// `AuthMiddleware`; requesting it on an unwrapped route yields the same
/// 401 `{error}` JSON as the middleware itself.
#[derive(Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
}

impl From<&Claims> for AuthenticatedUser {
    fn from(claims: &Claims) -> Self {
        Self {
            user_id: claims.user_id.clone(),
            email: claims.sub.clone(),
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req
            .extensions()
            .get::<Claims>()
            .map(AuthenticatedUser::from)
            .ok_or_else(|| ApiError::Authentication("User not authenticated".to_string()).into());
        ready(user)
    }
}
