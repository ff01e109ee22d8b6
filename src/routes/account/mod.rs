pub mod auth;
pub mod phone_verification;
