use actix_web::{web, HttpResponse, Responder};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use mongodb::error::WriteError;
use mongodb::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::db::mongo::DB_NAME;
use crate::middleware::auth::Claims;
use crate::models::user::{User, UserSession};

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    auth_token: String,
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

pub async fn signup(data: web::Data<Arc<Client>>, input: web::Json<Credentials>) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<User> = client.database(DB_NAME).collection("users");

    if !is_valid_email(&input.email) {
        return HttpResponse::BadRequest().json(json!({"error": "Invalid email address"}));
    }
    if input.password.len() < 8 {
        return HttpResponse::BadRequest()
            .json(json!({"error": "Password must be at least 8 characters"}));
    }

    let curr_time = Utc::now();
    let input = input.into_inner();

    let hashed = match bcrypt::hash(&input.password, bcrypt::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(err) => {
            eprintln!("Failed to hash password: {:?}", err);
            return HttpResponse::InternalServerError()
                .json(json!({"error": "Failed to create user"}));
        }
    };

    let user = User {
        id: None,
        email: input.email,
        password: hashed,
        first_name: input.first_name,
        last_name: input.last_name,
        phone_number: input.phone_number,
        phone_verified: Some(false),
        last_signin: None,
        failed_signins: None,
        created_at: Some(curr_time),
        updated_at: Some(curr_time),
    };

    match collection.insert_one(&user).await {
        Ok(result) => {
            match generate_token(&user.email, result.inserted_id.as_object_id().unwrap()) {
                Ok(token) => HttpResponse::Ok().json(TokenResponse { auth_token: token }),
                Err(_) => HttpResponse::InternalServerError()
                    .json(json!({"error": "Token generation failed"})),
            }
        }
        Err(err) => match *err.kind {
            mongodb::error::ErrorKind::Write(error_info) => match error_info {
                mongodb::error::WriteFailure::WriteError(WriteError { code, .. }) => {
                    if code == 11000 {
                        HttpResponse::Conflict().json(json!({"error": "User already exists"}))
                    } else {
                        eprintln!("Error code: {}", code);
                        HttpResponse::InternalServerError()
                            .json(json!({"error": "Failed to create user"}))
                    }
                }
                _ => HttpResponse::InternalServerError()
                    .json(json!({"error": "Failed to create user"})),
            },
            _ => HttpResponse::InternalServerError()
                .json(json!({"error": "Failed to create user"})),
        },
    }
}

pub async fn signin(data: web::Data<Arc<Client>>, input: web::Json<Credentials>) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<User> = client.database(DB_NAME).collection("users");

    let input = input.into_inner();
    let email = input.email;

    let filter = doc! { "email": &email };

    match collection.find_one(filter).await {
        Ok(Some(user)) => {
            if bcrypt::verify(&input.password, &user.password).unwrap_or(false) {
                let update = doc! {
                    "$set": {
                        "last_signin": Utc::now().to_rfc3339(),
                        "failed_signins": 0
                    }
                };

                match collection.update_one(doc! { "email": &email }, update).await {
                    Ok(_) => {
                        let user_id = match user.id {
                            Some(id) => id,
                            None => {
                                return HttpResponse::InternalServerError()
                                    .json(json!({"error": "Failed to sign in"}));
                            }
                        };
                        match generate_token(&email, user_id) {
                            Ok(token) => {
                                HttpResponse::Ok().json(TokenResponse { auth_token: token })
                            }
                            Err(_) => HttpResponse::InternalServerError()
                                .json(json!({"error": "Token generation failed"})),
                        }
                    }
                    Err(err) => {
                        eprintln!("Failed to update document: {:?}", err);
                        HttpResponse::InternalServerError()
                            .json(json!({"error": "Failed to sign in"}))
                    }
                }
            } else {
                let failed_signins = user.failed_signins.unwrap_or(0) + 1;
                let update = doc! {
                    "$set": { "failed_signins": failed_signins }
                };

                match collection.update_one(doc! { "email": &email }, update).await {
                    Ok(_) => HttpResponse::Unauthorized()
                        .json(json!({"error": "Invalid credentials"})),
                    Err(err) => {
                        eprintln!("Failed to update failed signins: {:?}", err);
                        HttpResponse::InternalServerError()
                            .json(json!({"error": "Failed to process signin"}))
                    }
                }
            }
        }
        Ok(None) => HttpResponse::NotFound().json(json!({"error": "User not found"})),
        Err(err) => {
            eprintln!("Database error: {:?}", err);
            HttpResponse::InternalServerError().json(json!({"error": "Failed to process signin"}))
        }
    }
}

pub async fn user_session(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<User> = client.database(DB_NAME).collection("users");

    let user_id = match ObjectId::parse_str(&claims.user_id) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest().json(json!({"error": "Invalid user ID"}));
        }
    };

    match collection.find_one(doc! { "_id": user_id }).await {
        Ok(Some(user)) => {
            let user_session = UserSession {
                id: user.id.unwrap_or_default(),
                email: user.email,
                first_name: user.first_name.unwrap_or_default(),
                last_name: user.last_name.unwrap_or_default(),
                phone_verified: user.phone_verified.unwrap_or(false),
                created_at: user.created_at.unwrap_or_default(),
            };
            HttpResponse::Ok().json(user_session)
        }
        Ok(None) => HttpResponse::NotFound().json(json!({"error": "User not found"})),
        Err(err) => {
            eprintln!("Failed to fetch user: {:?}", err);
            HttpResponse::InternalServerError().json(json!({"error": "Failed to fetch user"}))
        }
    }
}

fn is_valid_email(email: &str) -> bool {
    let re = regex::Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*$",
    );
    re.unwrap().is_match(email)
}

fn generate_token(email: &str, user_id: ObjectId) -> Result<String, jsonwebtoken::errors::Error> {
    let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    let now = Utc::now();

    let claims = Claims {
        sub: email.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(24)).timestamp() as usize,
        user_id: user_id.to_string(),
    };

    let header = Header::new(Algorithm::HS256);
    encode(&header, &claims, &EncodingKey::from_secret(secret.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_normal_addresses() {
        assert!(is_valid_email("traveler@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
    }

    #[test]
    fn email_validation_rejects_garbage() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("@missing-local.com"));
        assert!(!is_valid_email("trailing@dot."));
    }
}
