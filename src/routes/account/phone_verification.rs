use actix_web::{web, HttpResponse, Responder};
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::db::mongo::DB_NAME;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::user::User;
use crate::services::sms_service::TwilioVerifyService;

#[derive(Debug, Deserialize)]
pub struct StartVerificationRequest {
    pub phone_number: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckVerificationRequest {
    pub phone_number: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerificationStatus {
    pub success: bool,
    pub status: String,
}

// POST /api/verifications
pub async fn start_verification(
    _user: AuthenticatedUser,
    req_body: web::Json<StartVerificationRequest>,
) -> impl Responder {
    if req_body.phone_number.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "Phone number is required"}));
    }

    let sms_service = match TwilioVerifyService::new() {
        Ok(service) => service,
        Err(err) => {
            eprintln!("Failed to initialize SMS service: {}", err);
            return HttpResponse::InternalServerError()
                .json(json!({"error": "Failed to initialize SMS service"}));
        }
    };

    match sms_service.start_verification(&req_body.phone_number).await {
        Ok(status) => HttpResponse::Ok().json(VerificationStatus {
            success: true,
            status,
        }),
        Err(err) => err.to_response("Failed to send verification code"),
    }
}

// POST /api/verifications/check
pub async fn check_verification(
    user: AuthenticatedUser,
    data: web::Data<Arc<Client>>,
    req_body: web::Json<CheckVerificationRequest>,
) -> impl Responder {
    if req_body.phone_number.trim().is_empty() || req_body.code.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({"error": "Phone number and code are required"}));
    }

    let sms_service = match TwilioVerifyService::new() {
        Ok(service) => service,
        Err(err) => {
            eprintln!("Failed to initialize SMS service: {}", err);
            return HttpResponse::InternalServerError()
                .json(json!({"error": "Failed to initialize SMS service"}));
        }
    };

    let status = match sms_service
        .check_verification(&req_body.phone_number, &req_body.code)
        .await
    {
        Ok(status) => status,
        Err(err) => return err.to_response("Failed to check verification code"),
    };

    if status != "approved" {
        return HttpResponse::BadRequest().json(json!({
            "error": "Verification code was not accepted",
            "status": status,
        }));
    }

    // Code accepted: mark the caller's phone as verified
    let user_id = match ObjectId::parse_str(&user.user_id) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest().json(json!({"error": "Invalid user ID"}));
        }
    };

    let client = data.into_inner();
    let collection: mongodb::Collection<User> = client.database(DB_NAME).collection("users");
    let update = doc! {
        "$set": {
            "phone_number": &req_body.phone_number,
            "phone_verified": true,
        }
    };

    match collection.update_one(doc! { "_id": user_id }, update).await {
        Ok(_) => HttpResponse::Ok().json(VerificationStatus {
            success: true,
            status,
        }),
        Err(err) => {
            eprintln!("Failed to update phone verification: {:?}", err);
            HttpResponse::InternalServerError()
                .json(json!({"error": "Failed to record verification"}))
        }
    }
}
