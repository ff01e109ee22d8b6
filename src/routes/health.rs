use actix_web::{web, HttpResponse, Responder};
use mongodb::{bson::doc, Client};
use serde::Serialize;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use crate::db::mongo::DB_NAME;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    environment: String,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

pub async fn health_check(client: web::Data<Arc<Client>>) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: HashMap::new(),
        environment: env::var("RUST_ENV").unwrap_or("development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let mongo_result = check_mongodb(&client).await;
    health
        .services
        .insert("mongodb".to_string(), mongo_result.clone());

    let model_result = check_env_key("openrouter", "OPENROUTER_API_KEY");
    health
        .services
        .insert("openrouter".to_string(), model_result.clone());

    let geocode_result = check_env_key("geoapify", "GEOAPIFY_API_KEY");
    health
        .services
        .insert("geoapify".to_string(), geocode_result.clone());

    let sms_result = check_env_key("twilio", "TWILIO_ACCOUNT_SID");
    health
        .services
        .insert("twilio".to_string(), sms_result.clone());

    if mongo_result.status != "ok"
        || model_result.status != "ok"
        || geocode_result.status != "ok"
        || sms_result.status != "ok"
    {
        health.status = "degraded".to_string();
    }

    HttpResponse::Ok().json(health)
}

async fn check_mongodb(client: &web::Data<Arc<Client>>) -> ServiceStatus {
    match client.database(DB_NAME).run_command(doc! {"ping": 1}).await {
        Ok(_) => ServiceStatus {
            status: "ok".to_string(),
            details: None,
        },
        Err(e) => ServiceStatus {
            status: "error".to_string(),
            details: Some(e.to_string()),
        },
    }
}

fn check_env_key(name: &str, var: &str) -> ServiceStatus {
    match env::var(var) {
        Ok(value) if !value.is_empty() => ServiceStatus {
            status: "ok".to_string(),
            details: None,
        },
        _ => ServiceStatus {
            status: "error".to_string(),
            details: Some(format!("{} not configured for {}", var, name)),
        },
    }
}
