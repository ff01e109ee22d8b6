mod common;

use actix_web::{test, web, App};
use serde_json::json;
use serial_test::serial;

use roamline_api::routes;

#[actix_web::test]
#[serial]
async fn health_reports_degraded_when_database_is_unreachable() {
    let client = common::unreachable_mongo().await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(client))
            .route("/health", web::get().to(routes::health::health_check)),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["mongodb"]["status"], "error");
}

#[actix_web::test]
#[serial]
async fn signup_rejects_invalid_email_before_touching_the_database() {
    let client = common::unreachable_mongo().await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(client))
            .route("/api/auth/signup", web::post().to(routes::account::auth::signup)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(&json!({"email": "not-an-email", "password": "longenough"}))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid email address");
}

#[actix_web::test]
#[serial]
async fn signup_rejects_short_passwords() {
    let client = common::unreachable_mongo().await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(client))
            .route("/api/auth/signup", web::post().to(routes::account::auth::signup)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(&json!({"email": "traveler@example.com", "password": "short"}))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Password must be at least 8 characters");
}
