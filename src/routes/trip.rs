use actix_web::{web, HttpResponse, Responder};
use mongodb::bson::oid::ObjectId;
use mongodb::Client;
use serde_json::json;
use std::sync::Arc;

use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::trip::{NewTrip, Trip, TripCompanion, TripStatus};
use crate::services::trip_service::TripService;

fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, HttpResponse> {
    ObjectId::parse_str(raw)
        .map_err(|_| HttpResponse::BadRequest().json(json!({"error": format!("Invalid {}", what)})))
}

fn caller_id(user: &AuthenticatedUser) -> Result<ObjectId, HttpResponse> {
    parse_object_id(&user.user_id, "user ID")
}

/*
    POST /api/trips
*/
pub async fn create_trip(
    user: AuthenticatedUser,
    data: web::Data<Arc<Client>>,
    input: web::Json<NewTrip>,
) -> impl Responder {
    let user_id = match caller_id(&user) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let input = input.into_inner();
    if input.name.trim().is_empty() || input.destination.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({"error": "Trip name and destination are required"}));
    }
    if input.end_date < input.start_date {
        return HttpResponse::BadRequest()
            .json(json!({"error": "End date must not be before start date"}));
    }

    let trip = Trip {
        id: None,
        user_id: Some(user_id),
        name: input.name,
        destination: input.destination,
        start_date: input.start_date,
        end_date: input.end_date,
        budget: input.budget,
        travel_style: input.travel_style,
        interests: input.interests,
        status: TripStatus::Planning,
        created_at: None,
        updated_at: None,
    };

    let service = TripService::new(data.get_ref().clone());
    match service.create_trip(trip).await {
        Ok(trip) => HttpResponse::Ok().json(json!({"success": true, "trip": trip})),
        Err(err) => err.to_response("Failed to create trip"),
    }
}

/*
    GET /api/trips
*/
pub async fn get_trips(user: AuthenticatedUser, data: web::Data<Arc<Client>>) -> impl Responder {
    let user_id = match caller_id(&user) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let service = TripService::new(data.get_ref().clone());
    match service.list_trips(user_id).await {
        Ok(trips) => HttpResponse::Ok().json(json!({"success": true, "trips": trips})),
        Err(err) => err.to_response("Failed to retrieve trips"),
    }
}

/*
    GET /api/trips/{id}
*/
pub async fn get_trip_by_id(
    user: AuthenticatedUser,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let trip_id = match parse_object_id(&path.into_inner(), "trip ID") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let user_id = match caller_id(&user) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let service = TripService::new(data.get_ref().clone());
    match service.find_owned_trip(trip_id, user_id).await {
        Ok(trip) => HttpResponse::Ok().json(json!({"success": true, "trip": trip})),
        Err(err) => err.to_response("Failed to retrieve trip"),
    }
}

/*
    DELETE /api/trips/{id}

    Removes the trip and all rows it owns.
*/
pub async fn delete_trip(
    user: AuthenticatedUser,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let trip_id = match parse_object_id(&path.into_inner(), "trip ID") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let user_id = match caller_id(&user) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let service = TripService::new(data.get_ref().clone());
    match service.delete_trip_cascade(trip_id, user_id).await {
        Ok(()) => HttpResponse::Ok().json(json!({"success": true})),
        Err(err) => err.to_response("Failed to delete trip"),
    }
}

/*
    GET /api/trips/{id}/diary
*/
pub async fn get_trip_diary(
    user: AuthenticatedUser,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let trip_id = match parse_object_id(&path.into_inner(), "trip ID") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let user_id = match caller_id(&user) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let service = TripService::new(data.get_ref().clone());
    match service.trip_diary(trip_id, user_id).await {
        Ok(diary) => HttpResponse::Ok().json(json!({"success": true, "diary": diary})),
        Err(err) => err.to_response("Failed to retrieve trip diary"),
    }
}

/*
    POST /api/trips/{id}/companions
*/
pub async fn add_companion(
    user: AuthenticatedUser,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<TripCompanion>,
) -> impl Responder {
    let trip_id = match parse_object_id(&path.into_inner(), "trip ID") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let user_id = match caller_id(&user) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let companion = input.into_inner();
    if companion.name.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "Companion name is required"}));
    }

    let service = TripService::new(data.get_ref().clone());
    match service.add_companion(trip_id, user_id, companion).await {
        Ok(companion) => HttpResponse::Ok().json(json!({"success": true, "companion": companion})),
        Err(err) => err.to_response("Failed to add companion"),
    }
}

/*
    GET /api/trips/{id}/companions
*/
pub async fn get_companions(
    user: AuthenticatedUser,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let trip_id = match parse_object_id(&path.into_inner(), "trip ID") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let user_id = match caller_id(&user) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let service = TripService::new(data.get_ref().clone());
    match service.list_companions(trip_id, user_id).await {
        Ok(companions) => {
            HttpResponse::Ok().json(json!({"success": true, "companions": companions}))
        }
        Err(err) => err.to_response("Failed to retrieve companions"),
    }
}
