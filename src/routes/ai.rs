use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::db::mongo::DB_NAME;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::conversation::{AssistantConversation, ConversationTurn};
use crate::models::itinerary::ItineraryDay;
use crate::models::suggestion::{
    ActivitySuggestionRequest, DestinationQuery, DestinationSuggestion, TripRequest,
};
use crate::services::ai::model_client::{ChatMessage, ChatModel};
use crate::services::ai::pipeline::{
    self, decode_array, run_to_json, ACTIVITY_SUGGESTIONS, DESTINATION_SUGGESTIONS,
    ITINERARY_GENERATION,
};
use crate::services::ai::prompt;
use crate::services::geocoding_service::{enrich_destinations, GeocodeLookup};
use crate::models::trip::Trip;
use crate::services::trip_service::{TripService, TRIPS};

use crate::models::itinerary::ActivityOption;

/*
    POST /api/ai/activity-suggestions
*/
pub async fn activity_suggestions<M: ChatModel + 'static>(
    _user: AuthenticatedUser,
    model: web::Data<M>,
    input: web::Json<ActivitySuggestionRequest>,
) -> impl Responder {
    let request = input.into_inner();
    if request.destination.trim().is_empty() || request.date.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({"error": "Destination and date are required"}));
    }

    let prompt = prompt::activity_suggestions_prompt(&request);
    let result = run_to_json(model.get_ref(), prompt, &ACTIVITY_SUGGESTIONS).await;

    match result.and_then(|value| decode_array::<ActivityOption>(&value, "activities")) {
        Ok(activities) => {
            HttpResponse::Ok().json(json!({"success": true, "activities": activities}))
        }
        Err(err) => err.to_response("Failed to generate activity suggestions"),
    }
}

/*
    POST /api/ai/destination-suggestions

    The only pipeline with the enrichment step: geocode each suggestion and
    merge coordinates/address; per-item lookup failures degrade gracefully.
*/
pub async fn destination_suggestions<M, G>(
    _user: AuthenticatedUser,
    model: web::Data<M>,
    geocoder: web::Data<G>,
    input: web::Json<DestinationQuery>,
) -> impl Responder
where
    M: ChatModel + 'static,
    G: GeocodeLookup + 'static,
{
    let query = input.into_inner();

    let prompt = prompt::destination_suggestions_prompt(&query);
    let result = run_to_json(model.get_ref(), prompt, &DESTINATION_SUGGESTIONS).await;

    match result.and_then(|value| decode_array::<DestinationSuggestion>(&value, "destinations")) {
        Ok(destinations) => {
            let enriched = enrich_destinations(geocoder.get_ref(), destinations).await;
            HttpResponse::Ok().json(json!({"success": true, "destinations": enriched}))
        }
        Err(err) => err.to_response("Failed to generate destination suggestions"),
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateItineraryRequest {
    #[serde(flatten)]
    pub trip: TripRequest,
    #[serde(rename = "tripId")]
    pub trip_id: Option<String>,
}

/*
    POST /api/ai/itinerary

    Generates a day-by-day itinerary; when tripId is supplied the result is
    also persisted to that trip (ownership-gated).
*/
pub async fn generate_itinerary<M: ChatModel + 'static>(
    user: AuthenticatedUser,
    data: web::Data<Arc<Client>>,
    model: web::Data<M>,
    input: web::Json<GenerateItineraryRequest>,
) -> impl Responder {
    let request = input.into_inner();
    if request.trip.destination.trim().is_empty()
        || request.trip.start_date.trim().is_empty()
        || request.trip.end_date.trim().is_empty()
    {
        return HttpResponse::BadRequest()
            .json(json!({"error": "Destination, start date, and end date are required"}));
    }

    let prompt = prompt::itinerary_prompt(&request.trip);
    let result = run_to_json(model.get_ref(), prompt, &ITINERARY_GENERATION).await;

    let days = match result.and_then(|value| decode_array::<ItineraryDay>(&value, "days")) {
        Ok(days) => days,
        Err(err) => return err.to_response("Failed to generate itinerary"),
    };

    let Some(trip_id_str) = request.trip_id else {
        return HttpResponse::Ok().json(json!({"success": true, "days": days}));
    };

    let trip_id = match ObjectId::parse_str(&trip_id_str) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({"error": "Invalid trip ID"})),
    };
    let user_id = match ObjectId::parse_str(&user.user_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({"error": "Invalid user ID"})),
    };

    let service = TripService::new(data.get_ref().clone());
    match service.save_itinerary(trip_id, user_id, days.clone()).await {
        Ok(saved) => HttpResponse::Ok().json(json!({
            "success": true,
            "days": days,
            "itineraryId": saved.itinerary_id,
        })),
        Err(err) => err.to_response("Failed to save itinerary"),
    }
}

/*
    POST /api/trips/{id}/itinerary
*/
pub async fn save_itinerary(
    user: AuthenticatedUser,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<crate::models::itinerary::SaveItineraryRequest>,
) -> impl Responder {
    let trip_id = match ObjectId::parse_str(&path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({"error": "Invalid trip ID"})),
    };
    let user_id = match ObjectId::parse_str(&user.user_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({"error": "Invalid user ID"})),
    };

    let service = TripService::new(data.get_ref().clone());
    match service
        .save_itinerary(trip_id, user_id, input.into_inner().days)
        .await
    {
        Ok(saved) => HttpResponse::Ok().json(json!({
            "success": true,
            "itineraryId": saved.itinerary_id,
            "daysSaved": saved.days_saved,
        })),
        Err(err) => err.to_response("Failed to save itinerary"),
    }
}

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    pub message: String,
    #[serde(rename = "tripId")]
    pub trip_id: Option<String>,
}

/*
    POST /api/ai/assistant

    Conversational endpoint: no JSON framing, the raw completion is the
    reply. Exchanges are appended to the caller's conversation document.
*/
pub async fn assistant<M: ChatModel + 'static>(
    user: AuthenticatedUser,
    data: web::Data<Arc<Client>>,
    model: web::Data<M>,
    input: web::Json<AssistantRequest>,
) -> impl Responder {
    let request = input.into_inner();
    if request.message.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "Message is required"}));
    }

    let user_id = match ObjectId::parse_str(&user.user_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().json(json!({"error": "Invalid user ID"})),
    };
    let trip_id = match &request.trip_id {
        Some(raw) => match ObjectId::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                return HttpResponse::BadRequest().json(json!({"error": "Invalid trip ID"}));
            }
        },
        None => None,
    };

    let client = data.get_ref().clone();

    // The system prompt refers to the trip by name when one is in scope;
    // the lookup is ownership-filtered like every other trip read.
    let trip_name = match trip_id {
        Some(id) => {
            let trips: mongodb::Collection<Trip> = client.database(DB_NAME).collection(TRIPS);
            match trips.find_one(doc! { "_id": id, "user_id": user_id }).await {
                Ok(Some(trip)) => Some(trip.name),
                Ok(None) => {
                    return HttpResponse::NotFound().json(json!({"error": "Trip not found"}));
                }
                Err(err) => {
                    eprintln!("Failed to load trip for assistant: {:?}", err);
                    return HttpResponse::InternalServerError()
                        .json(json!({"error": "Failed to load trip"}));
                }
            }
        }
        None => None,
    };

    let conversations: mongodb::Collection<AssistantConversation> =
        client.database(DB_NAME).collection("assistant_conversations");

    let filter = match trip_id {
        Some(id) => doc! { "user_id": user_id, "trip_id": id },
        None => doc! { "user_id": user_id, "trip_id": mongodb::bson::Bson::Null },
    };

    let existing = match conversations.find_one(filter.clone()).await {
        Ok(conversation) => conversation,
        Err(err) => {
            eprintln!("Failed to load conversation: {:?}", err);
            return HttpResponse::InternalServerError()
                .json(json!({"error": "Failed to load conversation"}));
        }
    };

    let mut messages = vec![ChatMessage::system(prompt::assistant_prompt(
        trip_name.as_deref(),
    ))];
    if let Some(conversation) = &existing {
        for turn in &conversation.turns {
            messages.push(ChatMessage {
                role: turn.role.clone(),
                content: turn.content.clone(),
            });
        }
    }
    messages.push(ChatMessage::user(request.message.clone()));

    let reply = match model
        .get_ref()
        .invoke(&messages, &pipeline::ASSISTANT_CHAT)
        .await
    {
        Ok(reply) => reply,
        Err(err) => return err.to_response("Failed to generate assistant reply"),
    };

    let now = Utc::now();
    let new_turns = vec![
        ConversationTurn {
            role: "user".to_string(),
            content: request.message,
            created_at: Some(now),
        },
        ConversationTurn {
            role: "assistant".to_string(),
            content: reply.clone(),
            created_at: Some(now),
        },
    ];

    let persisted = match existing {
        Some(conversation) => {
            let mut turns = conversation.turns;
            turns.extend(new_turns);
            let turns_bson = match mongodb::bson::to_bson(&turns) {
                Ok(bson) => bson,
                Err(err) => {
                    eprintln!("Failed to serialize conversation turns: {:?}", err);
                    return HttpResponse::InternalServerError()
                        .json(json!({"error": "Failed to persist conversation"}));
                }
            };
            conversations
                .update_one(
                    filter,
                    doc! { "$set": {
                        "turns": turns_bson,
                        "updated_at": now.to_rfc3339(),
                    } },
                )
                .await
                .map(|_| ())
        }
        None => conversations
            .insert_one(&AssistantConversation {
                id: None,
                user_id,
                trip_id,
                turns: new_turns,
                created_at: Some(now),
                updated_at: Some(now),
            })
            .await
            .map(|_| ()),
    };

    if let Err(err) = persisted {
        eprintln!("Failed to persist conversation: {:?}", err);
        return HttpResponse::InternalServerError()
            .json(json!({"error": "Failed to persist conversation"}));
    }

    HttpResponse::Ok().json(json!({"success": true, "reply": reply}))
}
