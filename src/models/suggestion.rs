use serde::{Deserialize, Serialize};

/// Transient request for a full itinerary. Built per call, never persisted.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub budget: Option<String>,
    pub travel_style: Option<String>,
    pub interests: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySuggestionRequest {
    pub destination: String,
    pub date: String,
    pub context: ActivityContext,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ActivityContext {
    pub day_number: u32,
    pub total_days: u32,
    pub trip_name: String,
    pub interests: Option<Vec<String>>,
    pub budget: Option<String>,
    pub selected_activities: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DestinationQuery {
    pub travel_month: Option<String>,
    pub budget: Option<String>,
    pub travel_style: Option<String>,
    pub interests: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Destination as suggested by the model. coordinates/address are filled in
/// by geo-enrichment when the lookup succeeds; their absence is valid and
/// must not block the response.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DestinationSuggestion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_time_to_visit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_category: Option<String>,
    pub key_attractions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_daily_budget: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}
