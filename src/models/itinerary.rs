use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// One activity as returned by the model. Every field is optional on decode:
/// model output is untrusted JSON and absence of a field is a normal state,
/// not an error.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityOption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Accommodation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<String>,
}

/// One day of an itinerary. day_number is 1-based and contiguous across the
/// trip's date range.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ItineraryDay {
    pub day_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub activities: Vec<ActivityOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accommodation: Option<Accommodation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveItineraryRequest {
    pub days: Vec<ItineraryDay>,
}

/// Persisted row in `trip_day_schedules`, one per itinerary day.
#[derive(Debug, Deserialize, Serialize)]
pub struct DayScheduleRow {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub trip_id: ObjectId,
    pub day_number: u32,
    pub date: Option<String>,
    pub activities: Vec<ActivityOption>,
    pub accommodation: Option<Accommodation>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AccommodationRow {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub trip_id: ObjectId,
    pub name: String,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub estimated_cost: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TravelDetailRow {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub trip_id: ObjectId,
    pub mode: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub estimated_cost: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}
