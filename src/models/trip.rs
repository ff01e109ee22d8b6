use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum TripStatus {
    #[serde(rename = "planning")]
    Planning,
    #[serde(rename = "planned")]
    Planned,
}

/// A trip owned by exactly one user. Child rows (day schedules,
/// accommodations, travel details, companions) carry the trip id and are
/// removed with it.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Trip {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: Option<ObjectId>,
    pub name: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: Option<String>,
    pub travel_style: Option<String>,
    pub interests: Option<Vec<String>>,
    pub status: TripStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NewTrip {
    pub name: String,
    pub destination: String,
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,
    pub budget: Option<String>,
    #[serde(rename = "travelStyle")]
    pub travel_style: Option<String>,
    pub interests: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TripCompanion {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub trip_id: Option<ObjectId>,
    pub name: String,
    pub email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}
