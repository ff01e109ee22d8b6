use chrono::{NaiveDate, Utc};
use futures::{try_join, TryStreamExt};
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, Collection};
use serde::Serialize;
use std::sync::Arc;

use crate::db::mongo::DB_NAME;
use crate::errors::ApiError;
use crate::models::itinerary::{AccommodationRow, DayScheduleRow, ItineraryDay, TravelDetailRow};
use crate::models::trip::{Trip, TripCompanion, TripStatus};

pub const TRIPS: &str = "trips";
pub const DAY_SCHEDULES: &str = "trip_day_schedules";
pub const ACCOMMODATIONS: &str = "trip_accommodations";
pub const TRAVEL_DETAILS: &str = "trip_travel_details";
pub const COMPANIONS: &str = "trip_companions";

#[derive(Debug, Serialize)]
pub struct SavedItinerary {
    pub itinerary_id: String,
    pub days_saved: usize,
}

#[derive(Debug, Serialize)]
pub struct TripDiary {
    pub trip: Trip,
    pub days: Vec<DayScheduleRow>,
    pub accommodations: Vec<AccommodationRow>,
    pub travel_details: Vec<TravelDetailRow>,
}

/// Ownership is the sole authorization gate on trip writes: checked before
/// any row is touched, so an authorization failure never leaves a partial
/// write behind.
pub fn authorize_owner(trip_owner: Option<ObjectId>, caller: ObjectId) -> Result<(), ApiError> {
    match trip_owner {
        Some(owner) if owner == caller => Ok(()),
        _ => Err(ApiError::Authorization(
            "You do not have access to this trip".to_string(),
        )),
    }
}

/// An itinerary must be a non-empty run of 1-based, contiguous day numbers.
pub fn validate_days(days: &[ItineraryDay]) -> Result<(), ApiError> {
    if days.is_empty() {
        return Err(ApiError::Validation(
            "Itinerary must contain at least one day".to_string(),
        ));
    }
    for (idx, day) in days.iter().enumerate() {
        if day.day_number != (idx as u32) + 1 {
            return Err(ApiError::Validation(format!(
                "Day numbers must be contiguous starting at 1; found {} at position {}",
                day.day_number, idx
            )));
        }
    }
    Ok(())
}

/// Every dated day must fall inside the trip's date range. Days without a
/// date pass; an unparseable date is rejected rather than silently stored.
pub fn validate_day_dates(
    start: NaiveDate,
    end: NaiveDate,
    days: &[ItineraryDay],
) -> Result<(), ApiError> {
    for day in days {
        let Some(raw) = day.date.as_deref() else {
            continue;
        };
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            ApiError::Validation(format!(
                "Unrecognized date '{}' on day {}",
                raw, day.day_number
            ))
        })?;
        if date < start || date > end {
            return Err(ApiError::Validation(format!(
                "Day {} date {} falls outside the trip dates",
                day.day_number, raw
            )));
        }
    }
    Ok(())
}

pub struct TripService {
    client: Arc<Client>,
}

impl TripService {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.client.database(DB_NAME).collection(name)
    }

    async fn fetch_trip(&self, trip_id: ObjectId) -> Result<Trip, ApiError> {
        let trips: Collection<Trip> = self.collection(TRIPS);
        trips
            .find_one(doc! { "_id": trip_id })
            .await?
            .ok_or_else(|| ApiError::NotFound("Trip not found".to_string()))
    }

    pub async fn find_owned_trip(
        &self,
        trip_id: ObjectId,
        user_id: ObjectId,
    ) -> Result<Trip, ApiError> {
        let trip = self.fetch_trip(trip_id).await?;
        authorize_owner(trip.user_id, user_id)?;
        Ok(trip)
    }

    /// Attach an itinerary to a trip. Writes replace any prior day schedules
    /// and flip the trip to `planned`. The sequence is best-effort rather
    /// than transactional; the ownership precondition is the only gate.
    pub async fn save_itinerary(
        &self,
        trip_id: ObjectId,
        user_id: ObjectId,
        days: Vec<ItineraryDay>,
    ) -> Result<SavedItinerary, ApiError> {
        validate_days(&days)?;
        let trip = self.fetch_trip(trip_id).await?;
        self.attach_itinerary(&trip, user_id, days).await
    }

    /// Write phase for an already-loaded trip. Validation and the ownership
    /// check run before any collection is touched.
    pub async fn attach_itinerary(
        &self,
        trip: &Trip,
        caller: ObjectId,
        days: Vec<ItineraryDay>,
    ) -> Result<SavedItinerary, ApiError> {
        validate_days(&days)?;
        authorize_owner(trip.user_id, caller)?;
        validate_day_dates(trip.start_date, trip.end_date, &days)?;
        let trip_id = trip
            .id
            .ok_or_else(|| ApiError::NotFound("Trip not found".to_string()))?;

        let schedules: Collection<DayScheduleRow> = self.collection(DAY_SCHEDULES);
        schedules.delete_many(doc! { "trip_id": trip_id }).await?;

        let now = Utc::now();
        let rows: Vec<DayScheduleRow> = days
            .into_iter()
            .map(|day| DayScheduleRow {
                id: None,
                trip_id,
                day_number: day.day_number,
                date: day.date,
                activities: day.activities,
                accommodation: day.accommodation,
                notes: day.notes,
                created_at: Some(now),
            })
            .collect();
        let days_saved = rows.len();
        schedules.insert_many(&rows).await?;

        let trips: Collection<Trip> = self.collection(TRIPS);
        trips
            .update_one(
                doc! { "_id": trip_id },
                doc! { "$set": {
                    "status": "planned",
                    "updated_at": now.to_rfc3339(),
                } },
            )
            .await?;

        Ok(SavedItinerary {
            itinerary_id: trip_id.to_hex(),
            days_saved,
        })
    }

    /// Diary view: the three child reads are mutually independent, so they
    /// are issued concurrently.
    pub async fn trip_diary(
        &self,
        trip_id: ObjectId,
        user_id: ObjectId,
    ) -> Result<TripDiary, ApiError> {
        let trip = self.find_owned_trip(trip_id, user_id).await?;

        let schedules: Collection<DayScheduleRow> = self.collection(DAY_SCHEDULES);
        let accommodations: Collection<AccommodationRow> = self.collection(ACCOMMODATIONS);
        let travel: Collection<TravelDetailRow> = self.collection(TRAVEL_DETAILS);
        let filter = doc! { "trip_id": trip_id };

        let (days, accommodations, travel_details) = try_join!(
            async {
                schedules
                    .find(filter.clone())
                    .sort(doc! { "day_number": 1 })
                    .await?
                    .try_collect::<Vec<_>>()
                    .await
            },
            async {
                accommodations
                    .find(filter.clone())
                    .await?
                    .try_collect::<Vec<_>>()
                    .await
            },
            async {
                travel
                    .find(filter.clone())
                    .await?
                    .try_collect::<Vec<_>>()
                    .await
            },
        )?;

        Ok(TripDiary {
            trip,
            days,
            accommodations,
            travel_details,
        })
    }

    /// Trip deleted => children deleted. Children are removed first so a
    /// partial failure never orphans rows behind a missing trip.
    pub async fn delete_trip_cascade(
        &self,
        trip_id: ObjectId,
        user_id: ObjectId,
    ) -> Result<(), ApiError> {
        self.find_owned_trip(trip_id, user_id).await?;

        let filter = doc! { "trip_id": trip_id };
        self.collection::<DayScheduleRow>(DAY_SCHEDULES)
            .delete_many(filter.clone())
            .await?;
        self.collection::<AccommodationRow>(ACCOMMODATIONS)
            .delete_many(filter.clone())
            .await?;
        self.collection::<TravelDetailRow>(TRAVEL_DETAILS)
            .delete_many(filter.clone())
            .await?;
        self.collection::<TripCompanion>(COMPANIONS)
            .delete_many(filter)
            .await?;

        self.collection::<Trip>(TRIPS)
            .delete_one(doc! { "_id": trip_id })
            .await?;

        Ok(())
    }

    pub async fn add_companion(
        &self,
        trip_id: ObjectId,
        user_id: ObjectId,
        mut companion: TripCompanion,
    ) -> Result<TripCompanion, ApiError> {
        self.find_owned_trip(trip_id, user_id).await?;

        companion.trip_id = Some(trip_id);
        companion.created_at = Some(Utc::now());
        self.collection::<TripCompanion>(COMPANIONS)
            .insert_one(&companion)
            .await?;
        Ok(companion)
    }

    pub async fn list_companions(
        &self,
        trip_id: ObjectId,
        user_id: ObjectId,
    ) -> Result<Vec<TripCompanion>, ApiError> {
        self.find_owned_trip(trip_id, user_id).await?;

        let companions = self
            .collection::<TripCompanion>(COMPANIONS)
            .find(doc! { "trip_id": trip_id })
            .await?
            .try_collect()
            .await?;
        Ok(companions)
    }

    pub async fn list_trips(&self, user_id: ObjectId) -> Result<Vec<Trip>, ApiError> {
        let trips = self
            .collection::<Trip>(TRIPS)
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(trips)
    }

    pub async fn create_trip(&self, mut trip: Trip) -> Result<Trip, ApiError> {
        let now = Utc::now();
        trip.status = TripStatus::Planning;
        trip.created_at = Some(now);
        trip.updated_at = Some(now);

        let trips: Collection<Trip> = self.collection(TRIPS);
        let result = trips.insert_one(&trip).await?;
        trip.id = result.inserted_id.as_object_id();
        Ok(trip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: u32) -> ItineraryDay {
        ItineraryDay {
            day_number: n,
            ..Default::default()
        }
    }

    #[test]
    fn owner_mismatch_is_forbidden() {
        let owner = ObjectId::new();
        let stranger = ObjectId::new();
        let err = authorize_owner(Some(owner), stranger).unwrap_err();
        assert!(matches!(err, ApiError::Authorization(_)));
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn missing_owner_is_forbidden() {
        let err = authorize_owner(None, ObjectId::new()).unwrap_err();
        assert!(matches!(err, ApiError::Authorization(_)));
    }

    #[test]
    fn owner_match_is_allowed() {
        let owner = ObjectId::new();
        assert!(authorize_owner(Some(owner), owner).is_ok());
    }

    #[test]
    fn empty_itinerary_fails_validation() {
        let err = validate_days(&[]).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn contiguous_one_based_days_pass() {
        assert!(validate_days(&[day(1), day(2), day(3)]).is_ok());
    }

    #[test]
    fn gapped_or_zero_based_days_fail() {
        assert!(validate_days(&[day(0), day(1)]).is_err());
        assert!(validate_days(&[day(1), day(3)]).is_err());
    }

    fn dated_day(n: u32, date: &str) -> ItineraryDay {
        ItineraryDay {
            day_number: n,
            date: Some(date.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn day_dates_inside_the_trip_range_pass() {
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        let days = [dated_day(1, "2025-06-01"), dated_day(2, "2025-06-03")];
        assert!(validate_day_dates(start, end, &days).is_ok());
        // Undated days are fine too
        assert!(validate_day_dates(start, end, &[day(1)]).is_ok());
    }

    #[test]
    fn day_dates_outside_the_trip_range_fail() {
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        let err = validate_day_dates(start, end, &[dated_day(1, "2025-06-04")]).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(validate_day_dates(start, end, &[dated_day(1, "2025-05-31")]).is_err());
    }

    #[test]
    fn unparseable_day_dates_are_rejected() {
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        let err = validate_day_dates(start, end, &[dated_day(1, "June 2nd")]).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
