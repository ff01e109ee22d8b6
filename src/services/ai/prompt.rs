use crate::models::suggestion::{ActivitySuggestionRequest, DestinationQuery, TripRequest};

pub const DATA_START: &str = "TRIP_DATA_START";
pub const DATA_END: &str = "TRIP_DATA_END";

const NOT_SPECIFIED: &str = "Not specified";
const DEFAULT_BUDGET: &str = "Moderate";
const NO_INTERESTS: &str = "No specific interests";

/// Prompt construction is pure string assembly: no clocks, no randomness, no
/// I/O, so identical requests always yield identical prompts. Absent optional
/// fields render a documented fallback token instead of leaking "undefined".
fn budget_or_default(budget: &Option<String>) -> &str {
    budget.as_deref().unwrap_or(DEFAULT_BUDGET)
}

fn interests_or_default(interests: &Option<Vec<String>>) -> String {
    match interests {
        Some(list) if !list.is_empty() => list.join(", "),
        _ => NO_INTERESTS.to_string(),
    }
}

fn optional_or_default(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NOT_SPECIFIED)
}

pub fn activity_suggestions_prompt(req: &ActivitySuggestionRequest) -> String {
    let ctx = &req.context;
    let selected = match &ctx.selected_activities {
        Some(list) if !list.is_empty() => list.join(", "),
        _ => "None yet".to_string(),
    };

    format!(
        "You are a knowledgeable local travel guide for {destination}.\n\
         \n\
         Suggest activities for day {day} of {total} of the trip \"{trip_name}\" on {date}.\n\
         \n\
         Trip context:\n\
         - Destination: {destination}\n\
         - Traveler interests: {interests}\n\
         - Budget level: {budget}\n\
         - Activities already selected: {selected}\n\
         \n\
         Requirements:\n\
         1. Suggest 4 to 6 activities that fit the interests and budget above.\n\
         2. Do not repeat activities already selected.\n\
         3. Spread suggestions across the day (morning, afternoon, evening).\n\
         4. Use realistic local prices in the destination's currency.\n\
         5. Reply with JSON only, wrapped between {start} and {end} markers.\n\
         \n\
         {start}\n\
         {{\"activities\":[{{\"name\":\"Louvre Museum\",\"description\":\"World-famous art museum\",\"duration\":\"3 hours\",\"bestTime\":\"Morning\",\"estimatedCost\":\"17 EUR\",\"category\":\"Culture\"}}]}}\n\
         {end}",
        destination = req.destination,
        day = ctx.day_number,
        total = ctx.total_days,
        trip_name = ctx.trip_name,
        date = req.date,
        interests = interests_or_default(&ctx.interests),
        budget = budget_or_default(&ctx.budget),
        selected = selected,
        start = DATA_START,
        end = DATA_END,
    )
}

pub fn destination_suggestions_prompt(query: &DestinationQuery) -> String {
    format!(
        "You are an experienced travel consultant helping a traveler choose a destination.\n\
         \n\
         Traveler profile:\n\
         - Travel month: {month}\n\
         - Budget level: {budget}\n\
         - Travel style: {style}\n\
         - Interests: {interests}\n\
         \n\
         Requirements:\n\
         1. Suggest exactly 3 destinations matched to the profile above.\n\
         2. Give concrete reasoning for each pick, referencing the profile.\n\
         3. Include the local currency and a realistic daily budget estimate.\n\
         4. Reply with JSON only, wrapped between {start} and {end} markers.\n\
         \n\
         {start}\n\
         {{\"destinations\":[{{\"name\":\"Lisbon\",\"country\":\"Portugal\",\"reasoning\":\"Mild weather and strong food scene\",\"bestTimeToVisit\":\"May to October\",\"budgetCategory\":\"Moderate\",\"keyAttractions\":[\"Belem Tower\",\"Alfama\"],\"currency\":\"EUR\",\"estimatedDailyBudget\":\"90 EUR\"}}]}}\n\
         {end}",
        month = optional_or_default(&query.travel_month),
        budget = budget_or_default(&query.budget),
        style = optional_or_default(&query.travel_style),
        interests = interests_or_default(&query.interests),
        start = DATA_START,
        end = DATA_END,
    )
}

pub fn itinerary_prompt(req: &TripRequest) -> String {
    format!(
        "You are an expert trip planner building a day-by-day itinerary.\n\
         \n\
         Trip details:\n\
         - Destination: {destination}\n\
         - Dates: {start_date} to {end_date}\n\
         - Budget level: {budget}\n\
         - Travel style: {style}\n\
         - Interests: {interests}\n\
         \n\
         Requirements:\n\
         1. Produce one entry per day covering the full date range, with dayNumber starting at 1 and counting up without gaps.\n\
         2. Each day lists 2 to 4 activities with duration, best time, and estimated cost.\n\
         3. Include an accommodation suggestion per day and short notes where useful.\n\
         4. Keep every date inside the trip's date range.\n\
         5. Reply with JSON only, wrapped between {start} and {end} markers.\n\
         \n\
         {start}\n\
         {{\"days\":[{{\"dayNumber\":1,\"date\":\"2025-06-01\",\"activities\":[{{\"name\":\"Old town walking tour\",\"description\":\"Guided orientation walk\",\"duration\":\"2 hours\",\"bestTime\":\"Morning\",\"estimatedCost\":\"15 EUR\",\"category\":\"Sightseeing\"}}],\"accommodation\":{{\"name\":\"Hotel Central\",\"type\":\"Hotel\",\"estimatedCost\":\"120 EUR\"}},\"notes\":\"Arrive by noon\"}}]}}\n\
         {end}",
        destination = req.destination,
        start_date = req.start_date,
        end_date = req.end_date,
        budget = budget_or_default(&req.budget),
        style = optional_or_default(&req.travel_style),
        interests = interests_or_default(&req.interests),
        start = DATA_START,
        end = DATA_END,
    )
}

pub fn assistant_prompt(trip_name: Option<&str>) -> String {
    match trip_name {
        Some(name) => format!(
            "You are a helpful travel assistant. The traveler is planning the trip \"{}\". \
             Answer questions concisely and practically, with concrete suggestions.",
            name
        ),
        None => "You are a helpful travel assistant. \
                 Answer questions concisely and practically, with concrete suggestions."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::suggestion::ActivityContext;

    fn bare_activity_request() -> ActivitySuggestionRequest {
        ActivitySuggestionRequest {
            destination: "Paris".to_string(),
            date: "2025-06-01".to_string(),
            context: ActivityContext {
                day_number: 1,
                total_days: 3,
                trip_name: "Summer Trip".to_string(),
                interests: None,
                budget: None,
                selected_activities: None,
            },
        }
    }

    #[test]
    fn omitted_optional_fields_never_render_undefined() {
        let prompt = activity_suggestions_prompt(&bare_activity_request());
        assert!(!prompt.contains("undefined"));
        assert!(prompt.contains(DEFAULT_BUDGET));
        assert!(prompt.contains(NO_INTERESTS));

        let prompt = destination_suggestions_prompt(&DestinationQuery::default());
        assert!(!prompt.contains("undefined"));
        assert!(prompt.contains(NOT_SPECIFIED));

        let prompt = itinerary_prompt(&TripRequest {
            destination: "Kyoto".to_string(),
            start_date: "2025-04-01".to_string(),
            end_date: "2025-04-05".to_string(),
            budget: None,
            travel_style: None,
            interests: None,
        });
        assert!(!prompt.contains("undefined"));
    }

    #[test]
    fn prompts_are_deterministic() {
        let req = bare_activity_request();
        assert_eq!(activity_suggestions_prompt(&req), activity_suggestions_prompt(&req));
    }

    #[test]
    fn prompts_carry_sentinels_and_request_fields() {
        let req = bare_activity_request();
        let prompt = activity_suggestions_prompt(&req);
        assert!(prompt.contains(DATA_START));
        assert!(prompt.contains(DATA_END));
        assert!(prompt.contains("Paris"));
        assert!(prompt.contains("Summer Trip"));
        assert!(prompt.contains("2025-06-01"));
    }

    #[test]
    fn assistant_prompt_names_the_trip_when_one_is_in_scope() {
        let prompt = assistant_prompt(Some("Summer Trip"));
        assert!(prompt.contains("\"Summer Trip\""));
        assert!(!assistant_prompt(None).contains("trip \""));
    }

    #[test]
    fn interests_are_quoted_verbatim() {
        let mut req = bare_activity_request();
        req.context.interests = Some(vec!["art".to_string(), "food".to_string()]);
        let prompt = activity_suggestions_prompt(&req);
        assert!(prompt.contains("art, food"));
    }
}
