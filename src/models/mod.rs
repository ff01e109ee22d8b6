pub mod conversation;
pub mod itinerary;
pub mod suggestion;
pub mod trip;
pub mod user;
