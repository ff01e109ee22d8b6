pub mod ai;
pub mod geocoding_service;
pub mod sms_service;
pub mod trip_service;
