pub mod account;
pub mod ai;
pub mod health;
pub mod trip;
