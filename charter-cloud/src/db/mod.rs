//! Database access layer

pub mod automation_rules;
pub mod badges;
pub mod bookings;
pub mod diary;
pub mod exports;
pub mod metrics;
pub mod payments;
pub mod reports;
pub mod reviews;
pub mod rewards;
pub mod subscriptions;
pub mod trips;
pub mod users;
pub mod webhook_events;
