//! charter-cloud: group fishing charter marketplace backend
//!
//! - Trips, bookings and participant screening for captains
//! - Stripe payments, refunds and captain subscriptions
//! - Fishing diary with presigned photo uploads
//! - Analytics, scheduled reports and CSV/JSON exports
//! - Badges, rewards and lunar fishing calendar

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod state;
pub mod storage;
pub mod stripe;
pub mod util;
pub mod weather;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
