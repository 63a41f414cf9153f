//! Shared types for the charter marketplace
//!
//! Error codes and response envelope, domain models, and the pure domain
//! logic (statistics, sentiment, scoring, lunar calendar, analytics) the
//! HTTP service builds on.

pub mod analytics;
pub mod error;
pub mod lunar;
pub mod models;
pub mod scoring;
pub mod sentiment;
pub mod stats;
pub mod util;

pub use error::{AppError, AppResult, ErrorBody, ErrorCode};
