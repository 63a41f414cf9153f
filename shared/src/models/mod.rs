//! Data models
//!
//! Shared between charter-cloud and API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` snowflakes, all timestamps are Unix millis.

pub mod booking;
pub mod chat;
pub mod diary;
pub mod payment;
pub mod report;
pub mod review;
pub mod reward;
pub mod subscription;
pub mod trip;
pub mod user;

// Re-exports
pub use booking::*;
pub use chat::*;
pub use diary::*;
pub use payment::*;
pub use report::*;
pub use review::*;
pub use reward::*;
pub use subscription::*;
pub use trip::*;
pub use user::*;
