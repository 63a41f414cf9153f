//! Error codes and the error type shared by the service and its clients
//!
//! Codes are grouped by the thousand: 0xxx general, 1xxx auth, 2xxx
//! permission, 3xxx trip, 4xxx booking, 5xxx payment, 6xxx reward,
//! 7xxx report, 8xxx diary/calendar, 9xxx system.
//!
//! ```
//! use shared::error::{AppError, ErrorBody, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::TripFull).with_detail("seats_left", 1);
//! let body = ErrorBody::from(&err);
//! assert_eq!(body.code, 3003);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult, ErrorBody};
