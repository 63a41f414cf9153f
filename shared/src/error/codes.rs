//! Unified error codes for the charter marketplace
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Trip and review errors
//! - 4xxx: Booking errors
//! - 5xxx: Payment and subscription errors
//! - 6xxx: Badge and reward errors
//! - 7xxx: Report and export errors
//! - 8xxx: Diary, calendar and storage errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the web client can switch
/// on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Email is already registered
    EmailAlreadyRegistered = 1005,
    /// Too many requests from this client
    TooManyRequests = 1007,
    /// User not found
    UserNotFound = 1008,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Captain role required
    CaptainRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,
    /// Caller does not own the trip
    NotTripOwner = 2004,
    /// Open trip limit of the captain's plan reached
    PlanLimitReached = 2005,

    // ==================== 3xxx: Trip ====================
    /// Trip not found
    TripNotFound = 3001,
    /// Trip is not open for booking
    TripNotOpen = 3002,
    /// Trip has no seats left
    TripFull = 3003,
    /// Trip status transition not allowed
    TripInvalidTransition = 3004,
    /// Departure time is in the past
    TripDepartureInPast = 3005,
    /// Review already submitted for this trip
    ReviewAlreadyExists = 3101,
    /// Caller has no completed booking on this trip
    ReviewNotEligible = 3102,

    // ==================== 4xxx: Booking ====================
    /// Booking not found
    BookingNotFound = 4001,
    /// Active booking already exists for this trip
    BookingAlreadyExists = 4002,
    /// Booking is not pending
    BookingNotPending = 4003,
    /// Booking cannot be paid in its current status
    BookingNotPayable = 4004,
    /// Booking has already been paid
    BookingAlreadyPaid = 4005,
    /// Captains cannot book their own trips
    CannotBookOwnTrip = 4006,
    /// Booking cannot be cancelled in its current status
    BookingNotCancellable = 4007,

    // ==================== 5xxx: Payment ====================
    /// Payment not found
    PaymentNotFound = 5001,
    /// Payment has already succeeded
    PaymentAlreadySucceeded = 5002,
    /// Payment cannot be cancelled in its current status
    PaymentNotCancellable = 5003,
    /// Payment gateway rejected the request
    PaymentGatewayRejected = 5004,
    /// Payment gateway unreachable or failing
    PaymentGatewayUnavailable = 5005,
    /// Subscription not found
    SubscriptionNotFound = 5007,

    // ==================== 6xxx: Reward ====================
    /// Badge definition not found
    BadgeNotFound = 6001,
    /// Badge code already exists
    BadgeCodeExists = 6002,
    /// User already holds this badge
    RewardAlreadyGranted = 6003,
    /// Reward not found
    RewardNotFound = 6004,

    // ==================== 7xxx: Report ====================
    /// Scheduled report not found
    ReportNotFound = 7001,
    /// Export generation failed
    ExportFailed = 7002,
    /// Scheduled report is disabled
    ReportDisabled = 7003,

    // ==================== 8xxx: Diary ====================
    /// Diary entry not found
    DiaryEntryNotFound = 8001,
    /// Catch index not found in diary entry
    CatchNotFound = 8002,
    /// Photo key was never issued for this entry or the object is missing
    PhotoNotUploaded = 8003,
    /// Weather service unavailable
    WeatherUnavailable = 8101,
    /// Object storage unavailable
    StorageUnavailable = 8102,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::EmailAlreadyRegistered => "Email is already registered",
            ErrorCode::TooManyRequests => "Too many requests, try again later",
            ErrorCode::UserNotFound => "User not found",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::CaptainRequired => "Captain role is required",
            ErrorCode::AdminRequired => "Administrator role is required",
            ErrorCode::NotTripOwner => "Only the trip captain can do this",
            ErrorCode::PlanLimitReached => "Open trip limit of your plan reached",

            // Trip
            ErrorCode::TripNotFound => "Trip not found",
            ErrorCode::TripNotOpen => "Trip is not open for booking",
            ErrorCode::TripFull => "Not enough seats left on this trip",
            ErrorCode::TripInvalidTransition => "Trip status change not allowed",
            ErrorCode::TripDepartureInPast => "Departure time must be in the future",
            ErrorCode::ReviewAlreadyExists => "Trip has already been reviewed",
            ErrorCode::ReviewNotEligible => "Only participants of a completed trip can review it",

            // Booking
            ErrorCode::BookingNotFound => "Booking not found",
            ErrorCode::BookingAlreadyExists => "You already have a booking on this trip",
            ErrorCode::BookingNotPending => "Booking is not pending",
            ErrorCode::BookingNotPayable => "Booking cannot be paid in its current status",
            ErrorCode::BookingAlreadyPaid => "Booking has already been paid",
            ErrorCode::CannotBookOwnTrip => "Captains cannot book their own trip",
            ErrorCode::BookingNotCancellable => "Booking cannot be cancelled",

            // Payment
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::PaymentAlreadySucceeded => "Payment has already succeeded",
            ErrorCode::PaymentNotCancellable => "Payment cannot be cancelled",
            ErrorCode::PaymentGatewayRejected => "Payment gateway rejected the request",
            ErrorCode::PaymentGatewayUnavailable => "Payment gateway is unavailable",
            ErrorCode::SubscriptionNotFound => "Subscription not found",

            // Reward
            ErrorCode::BadgeNotFound => "Badge not found",
            ErrorCode::BadgeCodeExists => "Badge code already exists",
            ErrorCode::RewardAlreadyGranted => "User already holds this badge",
            ErrorCode::RewardNotFound => "Reward not found",

            // Report
            ErrorCode::ReportNotFound => "Scheduled report not found",
            ErrorCode::ExportFailed => "Export generation failed",
            ErrorCode::ReportDisabled => "Scheduled report is disabled",

            // Diary
            ErrorCode::DiaryEntryNotFound => "Diary entry not found",
            ErrorCode::CatchNotFound => "Catch not found",
            ErrorCode::PhotoNotUploaded => "Photo has not been uploaded",
            ErrorCode::WeatherUnavailable => "Weather service is unavailable",
            ErrorCode::StorageUnavailable => "Object storage is unavailable",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::EmailAlreadyRegistered),
            1007 => Ok(ErrorCode::TooManyRequests),
            1008 => Ok(ErrorCode::UserNotFound),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::CaptainRequired),
            2003 => Ok(ErrorCode::AdminRequired),
            2004 => Ok(ErrorCode::NotTripOwner),
            2005 => Ok(ErrorCode::PlanLimitReached),

            // Trip
            3001 => Ok(ErrorCode::TripNotFound),
            3002 => Ok(ErrorCode::TripNotOpen),
            3003 => Ok(ErrorCode::TripFull),
            3004 => Ok(ErrorCode::TripInvalidTransition),
            3005 => Ok(ErrorCode::TripDepartureInPast),
            3101 => Ok(ErrorCode::ReviewAlreadyExists),
            3102 => Ok(ErrorCode::ReviewNotEligible),

            // Booking
            4001 => Ok(ErrorCode::BookingNotFound),
            4002 => Ok(ErrorCode::BookingAlreadyExists),
            4003 => Ok(ErrorCode::BookingNotPending),
            4004 => Ok(ErrorCode::BookingNotPayable),
            4005 => Ok(ErrorCode::BookingAlreadyPaid),
            4006 => Ok(ErrorCode::CannotBookOwnTrip),
            4007 => Ok(ErrorCode::BookingNotCancellable),

            // Payment
            5001 => Ok(ErrorCode::PaymentNotFound),
            5002 => Ok(ErrorCode::PaymentAlreadySucceeded),
            5003 => Ok(ErrorCode::PaymentNotCancellable),
            5004 => Ok(ErrorCode::PaymentGatewayRejected),
            5005 => Ok(ErrorCode::PaymentGatewayUnavailable),
            5007 => Ok(ErrorCode::SubscriptionNotFound),

            // Reward
            6001 => Ok(ErrorCode::BadgeNotFound),
            6002 => Ok(ErrorCode::BadgeCodeExists),
            6003 => Ok(ErrorCode::RewardAlreadyGranted),
            6004 => Ok(ErrorCode::RewardNotFound),

            // Report
            7001 => Ok(ErrorCode::ReportNotFound),
            7002 => Ok(ErrorCode::ExportFailed),
            7003 => Ok(ErrorCode::ReportDisabled),

            // Diary
            8001 => Ok(ErrorCode::DiaryEntryNotFound),
            8002 => Ok(ErrorCode::CatchNotFound),
            8003 => Ok(ErrorCode::PhotoNotUploaded),
            8101 => Ok(ErrorCode::WeatherUnavailable),
            8102 => Ok(ErrorCode::StorageUnavailable),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[ErrorCode] = &[
        ErrorCode::Success,
        ErrorCode::ValidationFailed,
        ErrorCode::NotAuthenticated,
        ErrorCode::TooManyRequests,
        ErrorCode::NotTripOwner,
        ErrorCode::TripFull,
        ErrorCode::ReviewNotEligible,
        ErrorCode::BookingNotCancellable,
        ErrorCode::PaymentGatewayUnavailable,
        ErrorCode::RewardAlreadyGranted,
        ErrorCode::ReportDisabled,
        ErrorCode::PhotoNotUploaded,
        ErrorCode::StorageUnavailable,
    ];

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::TripNotFound.code(), 3001);
        assert_eq!(ErrorCode::ReviewAlreadyExists.code(), 3101);
        assert_eq!(ErrorCode::BookingNotFound.code(), 4001);
        assert_eq!(ErrorCode::PaymentNotFound.code(), 5001);
        assert_eq!(ErrorCode::BadgeNotFound.code(), 6001);
        assert_eq!(ErrorCode::ReportNotFound.code(), 7001);
        assert_eq!(ErrorCode::DiaryEntryNotFound.code(), 8001);
        assert_eq!(ErrorCode::WeatherUnavailable.code(), 8101);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_matches_code() {
        for code in ALL {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(*code));
        }
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::Unknown.is_success());
        assert!(!ErrorCode::PaymentNotFound.is_success());
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::TripFull).unwrap();
        assert_eq!(json, "3003");
        let code: ErrorCode = serde_json::from_str("5002").unwrap();
        assert_eq!(code, ErrorCode::PaymentAlreadySucceeded);
        assert!(serde_json::from_str::<ErrorCode>("12345").is_err());
    }
}
