//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::UserNotFound
            | Self::TripNotFound
            | Self::BookingNotFound
            | Self::PaymentNotFound
            | Self::SubscriptionNotFound
            | Self::BadgeNotFound
            | Self::RewardNotFound
            | Self::ReportNotFound
            | Self::DiaryEntryNotFound
            | Self::CatchNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::EmailAlreadyRegistered
            | Self::TripFull
            | Self::ReviewAlreadyExists
            | Self::BookingAlreadyExists
            | Self::BookingAlreadyPaid
            | Self::BookingNotPayable
            | Self::BadgeCodeExists
            | Self::RewardAlreadyGranted => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied
            | Self::CaptainRequired
            | Self::AdminRequired
            | Self::NotTripOwner
            | Self::PlanLimitReached => StatusCode::FORBIDDEN,

            // 429 Too Many Requests
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            // 503 Service Unavailable (upstream collaborators, client can retry)
            Self::PaymentGatewayUnavailable
            | Self::WeatherUnavailable
            | Self::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ExportFailed => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_status() {
        assert_eq!(ErrorCode::Success.http_status(), StatusCode::OK);
    }

    #[test]
    fn test_not_found_status() {
        assert_eq!(
            ErrorCode::PaymentNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::DiaryEntryNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(ErrorCode::TripFull.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::BookingAlreadyPaid.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::RewardAlreadyGranted.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_auth_and_permission_status() {
        assert_eq!(
            ErrorCode::TokenInvalid.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ErrorCode::NotTripOwner.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ErrorCode::AdminRequired.http_status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_gateway_status() {
        assert_eq!(
            ErrorCode::PaymentGatewayRejected.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::PaymentGatewayUnavailable.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ErrorCode::WeatherUnavailable.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_business_errors_are_bad_request() {
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::PaymentAlreadySucceeded.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::TripInvalidTransition.http_status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_status() {
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::ExportFailed.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
