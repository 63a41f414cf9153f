//! Unified service-layer error type
//!
//! `ServiceError` bridges DB-layer errors (`sqlx::Error`, `BoxError`) and the
//! API-layer `AppError`, so handlers can use `?` on both.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::BoxError;

/// - `Db`: database/infrastructure errors (logged, mapped to InternalError)
/// - `App`: business-rule errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Map a unique-constraint violation to a conflict code, anything else to a DB error
pub fn conflict_on_unique(e: sqlx::Error, code: ErrorCode) -> ServiceError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::new(code).into(),
        _ => e.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_errors_hide_details() {
        let err: AppError = ServiceError::Db("connection reset".into()).into();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert!(!err.message.contains("connection reset"));
    }

    #[test]
    fn app_errors_pass_through() {
        let err: AppError = ServiceError::from(AppError::new(ErrorCode::TripFull)).into();
        assert_eq!(err.code, ErrorCode::TripFull);
    }

    #[test]
    fn non_unique_errors_stay_db_errors() {
        let err = conflict_on_unique(sqlx::Error::RowNotFound, ErrorCode::BadgeCodeExists);
        assert!(matches!(err, ServiceError::Db(_)));
    }
}
