//! Review, payment and earnings analytics

use axum::routing::get;
use axum::{Extension, Json, Router, extract::State};
use serde::Deserialize;
use shared::analytics::{
    Bucket, DateRange, EarningsAnalytics, PaymentAnalytics, ReviewAnalytics, earnings_analytics,
    payment_analytics, review_analytics,
};
use shared::error::{AppError, ErrorCode};

use super::{ApiResult, AppQuery, internal};
use crate::auth::UserIdentity;
use crate::db;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/analytics/reviews", get(reviews))
        .route("/api/analytics/payments", get(payments))
        .route("/api/analytics/earnings", get(earnings))
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub from: Option<i64>,
    pub to: Option<i64>,
    /// Admins only: captain whose reviews to analyse (all captains when unset)
    pub captain_id: Option<i64>,
    #[serde(default)]
    pub bucket: Bucket,
}

impl AnalyticsQuery {
    fn range(&self) -> Result<DateRange, AppError> {
        let range = DateRange {
            from: self.from,
            to: self.to,
        };
        if range.from_or_min() > range.to_or_max() {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                "`from` must not be after `to`",
            ));
        }
        Ok(range)
    }
}

/// GET /api/analytics/reviews
pub async fn reviews(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppQuery(query): AppQuery<AnalyticsQuery>,
) -> ApiResult<ReviewAnalytics> {
    identity.require_captain()?;
    let range = query.range()?;
    let captain = if identity.is_admin() {
        query.captain_id
    } else {
        Some(identity.user_id)
    };

    let rows = db::reviews::list_for_captain(
        &state.pool,
        captain,
        range.from_or_min(),
        range.to_or_max(),
    )
    .await
    .map_err(internal)?;
    Ok(Json(review_analytics(&rows)))
}

/// GET /api/analytics/payments (admin)
pub async fn payments(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppQuery(query): AppQuery<AnalyticsQuery>,
) -> ApiResult<PaymentAnalytics> {
    identity.require_admin()?;
    let range = query.range()?;
    let rows = db::payments::list_in_range(&state.pool, range.from_or_min(), range.to_or_max())
        .await
        .map_err(internal)?;
    Ok(Json(payment_analytics(&rows)))
}

/// GET /api/analytics/earnings
pub async fn earnings(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppQuery(query): AppQuery<AnalyticsQuery>,
) -> ApiResult<EarningsAnalytics> {
    identity.require_captain()?;
    let range = query.range()?;
    let captain = match (identity.is_admin(), query.captain_id) {
        (true, Some(id)) => id,
        _ => identity.user_id,
    };
    let rows = db::payments::earnings_rows(
        &state.pool,
        captain,
        range.from_or_min(),
        range.to_or_max(),
    )
    .await
    .map_err(internal)?;
    Ok(Json(earnings_analytics(
        &rows,
        query.bucket,
        state.billing.platform_fee_bps,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;

    #[test]
    fn inverted_range_is_rejected() {
        let query = AnalyticsQuery {
            from: Some(10),
            to: Some(5),
            ..Default::default()
        };
        assert_eq!(query.range().unwrap_err().code, ErrorCode::ValueOutOfRange);

        let open = AnalyticsQuery::default().range().unwrap();
        assert_eq!(open.to_or_max(), i64::MAX);
    }

    #[test]
    fn bucket_defaults_to_month() {
        let uri: http::Uri = "/api/analytics/earnings?from=0".parse().unwrap();
        let Query(q) = Query::<AnalyticsQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(q.bucket, Bucket::Month);
        assert_eq!(q.from, Some(0));
    }
}
