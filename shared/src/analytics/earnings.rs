use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Bucket, offset_points};
use crate::stats::{linear_regression_slope, round2};

/// One captured payment on a captain's trip
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct EarningRow {
    pub payment_id: i64,
    pub trip_id: i64,
    pub trip_title: String,
    pub amount_cents: i64,
    pub refunded_cents: i64,
    pub paid_at: i64,
}

impl EarningRow {
    pub fn gross_cents(&self) -> i64 {
        (self.amount_cents - self.refunded_cents).max(0)
    }
}

/// Platform share in basis points, rounded half up
pub fn platform_fee(gross_cents: i64, fee_bps: u32) -> i64 {
    (gross_cents * i64::from(fee_bps) + 5_000) / 10_000
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripEarning {
    pub trip_id: i64,
    pub title: String,
    pub payments: usize,
    pub gross_cents: i64,
    pub net_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarningsBucket {
    pub start: NaiveDate,
    pub payments: usize,
    pub gross_cents: i64,
    pub net_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarningsAnalytics {
    pub bucket: Bucket,
    pub fee_bps: u32,
    pub gross_cents: i64,
    pub platform_fee_cents: i64,
    pub net_cents: i64,
    pub trips: Vec<TripEarning>,
    pub buckets: Vec<EarningsBucket>,
    /// Net change per bucket
    pub trend_slope: Option<f64>,
    /// Linear extrapolation of net earnings for the bucket after the last
    pub projected_next_net_cents: Option<i64>,
}

pub fn earnings_analytics(rows: &[EarningRow], bucket: Bucket, fee_bps: u32) -> EarningsAnalytics {
    let mut trips: BTreeMap<i64, TripEarning> = BTreeMap::new();
    let mut buckets: BTreeMap<NaiveDate, EarningsBucket> = BTreeMap::new();

    for row in rows {
        let gross = row.gross_cents();
        let trip = trips.entry(row.trip_id).or_insert_with(|| TripEarning {
            trip_id: row.trip_id,
            title: row.trip_title.clone(),
            payments: 0,
            gross_cents: 0,
            net_cents: 0,
        });
        trip.payments += 1;
        trip.gross_cents += gross;

        let start = bucket.start_of(row.paid_at);
        let b = buckets.entry(start).or_insert(EarningsBucket {
            start,
            payments: 0,
            gross_cents: 0,
            net_cents: 0,
        });
        b.payments += 1;
        b.gross_cents += gross;
    }

    let mut trips: Vec<TripEarning> = trips.into_values().collect();
    for t in &mut trips {
        t.net_cents = t.gross_cents - platform_fee(t.gross_cents, fee_bps);
    }
    trips.sort_by(|a, b| b.gross_cents.cmp(&a.gross_cents));

    let mut buckets: Vec<EarningsBucket> = buckets.into_values().collect();
    for b in &mut buckets {
        b.net_cents = b.gross_cents - platform_fee(b.gross_cents, fee_bps);
    }

    let points = offset_points(
        bucket,
        buckets.iter().map(|b| (b.start, b.net_cents as f64)),
    );
    let slope = linear_regression_slope(&points);
    let projected = slope.and_then(|m| {
        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
        let next_x = points.last()?.0 + 1.0;
        Some((mean_y + m * (next_x - mean_x)).max(0.0).round() as i64)
    });

    let gross: i64 = rows.iter().map(EarningRow::gross_cents).sum();
    let fee = platform_fee(gross, fee_bps);

    EarningsAnalytics {
        bucket,
        fee_bps,
        gross_cents: gross,
        platform_fee_cents: fee,
        net_cents: gross - fee,
        trips,
        buckets,
        trend_slope: slope.map(round2),
        projected_next_net_cents: projected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(trip_id: i64, amount: i64, refunded: i64, month: u32) -> EarningRow {
        EarningRow {
            payment_id: trip_id * 100 + i64::from(month),
            trip_id,
            trip_title: format!("Trip {trip_id}"),
            amount_cents: amount,
            refunded_cents: refunded,
            paid_at: Utc
                .with_ymd_and_hms(2025, month, 10, 8, 0, 0)
                .unwrap()
                .timestamp_millis(),
        }
    }

    #[test]
    fn fee_rounding() {
        assert_eq!(platform_fee(10_000, 1000), 1_000);
        assert_eq!(platform_fee(12_345, 1000), 1_235);
        assert_eq!(platform_fee(0, 1000), 0);
    }

    #[test]
    fn monthly_growth_projects_forward() {
        let rows = vec![
            row(1, 10_000, 0, 1),
            row(1, 20_000, 0, 2),
            row(2, 30_000, 0, 3),
            row(2, 5_000, 5_000, 3),
        ];
        let a = earnings_analytics(&rows, Bucket::Month, 1000);
        assert_eq!(a.gross_cents, 60_000);
        assert_eq!(a.platform_fee_cents, 6_000);
        assert_eq!(a.net_cents, 54_000);
        assert_eq!(a.buckets.len(), 3);
        assert_eq!(a.buckets[1].net_cents, 18_000);
        assert_eq!(a.trend_slope, Some(9_000.0));
        assert_eq!(a.projected_next_net_cents, Some(36_000));
        assert_eq!(a.trips[0].trip_id, 1);
        assert_eq!(a.trips[0].gross_cents, 30_000);
        assert_eq!(a.trips[1].payments, 2);
    }

    #[test]
    fn empty_month_still_spaces_the_trend() {
        let rows = vec![row(1, 10_000, 0, 1), row(1, 30_000, 0, 3)];
        let a = earnings_analytics(&rows, Bucket::Month, 0);
        assert_eq!(a.buckets.len(), 2);
        assert_eq!(a.trend_slope, Some(10_000.0));
        assert_eq!(a.projected_next_net_cents, Some(40_000));
    }

    #[test]
    fn single_bucket_has_no_trend() {
        let a = earnings_analytics(&[row(1, 1_000, 0, 5)], Bucket::Week, 0);
        assert_eq!(a.net_cents, 1_000);
        assert_eq!(a.trend_slope, None);
        assert_eq!(a.projected_next_net_cents, None);
    }
}
