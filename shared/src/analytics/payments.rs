use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::Bucket;
use crate::models::{Payment, PaymentStatus};
use crate::stats::{mean, median, round2};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusTotals {
    pub count: usize,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyVolume {
    pub date: NaiveDate,
    pub count: usize,
    pub succeeded_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentAnalytics {
    pub count: usize,
    pub by_status: BTreeMap<String, StatusTotals>,
    /// Succeeded over all payments that reached a final outcome
    pub success_rate: Option<f64>,
    pub gross_succeeded_cents: i64,
    pub refunded_cents: i64,
    pub average_amount_cents: Option<f64>,
    pub median_amount_cents: Option<f64>,
    pub daily: Vec<DailyVolume>,
}

pub fn payment_analytics(payments: &[Payment]) -> PaymentAnalytics {
    let mut by_status: BTreeMap<String, StatusTotals> = BTreeMap::new();
    let mut daily: BTreeMap<NaiveDate, DailyVolume> = BTreeMap::new();
    let mut gross = 0i64;
    let mut refunded = 0i64;
    let mut succeeded = 0usize;
    let mut finished = 0usize;

    for p in payments {
        let totals = by_status.entry(p.status.clone()).or_default();
        totals.count += 1;
        totals.amount_cents += p.amount_cents;

        let date = Bucket::Day.start_of(p.created_at);
        let day = daily.entry(date).or_insert(DailyVolume {
            date,
            count: 0,
            succeeded_cents: 0,
        });
        day.count += 1;

        match p.status() {
            // A refunded payment succeeded first
            Some(PaymentStatus::Succeeded | PaymentStatus::Refunded) => {
                succeeded += 1;
                finished += 1;
                gross += p.amount_cents;
                day.succeeded_cents += p.amount_cents;
            }
            Some(PaymentStatus::Failed | PaymentStatus::Cancelled) => finished += 1,
            _ => {}
        }
        refunded += p.refunded_cents;
    }

    let amounts: Vec<f64> = payments.iter().map(|p| p.amount_cents as f64).collect();

    PaymentAnalytics {
        count: payments.len(),
        by_status,
        success_rate: (finished > 0).then(|| round2(succeeded as f64 / finished as f64)),
        gross_succeeded_cents: gross,
        refunded_cents: refunded,
        average_amount_cents: mean(&amounts).map(round2),
        median_amount_cents: median(&amounts),
        daily: daily.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;

    fn payment(status: &str, amount: i64, refunded: i64, day: i64) -> Payment {
        Payment {
            id: day,
            booking_id: 1,
            user_id: 1,
            amount_cents: amount,
            currency: "usd".into(),
            status: status.into(),
            gateway_intent_id: format!("pi_{day}"),
            refunded_cents: refunded,
            failure_reason: None,
            paid_at: None,
            created_at: day * DAY_MS,
            updated_at: day * DAY_MS,
        }
    }

    #[test]
    fn totals_and_rate() {
        let payments = vec![
            payment("succeeded", 10_000, 0, 0),
            payment("succeeded", 20_000, 0, 0),
            payment("refunded", 5_000, 5_000, 1),
            payment("failed", 7_000, 0, 1),
            payment("pending", 3_000, 0, 2),
        ];
        let a = payment_analytics(&payments);
        assert_eq!(a.count, 5);
        assert_eq!(a.by_status["succeeded"].count, 2);
        assert_eq!(a.by_status["succeeded"].amount_cents, 30_000);
        assert_eq!(a.gross_succeeded_cents, 35_000);
        assert_eq!(a.refunded_cents, 5_000);
        assert_eq!(a.success_rate, Some(0.75));
        assert_eq!(a.median_amount_cents, Some(7_000.0));
        assert_eq!(a.daily.len(), 3);
        assert_eq!(a.daily[0].succeeded_cents, 30_000);
        assert_eq!(a.daily[2].succeeded_cents, 0);
    }

    #[test]
    fn no_finished_payments() {
        let a = payment_analytics(&[payment("processing", 100, 0, 0)]);
        assert_eq!(a.success_rate, None);
        assert_eq!(a.gross_succeeded_cents, 0);
    }
}
