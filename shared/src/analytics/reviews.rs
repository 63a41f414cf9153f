use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{Bucket, offset_points};
use crate::models::Review;
use crate::sentiment::{Sentiment, classify};
use crate::stats::{linear_regression_slope, mean, median, mode, pearson, round2};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SentimentBreakdown {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRating {
    pub month: NaiveDate,
    pub count: usize,
    pub average: f64,
}

/// Correlation of each sub-score with the overall rating
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubScoreCorrelations {
    pub captain: Option<f64>,
    pub boat: Option<f64>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewAnalytics {
    pub count: usize,
    pub average_rating: Option<f64>,
    pub median_rating: Option<f64>,
    pub mode_rating: Option<i32>,
    /// Count per star, index 0 is one star
    pub distribution: [usize; 5],
    pub monthly: Vec<MonthlyRating>,
    /// Change in monthly average per month
    pub trend_slope: Option<f64>,
    pub sentiment: SentimentBreakdown,
    pub correlations: SubScoreCorrelations,
}

pub fn review_analytics(reviews: &[Review]) -> ReviewAnalytics {
    let ratings: Vec<f64> = reviews.iter().map(|r| f64::from(r.rating)).collect();
    let stars: Vec<i32> = reviews.iter().map(|r| r.rating).collect();

    let mut distribution = [0usize; 5];
    for r in &stars {
        if (1..=5).contains(r) {
            distribution[(*r - 1) as usize] += 1;
        }
    }

    let mut by_month: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for r in reviews {
        by_month
            .entry(Bucket::Month.start_of(r.created_at))
            .or_default()
            .push(f64::from(r.rating));
    }
    let monthly: Vec<MonthlyRating> = by_month
        .into_iter()
        .map(|(month, values)| MonthlyRating {
            month,
            count: values.len(),
            average: round2(mean(&values).unwrap_or_default()),
        })
        .collect();
    let trend_points = offset_points(Bucket::Month, monthly.iter().map(|m| (m.month, m.average)));

    let mut sentiment = SentimentBreakdown::default();
    for r in reviews {
        match classify(r.comment.as_deref().unwrap_or_default()) {
            Sentiment::Positive => sentiment.positive += 1,
            Sentiment::Neutral => sentiment.neutral += 1,
            Sentiment::Negative => sentiment.negative += 1,
        }
    }

    ReviewAnalytics {
        count: reviews.len(),
        average_rating: mean(&ratings).map(round2),
        median_rating: median(&ratings),
        mode_rating: mode(&stars),
        distribution,
        monthly,
        trend_slope: linear_regression_slope(&trend_points).map(round2),
        sentiment,
        correlations: SubScoreCorrelations {
            captain: sub_score_correlation(reviews, |r| r.captain_score),
            boat: sub_score_correlation(reviews, |r| r.boat_score),
            value: sub_score_correlation(reviews, |r| r.value_score),
        },
    }
}

/// Pearson over the reviews that carry the sub-score
fn sub_score_correlation(reviews: &[Review], pick: impl Fn(&Review) -> Option<i32>) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = reviews
        .iter()
        .filter_map(|r| pick(r).map(|s| (f64::from(s), f64::from(r.rating))))
        .unzip();
    pearson(&xs, &ys).map(round2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn review(rating: i32, captain: Option<i32>, month: u32, comment: &str) -> Review {
        Review {
            id: i64::from(month),
            trip_id: 1,
            captain_id: 7,
            author_id: 2,
            rating,
            captain_score: captain,
            boat_score: None,
            value_score: None,
            comment: Some(comment.into()),
            created_at: Utc
                .with_ymd_and_hms(2025, month, 5, 12, 0, 0)
                .unwrap()
                .timestamp_millis(),
        }
    }

    #[test]
    fn empty_input() {
        let a = review_analytics(&[]);
        assert_eq!(a.count, 0);
        assert_eq!(a.average_rating, None);
        assert_eq!(a.mode_rating, None);
        assert!(a.monthly.is_empty());
        assert_eq!(a.trend_slope, None);
    }

    #[test]
    fn aggregates_ratings_and_trend() {
        let reviews = vec![
            review(3, Some(3), 1, "boring and late"),
            review(4, Some(4), 2, "we caught fish"),
            review(5, Some(5), 3, "great crew, would recommend"),
            review(5, Some(4), 3, "amazing"),
        ];
        let a = review_analytics(&reviews);
        assert_eq!(a.count, 4);
        assert_eq!(a.average_rating, Some(4.25));
        assert_eq!(a.median_rating, Some(4.5));
        assert_eq!(a.mode_rating, Some(5));
        assert_eq!(a.distribution, [0, 0, 1, 1, 2]);
        assert_eq!(a.monthly.len(), 3);
        assert_eq!(a.monthly[2].count, 2);
        assert_eq!(a.trend_slope, Some(1.0));
        assert_eq!(
            a.sentiment,
            SentimentBreakdown {
                positive: 2,
                neutral: 1,
                negative: 1
            }
        );
        assert!(a.correlations.captain.unwrap() > 0.8);
        assert_eq!(a.correlations.boat, None);
    }

    #[test]
    fn trend_spans_months_without_reviews() {
        let reviews = vec![review(2, None, 1, "ok"), review(4, None, 5, "ok")];
        let a = review_analytics(&reviews);
        assert_eq!(a.monthly.len(), 2);
        assert_eq!(a.trend_slope, Some(0.5));
    }
}
