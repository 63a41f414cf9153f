//! Review Model

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Review {
    pub id: i64,
    pub trip_id: i64,
    pub captain_id: i64,
    pub author_id: i64,
    pub rating: i32,
    pub captain_score: Option<i32>,
    pub boat_score: Option<i32>,
    pub value_score: Option<i32>,
    pub comment: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewCreate {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(range(min = 1, max = 5))]
    pub captain_score: Option<i32>,
    #[validate(range(min = 1, max = 5))]
    pub boat_score: Option<i32>,
    #[validate(range(min = 1, max = 5))]
    pub value_score: Option<i32>,
    #[validate(length(max = 4000))]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_scores_are_range_checked() {
        let req = ReviewCreate {
            rating: 5,
            captain_score: Some(6),
            boat_score: None,
            value_score: Some(1),
            comment: None,
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("captain_score"));
        assert_eq!(errors.field_errors().len(), 1);
    }
}
