//! Keyword-based sentiment classification for review comments

use serde::{Deserialize, Serialize};

const POSITIVE_KEYWORDS: &[&str] = &[
    "amazing",
    "awesome",
    "beautiful",
    "excellent",
    "fantastic",
    "friendly",
    "fun",
    "great",
    "helpful",
    "knowledgeable",
    "love",
    "loved",
    "perfect",
    "professional",
    "recommend",
    "safe",
    "wonderful",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "awful",
    "bad",
    "boring",
    "disappointing",
    "dirty",
    "late",
    "overpriced",
    "poor",
    "rude",
    "seasick",
    "terrible",
    "unprofessional",
    "unsafe",
    "waste",
    "worst",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// Net keyword score of a comment: positive hits minus negative hits
pub fn keyword_score(text: &str) -> i32 {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .map(|w| {
            if POSITIVE_KEYWORDS.contains(&w.as_str()) {
                1
            } else if NEGATIVE_KEYWORDS.contains(&w.as_str()) {
                -1
            } else {
                0
            }
        })
        .sum()
}

pub fn classify(text: &str) -> Sentiment {
    match keyword_score(text) {
        s if s > 0 => Sentiment::Positive,
        s if s < 0 => Sentiment::Negative,
        _ => Sentiment::Neutral,
    }
}
