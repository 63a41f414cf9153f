//! Error categories, one per thousand-block of codes

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    General,
    Auth,
    Permission,
    Trip,
    Booking,
    Payment,
    Reward,
    Report,
    Diary,
    System,
}

/// Indexed by `code / 1000`; everything from 9000 up is a system error
const BY_THOUSAND: [ErrorCategory; 10] = [
    ErrorCategory::General,
    ErrorCategory::Auth,
    ErrorCategory::Permission,
    ErrorCategory::Trip,
    ErrorCategory::Booking,
    ErrorCategory::Payment,
    ErrorCategory::Reward,
    ErrorCategory::Report,
    ErrorCategory::Diary,
    ErrorCategory::System,
];

impl ErrorCategory {
    pub fn from_code(code: u16) -> Self {
        BY_THOUSAND
            .get(usize::from(code / 1000))
            .copied()
            .unwrap_or(Self::System)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Trip => "trip",
            Self::Booking => "booking",
            Self::Payment => "payment",
            Self::Reward => "reward",
            Self::Report => "report",
            Self::Diary => "diary",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_map_to_categories() {
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(3101), ErrorCategory::Trip);
        assert_eq!(ErrorCategory::from_code(8101), ErrorCategory::Diary);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(12_000), ErrorCategory::System);
    }

    #[test]
    fn codes_know_their_category() {
        assert_eq!(ErrorCode::TokenExpired.category(), ErrorCategory::Auth);
        assert_eq!(ErrorCode::TripFull.category(), ErrorCategory::Trip);
        assert_eq!(
            ErrorCode::PaymentGatewayRejected.category(),
            ErrorCategory::Payment
        );
        assert_eq!(ErrorCode::DatabaseError.category(), ErrorCategory::System);
    }

    #[test]
    fn serde_uses_names() {
        let json = serde_json::to_string(&ErrorCategory::Booking).unwrap();
        assert_eq!(json, "\"booking\"");
        let category: ErrorCategory = serde_json::from_str("\"reward\"").unwrap();
        assert_eq!(category, ErrorCategory::Reward);
        assert_eq!(ErrorCategory::Diary.name(), "diary");
    }
}
