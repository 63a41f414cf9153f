//! User Model

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Participant,
    Captain,
    Admin,
}

impl UserRole {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "participant" => Some(Self::Participant),
            "captain" => Some(Self::Captain),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Participant => "participant",
            Self::Captain => "captain",
            Self::Admin => "admin",
        }
    }

    /// Captains and admins may run trips
    pub fn can_captain(&self) -> bool {
        matches!(self, Self::Captain | Self::Admin)
    }
}

/// Self-declared angling experience
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl ExperienceLevel {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            "expert" => Some(Self::Expert),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        }
    }

    /// Tier weight used by participant scoring (0.25 ..= 1.0)
    pub fn tier_value(&self) -> f64 {
        match self {
            Self::Beginner => 0.25,
            Self::Intermediate => 0.5,
            Self::Advanced => 0.75,
            Self::Expert => 1.0,
        }
    }
}

/// Public profile (never carries the password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    pub experience_level: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Only participant/captain may self-register
    pub role: UserRole,
    pub experience_level: Option<ExperienceLevel>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}
