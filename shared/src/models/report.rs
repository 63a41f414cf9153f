//! Scheduled reports and export history

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Payments,
    Earnings,
    Reviews,
    Bookings,
}

impl ReportType {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "payments" => Some(Self::Payments),
            "earnings" => Some(Self::Earnings),
            "reviews" => Some(Self::Reviews),
            "bookings" => Some(Self::Bookings),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Payments => "payments",
            Self::Earnings => "earnings",
            Self::Reviews => "reviews",
            Self::Bookings => "bookings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl ReportFrequency {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Next run after `at`. Monthly runs keep the day of month, clamped to
    /// the last day of shorter months.
    pub fn next_after(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Daily => at + chrono::Duration::days(1),
            Self::Weekly => at + chrono::Duration::weeks(1),
            Self::Monthly => at
                .checked_add_months(Months::new(1))
                .unwrap_or(at + chrono::Duration::days(30)),
        }
    }

    /// Start of the period that ends at `at` (the inverse step of `next_after`)
    pub fn period_start(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Daily => at - chrono::Duration::days(1),
            Self::Weekly => at - chrono::Duration::weeks(1),
            Self::Monthly => at
                .checked_sub_months(Months::new(1))
                .unwrap_or(at - chrono::Duration::days(30)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ScheduledReport {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub report_type: String,
    pub frequency: String,
    pub format: String,
    pub recipients: Vec<String>,
    pub enabled: bool,
    pub next_run_at: i64,
    pub last_run_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScheduledReportCreate {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub report_type: ReportType,
    pub frequency: ReportFrequency,
    pub format: ExportFormat,
    #[validate(length(min = 1, max = 20), custom(function = "validate_recipients"))]
    pub recipients: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScheduledReportUpdate {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub frequency: Option<ReportFrequency>,
    pub format: Option<ExportFormat>,
    #[validate(length(min = 1, max = 20), custom(function = "validate_recipients"))]
    pub recipients: Option<Vec<String>>,
    pub enabled: Option<bool>,
}

fn default_true() -> bool {
    true
}

#[allow(clippy::ptr_arg)]
fn validate_recipients(recipients: &Vec<String>) -> Result<(), validator::ValidationError> {
    if recipients
        .iter()
        .all(|r| validator::ValidateEmail::validate_email(r))
    {
        Ok(())
    } else {
        Err(validator::ValidationError::new("recipient_email"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ExportHistory {
    pub id: i64,
    pub owner_id: i64,
    pub report_id: Option<i64>,
    pub report_type: String,
    pub format: String,
    pub range_from: i64,
    pub range_to: i64,
    pub row_count: i64,
    pub size_bytes: i64,
    pub status: String,
    pub error: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    pub report_type: ReportType,
    pub format: ExportFormat,
    pub from: i64,
    pub to: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn next_run_steps() {
        let at = Utc.with_ymd_and_hms(2025, 1, 31, 6, 0, 0).unwrap();
        assert_eq!(
            ReportFrequency::Daily.next_after(at),
            Utc.with_ymd_and_hms(2025, 2, 1, 6, 0, 0).unwrap()
        );
        assert_eq!(
            ReportFrequency::Weekly.next_after(at),
            Utc.with_ymd_and_hms(2025, 2, 7, 6, 0, 0).unwrap()
        );
        // Clamped to the end of February
        assert_eq!(
            ReportFrequency::Monthly.next_after(at),
            Utc.with_ymd_and_hms(2025, 2, 28, 6, 0, 0).unwrap()
        );
    }

    #[test]
    fn period_start_steps_back() {
        let at = Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(
            ReportFrequency::Monthly.period_start(at),
            Utc.with_ymd_and_hms(2025, 2, 15, 0, 0, 0).unwrap()
        );
        assert_eq!(
            ReportFrequency::Weekly.period_start(at),
            Utc.with_ymd_and_hms(2025, 3, 8, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn recipients_must_be_emails() {
        let mut req = ScheduledReportCreate {
            name: "Weekly payouts".into(),
            report_type: ReportType::Earnings,
            frequency: ReportFrequency::Weekly,
            format: ExportFormat::Csv,
            recipients: vec!["ops@example.com".into()],
            enabled: true,
        };
        assert!(req.validate().is_ok());
        req.recipients.push("nope".into());
        assert!(req.validate().is_err());
        req.recipients.clear();
        assert!(req.validate().is_err());
    }
}
