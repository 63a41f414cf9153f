//! Applicant scoring and captain automation rules

use axum::routing::{get, post};
use axum::{Extension, Json, Router, extract::State};
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use shared::models::{Booking, BookingDecision, ExperienceLevel};
use shared::scoring::{AutomationRuleSet, ParticipantStats, RuleAction, RuleDecision};
use std::collections::HashMap;

use super::bookings::apply_decision;
use super::trips::owned_trip;
use super::{ApiResult, AppJson, AppPath, ValidJson, internal};
use crate::auth::UserIdentity;
use crate::db;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/trips/{id}/applicants", get(list_applicants))
        .route("/api/trips/{id}/auto-process", post(auto_process))
        .route("/api/automation-rules", get(get_rules).put(put_rules))
}

#[derive(Debug, Serialize)]
pub struct Applicant {
    pub booking: Booking,
    pub stats: ParticipantStats,
    pub score: f64,
    pub decision: RuleDecision,
}

/// Pending applicants of a trip, scored and run through the captain's rules
async fn evaluate_applicants(
    state: &AppState,
    captain_id: i64,
    trip_id: i64,
) -> Result<Vec<Applicant>, AppError> {
    let pending = db::bookings::list_pending_for_trip(&state.pool, trip_id)
        .await
        .map_err(internal)?;
    let user_ids: Vec<i64> = pending.iter().map(|b| b.user_id).collect();
    let stats: HashMap<i64, ParticipantStats> =
        db::metrics::participant_stats(&state.pool, &user_ids)
            .await
            .map_err(internal)?
            .into_iter()
            .map(|s| (s.user_id, s))
            .collect();
    let rules = db::automation_rules::find(&state.pool, captain_id)
        .await
        .map_err(internal)?;

    Ok(score_applicants(pending, &stats, &rules))
}

fn score_applicants(
    pending: Vec<Booking>,
    stats: &HashMap<i64, ParticipantStats>,
    rules: &AutomationRuleSet,
) -> Vec<Applicant> {
    let mut applicants: Vec<Applicant> = pending
        .into_iter()
        .map(|booking| {
            let stats = stats.get(&booking.user_id).copied().unwrap_or(ParticipantStats {
                user_id: booking.user_id,
                experience_level: ExperienceLevel::Beginner,
                average_rating: None,
                completed_trips: 0,
                no_shows: 0,
                late_cancellations: 0,
            });
            Applicant {
                score: shared::stats::round2(stats.score()),
                decision: rules.evaluate(&stats),
                stats,
                booking,
            }
        })
        .collect();
    applicants.sort_by(|a, b| b.score.total_cmp(&a.score));
    applicants
}

/// GET /api/trips/{id}/applicants
pub async fn list_applicants(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(trip_id): AppPath<i64>,
) -> ApiResult<Vec<Applicant>> {
    let trip = owned_trip(&state, &identity, trip_id).await?;
    Ok(Json(
        evaluate_applicants(&state, trip.captain_id, trip_id).await?,
    ))
}

/// GET /api/automation-rules
pub async fn get_rules(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<AutomationRuleSet> {
    identity.require_captain()?;
    let rules = db::automation_rules::find(&state.pool, identity.user_id)
        .await
        .map_err(internal)?;
    Ok(Json(rules))
}

/// PUT /api/automation-rules
pub async fn put_rules(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    ValidJson(rules): ValidJson<AutomationRuleSet>,
) -> ApiResult<AutomationRuleSet> {
    identity.require_captain()?;
    db::automation_rules::save(&state.pool, identity.user_id, &rules, shared::util::now_millis())
        .await
        .map_err(internal)?;
    tracing::info!(captain_id = identity.user_id, rules = rules.rules.len(), "Automation rules saved");
    Ok(Json(rules))
}

#[derive(Debug, Default, Deserialize)]
pub struct AutoProcessRequest {
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
pub struct ProcessedApplicant {
    pub booking_id: i64,
    pub user_id: i64,
    pub score: f64,
    pub decision: RuleDecision,
    /// Whether the decision was written (never on a dry run, never for flags)
    pub applied: bool,
}

#[derive(Debug, Serialize)]
pub struct AutoProcessResponse {
    pub dry_run: bool,
    pub results: Vec<ProcessedApplicant>,
}

fn booking_decision(action: RuleAction) -> Option<BookingDecision> {
    match action {
        RuleAction::Approve => Some(BookingDecision::Approve),
        RuleAction::Reject => Some(BookingDecision::Reject),
        RuleAction::Flag => None,
    }
}

/// POST /api/trips/{id}/auto-process
pub async fn auto_process(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(trip_id): AppPath<i64>,
    AppJson(req): AppJson<AutoProcessRequest>,
) -> ApiResult<AutoProcessResponse> {
    let trip = owned_trip(&state, &identity, trip_id).await?;
    let applicants = evaluate_applicants(&state, trip.captain_id, trip_id).await?;

    let mut results = Vec::with_capacity(applicants.len());
    for applicant in applicants {
        let decision = applicant.decision.action().and_then(booking_decision);
        let mut applied = false;
        if let (false, Some(decision)) = (req.dry_run, decision) {
            match apply_decision(&state, &applicant.booking, decision).await {
                Ok(_) => applied = true,
                Err(e) => tracing::warn!(
                    booking_id = applicant.booking.id,
                    error = %e,
                    "Auto-process skipped booking"
                ),
            }
        }
        results.push(ProcessedApplicant {
            booking_id: applicant.booking.id,
            user_id: applicant.booking.user_id,
            score: applicant.score,
            decision: applicant.decision,
            applied,
        });
    }

    tracing::info!(
        trip_id,
        dry_run = req.dry_run,
        applied = results.iter().filter(|r| r.applied).count(),
        "Applicants auto-processed"
    );
    Ok(Json(AutoProcessResponse {
        dry_run: req.dry_run,
        results,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::scoring::{AutomationRule, RuleConditions};

    fn booking(id: i64, user_id: i64) -> Booking {
        Booking {
            id,
            trip_id: 1,
            user_id,
            seats: 1,
            status: "pending".into(),
            note: None,
            participant_rating: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn applicants_sorted_by_score_with_decisions() {
        let veteran = ParticipantStats {
            user_id: 20,
            experience_level: ExperienceLevel::Expert,
            average_rating: Some(5.0),
            completed_trips: 20,
            no_shows: 0,
            late_cancellations: 0,
        };
        let stats = HashMap::from([(20, veteran)]);
        let rules = AutomationRuleSet {
            rules: vec![AutomationRule {
                name: "trusted".into(),
                enabled: true,
                conditions: RuleConditions {
                    min_score: Some(90.0),
                    ..Default::default()
                },
                action: RuleAction::Approve,
            }],
        };

        let applicants = score_applicants(vec![booking(1, 10), booking(2, 20)], &stats, &rules);
        assert_eq!(applicants[0].booking.id, 2);
        assert_eq!(applicants[0].score, 100.0);
        assert_eq!(applicants[0].decision.action(), Some(RuleAction::Approve));
        // Newcomer: 3.0 rating, full reliability, beginner tier, no trips
        assert_eq!(applicants[1].score, 24.0 + 25.0 + 5.0);
        assert_eq!(applicants[1].decision, RuleDecision::Manual);
    }

    #[test]
    fn flags_are_never_applied() {
        assert_eq!(booking_decision(RuleAction::Flag), None);
        assert_eq!(
            booking_decision(RuleAction::Reject),
            Some(BookingDecision::Reject)
        );
    }
}
