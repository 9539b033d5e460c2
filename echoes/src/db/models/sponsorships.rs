//! Database models for consent requests and sponsor-patient plan links.

use crate::api::models::sponsorships::ConsentStatus;
use crate::types::{CarePlanId, ConsentRequestId, ProfileId, SponsorLinkId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct ConsentRequestCreateDBRequest {
    pub sponsor_id: ProfileId,
    pub patient_email: String,
    /// Backfilled at creation when the email resolves to an existing profile
    pub patient_id: Option<ProfileId>,
    pub care_plan_id: CarePlanId,
}

#[derive(Debug, Clone, FromRow)]
pub struct ConsentRequestDBResponse {
    pub id: ConsentRequestId,
    pub sponsor_id: ProfileId,
    pub patient_email: String,
    pub patient_id: Option<ProfileId>,
    pub care_plan_id: CarePlanId,
    pub status: ConsentStatus,
    pub decline_reason: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub payment_simulated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SponsorLinkCreateDBRequest {
    pub sponsor_id: ProfileId,
    pub patient_id: ProfileId,
    pub care_plan_id: CarePlanId,
    pub consent_request_id: ConsentRequestId,
}

#[derive(Debug, Clone, FromRow)]
pub struct SponsorLinkDBResponse {
    pub id: SponsorLinkId,
    pub sponsor_id: ProfileId,
    pub patient_id: ProfileId,
    pub care_plan_id: CarePlanId,
    pub consent_request_id: ConsentRequestId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}
