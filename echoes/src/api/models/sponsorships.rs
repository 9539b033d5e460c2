//! API models for the sponsorship consent workflow.

use crate::db::models::sponsorships::{ConsentRequestDBResponse, SponsorLinkDBResponse};
use crate::types::{CarePlanId, ConsentRequestId, ProfileId, SponsorLinkId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "consent_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConsentStatus {
    Pending,
    Accepted,
    Declined,
}

/// A sponsor "purchases" a plan for a patient, identified by email.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseRequest {
    pub patient_email: String,
    #[schema(value_type = String, format = "uuid")]
    pub care_plan_id: CarePlanId,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeclineRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsentRequestResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ConsentRequestId,
    #[schema(value_type = String, format = "uuid")]
    pub sponsor_id: ProfileId,
    pub patient_email: String,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub patient_id: Option<ProfileId>,
    #[schema(value_type = String, format = "uuid")]
    pub care_plan_id: CarePlanId,
    pub status: ConsentStatus,
    pub decline_reason: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub payment_simulated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ConsentRequestDBResponse> for ConsentRequestResponse {
    fn from(db: ConsentRequestDBResponse) -> Self {
        Self {
            id: db.id,
            sponsor_id: db.sponsor_id,
            patient_email: db.patient_email,
            patient_id: db.patient_id,
            care_plan_id: db.care_plan_id,
            status: db.status,
            decline_reason: db.decline_reason,
            responded_at: db.responded_at,
            payment_simulated_at: db.payment_simulated_at,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SponsorLinkResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: SponsorLinkId,
    #[schema(value_type = String, format = "uuid")]
    pub sponsor_id: ProfileId,
    #[schema(value_type = String, format = "uuid")]
    pub patient_id: ProfileId,
    #[schema(value_type = String, format = "uuid")]
    pub care_plan_id: CarePlanId,
    #[schema(value_type = String, format = "uuid")]
    pub consent_request_id: ConsentRequestId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<SponsorLinkDBResponse> for SponsorLinkResponse {
    fn from(db: SponsorLinkDBResponse) -> Self {
        Self {
            id: db.id,
            sponsor_id: db.sponsor_id,
            patient_id: db.patient_id,
            care_plan_id: db.care_plan_id,
            consent_request_id: db.consent_request_id,
            started_at: db.started_at,
            ended_at: db.ended_at,
        }
    }
}

/// Everything the caller can see about their sponsorships: requests they sent
/// as a sponsor, requests addressed to them as a patient, and active links in
/// either direction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SponsorshipsResponse {
    pub sent_requests: Vec<ConsentRequestResponse>,
    pub received_requests: Vec<ConsentRequestResponse>,
    pub links_as_sponsor: Vec<SponsorLinkResponse>,
    pub links_as_patient: Vec<SponsorLinkResponse>,
}
