//! Role-shaped dashboard aggregates.
//!
//! These replace the original server-rendered home/portal pages: one endpoint
//! returns the data each role's dashboard needs, shaped by the caller's role.

use crate::api::models::appointments::AppointmentResponse;
use crate::api::models::care_plans::CarePlanResponse;
use crate::api::models::sponsorships::ConsentRequestResponse;
use crate::types::{ProfileId, SponsorLinkId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One sponsored (or care-managed) patient as shown on a dashboard card.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SponsoredPatientSummary {
    #[schema(value_type = String, format = "uuid")]
    pub link_id: SponsorLinkId,
    #[schema(value_type = String, format = "uuid")]
    pub patient_id: ProfileId,
    pub patient_name: Option<String>,
    pub care_plan_name: String,
    pub next_appointment: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PatientOverview {
    /// Consent requests awaiting this patient's response.
    pub pending_consents: Vec<ConsentRequestResponse>,
    /// Patients this caller sponsors (active links only).
    pub sponsored_patients: Vec<SponsoredPatientSummary>,
    pub upcoming_appointments: Vec<AppointmentResponse>,
    pub unread_notifications: i64,
    pub care_plans: Vec<CarePlanResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StaffOverview {
    /// Patients under an active sponsored plan, with their next visit.
    pub patients: Vec<SponsoredPatientSummary>,
    /// This clinician's own schedule, soonest first.
    pub upcoming_appointments: Vec<AppointmentResponse>,
    /// Pending clinician signup requests (admins only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_signup_requests: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum OverviewResponse {
    Patient(PatientOverview),
    Staff(StaffOverview),
}
