//! API models for appointments and clinical documentation.

use crate::db::models::appointments::{AppointmentDBResponse, NoteDBResponse, ServiceDBResponse};
use crate::types::{AppointmentId, ProfileId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    NoShow,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "service_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Vitals,
    ChronicLab,
    WellnessCheck,
    FollowUp,
    Coordination,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentCreate {
    #[schema(value_type = String, format = "uuid")]
    pub patient_id: ProfileId,
    pub scheduled_at: DateTime<Utc>,
}

/// Target status for a transition out of `scheduled`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentStatusUpdate {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentReschedule {
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AppointmentId,
    #[schema(value_type = String, format = "uuid")]
    pub patient_id: ProfileId,
    #[schema(value_type = String, format = "uuid")]
    pub clinician_id: ProfileId,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AppointmentDBResponse> for AppointmentResponse {
    fn from(db: AppointmentDBResponse) -> Self {
        Self {
            id: db.id,
            patient_id: db.patient_id,
            clinician_id: db.clinician_id,
            scheduled_at: db.scheduled_at,
            status: db.status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteCreate {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    #[schema(value_type = String, format = "uuid")]
    pub appointment_id: AppointmentId,
    pub content: String,
    #[schema(value_type = String, format = "uuid")]
    pub created_by: ProfileId,
    pub created_at: DateTime<Utc>,
}

impl From<NoteDBResponse> for NoteResponse {
    fn from(db: NoteDBResponse) -> Self {
        Self {
            id: db.id,
            appointment_id: db.appointment_id,
            content: db.content,
            created_by: db.created_by,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceCreate {
    pub service_type: ServiceType,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    #[schema(value_type = String, format = "uuid")]
    pub appointment_id: AppointmentId,
    pub service_type: ServiceType,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ServiceDBResponse> for ServiceResponse {
    fn from(db: ServiceDBResponse) -> Self {
        Self {
            id: db.id,
            appointment_id: db.appointment_id,
            service_type: db.service_type,
            details: db.details,
            created_at: db.created_at,
        }
    }
}

/// Detail view: the appointment plus its documentation trail.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentDetailResponse {
    pub appointment: AppointmentResponse,
    pub notes: Vec<NoteResponse>,
    pub services: Vec<ServiceResponse>,
}

/// Query parameters for listing appointments
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListAppointmentsQuery {
    /// Restrict to a specific patient. Staff may name any patient; other
    /// callers only themselves or a patient they actively sponsor.
    #[param(value_type = Option<String>)]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub patient_id: Option<ProfileId>,
}
