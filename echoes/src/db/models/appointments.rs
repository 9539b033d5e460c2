//! Database models for appointments, notes, and services.

use crate::api::models::appointments::{AppointmentStatus, ServiceType};
use crate::types::{AppointmentId, ProfileId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AppointmentCreateDBRequest {
    pub patient_id: ProfileId,
    pub clinician_id: ProfileId,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AppointmentDBResponse {
    pub id: AppointmentId,
    pub patient_id: ProfileId,
    pub clinician_id: ProfileId,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NoteCreateDBRequest {
    pub appointment_id: AppointmentId,
    pub content: String,
    pub created_by: ProfileId,
}

#[derive(Debug, Clone, FromRow)]
pub struct NoteDBResponse {
    pub id: Uuid,
    pub appointment_id: AppointmentId,
    pub content: String,
    pub created_by: ProfileId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ServiceCreateDBRequest {
    pub appointment_id: AppointmentId,
    pub service_type: ServiceType,
    pub details: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ServiceDBResponse {
    pub id: Uuid,
    pub appointment_id: AppointmentId,
    pub service_type: ServiceType,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// (patient, next upcoming scheduled visit) pair for dashboard summaries.
#[derive(Debug, Clone, FromRow)]
pub struct NextAppointmentRow {
    pub patient_id: ProfileId,
    pub scheduled_at: DateTime<Utc>,
}
