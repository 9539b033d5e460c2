//! Database models for patient metric rows.

use crate::api::models::metrics::MedicationAdherence;
use crate::types::{AppointmentId, MetricId, ProfileId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct MetricCreateDBRequest {
    pub patient_id: ProfileId,
    pub appointment_id: Option<AppointmentId>,
    pub recorded_by: ProfileId,
    pub blood_pressure_systolic: Option<i32>,
    pub blood_pressure_diastolic: Option<i32>,
    pub weight_kg: Option<f64>,
    pub a1c: Option<f64>,
    pub medication_adherence: Option<MedicationAdherence>,
}

#[derive(Debug, Clone, FromRow)]
pub struct MetricDBResponse {
    pub id: MetricId,
    pub patient_id: ProfileId,
    pub appointment_id: Option<AppointmentId>,
    pub recorded_by: ProfileId,
    pub blood_pressure_systolic: Option<i32>,
    pub blood_pressure_diastolic: Option<i32>,
    pub weight_kg: Option<f64>,
    pub a1c: Option<f64>,
    pub medication_adherence: Option<MedicationAdherence>,
    pub recorded_at: DateTime<Utc>,
}
