//! API models for patient metrics.

use crate::db::models::metrics::MetricDBResponse;
use crate::types::{AppointmentId, MetricId, ProfileId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "medication_adherence", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MedicationAdherence {
    Good,
    Fair,
    Poor,
}

/// All clinical fields are independently optional: a visit may record only a
/// weight, only a blood pressure, or any combination.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MetricCreate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub appointment_id: Option<AppointmentId>,
    pub blood_pressure_systolic: Option<i32>,
    pub blood_pressure_diastolic: Option<i32>,
    pub weight_kg: Option<f64>,
    pub a1c: Option<f64>,
    pub medication_adherence: Option<MedicationAdherence>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MetricResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: MetricId,
    #[schema(value_type = String, format = "uuid")]
    pub patient_id: ProfileId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub appointment_id: Option<AppointmentId>,
    #[schema(value_type = String, format = "uuid")]
    pub recorded_by: ProfileId,
    pub blood_pressure_systolic: Option<i32>,
    pub blood_pressure_diastolic: Option<i32>,
    pub weight_kg: Option<f64>,
    pub a1c: Option<f64>,
    pub medication_adherence: Option<MedicationAdherence>,
    pub recorded_at: DateTime<Utc>,
}

impl From<MetricDBResponse> for MetricResponse {
    fn from(db: MetricDBResponse) -> Self {
        Self {
            id: db.id,
            patient_id: db.patient_id,
            appointment_id: db.appointment_id,
            recorded_by: db.recorded_by,
            blood_pressure_systolic: db.blood_pressure_systolic,
            blood_pressure_diastolic: db.blood_pressure_diastolic,
            weight_kg: db.weight_kg,
            a1c: db.a1c,
            medication_adherence: db.medication_adherence,
            recorded_at: db.recorded_at,
        }
    }
}
