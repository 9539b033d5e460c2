//! Database models for clinician signup requests.

use crate::api::models::clinician_requests::SignupStatus;
use crate::types::{ProfileId, SignupRequestId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct SignupRequestCreateDBRequest {
    pub email: String,
    pub full_name: String,
    pub license_number: String,
    pub specialty: Option<String>,
    pub institution: Option<String>,
    pub license_image_path: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct SignupRequestDBResponse {
    pub id: SignupRequestId,
    pub email: String,
    pub full_name: String,
    pub license_number: String,
    pub specialty: Option<String>,
    pub institution: Option<String>,
    pub license_image_path: String,
    pub status: SignupStatus,
    pub reviewed_by: Option<ProfileId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
