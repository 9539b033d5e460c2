//! API models for clinician signup requests.

use crate::db::models::clinician_requests::SignupRequestDBResponse;
use crate::types::{ProfileId, SignupRequestId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "signup_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SignupStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupRequestResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: SignupRequestId,
    pub email: String,
    pub full_name: String,
    pub license_number: String,
    pub specialty: Option<String>,
    pub institution: Option<String>,
    pub license_image_path: String,
    pub status: SignupStatus,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub reviewed_by: Option<ProfileId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<SignupRequestDBResponse> for SignupRequestResponse {
    fn from(db: SignupRequestDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            full_name: db.full_name,
            license_number: db.license_number,
            specialty: db.specialty,
            institution: db.institution,
            license_image_path: db.license_image_path,
            status: db.status,
            reviewed_by: db.reviewed_by,
            reviewed_at: db.reviewed_at,
            created_at: db.created_at,
        }
    }
}

/// Query parameters for listing signup requests
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListSignupRequestsQuery {
    /// Filter by status (defaults to all)
    pub status: Option<SignupStatus>,
}
