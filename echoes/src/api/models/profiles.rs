//! API request/response models for profiles and roles.

use crate::db::models::profiles::ProfileDBResponse;
use crate::types::ProfileId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account role. `front_desk` is a legacy role: still representable (old rows
/// may carry it) but never granted by any flow and excluded from the staff gate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "profile_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Clinician,
    Admin,
    FrontDesk,
}

impl Role {
    /// Staff roles may schedule appointments, record clinical data, and
    /// transition appointment statuses.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Clinician | Role::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ProfileId,
    pub email: String,
    pub role: Role,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileDBResponse> for ProfileResponse {
    fn from(db: ProfileDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            role: db.role,
            full_name: db.full_name,
            avatar_url: db.avatar_url,
            date_of_birth: db.date_of_birth,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

/// The authenticated caller. The role here is always freshly read from the
/// `profiles` table for the current request, never decoded from the session
/// token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: ProfileId,
    pub email: String,
    pub role: Role,
    pub full_name: Option<String>,
}

impl From<ProfileDBResponse> for CurrentUser {
    fn from(db: ProfileDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            role: db.role,
            full_name: db.full_name,
        }
    }
}

impl CurrentUser {
    pub fn display_name(&self) -> String {
        self.full_name.clone().unwrap_or_else(|| self.email.clone())
    }
}
