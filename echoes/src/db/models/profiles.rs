//! Database models for profiles.

use crate::api::models::profiles::Role;
use crate::types::ProfileId;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// Database request for creating a new profile
#[derive(Debug, Clone)]
pub struct ProfileCreateDBRequest {
    pub email: String,
    /// None for provisioned staff accounts until the first password reset
    pub password_hash: Option<String>,
    pub role: Role,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

/// Database request for updating a profile. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdateDBRequest {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub password_hash: Option<String>,
}

/// Database response for a profile
#[derive(Debug, Clone, FromRow)]
pub struct ProfileDBResponse {
    pub id: ProfileId,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: Role,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
