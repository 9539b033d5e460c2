//! Database models for password reset tokens.

use crate::types::ProfileId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A reset token row. Only the Argon2 hash of the token is stored; the raw
/// value exists once, inside the email.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetTokenDBResponse {
    pub id: Uuid,
    pub user_id: ProfileId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
