//! Database models for notifications.

use crate::api::models::notifications::NotificationKind;
use crate::types::{NotificationId, ProfileId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NotificationCreateDBRequest {
    pub user_id: ProfileId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: Option<String>,
    pub reference_id: Option<Uuid>,
}

#[derive(Debug, Clone, FromRow)]
pub struct NotificationDBResponse {
    pub id: NotificationId,
    pub user_id: ProfileId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: Option<String>,
    pub reference_id: Option<Uuid>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
