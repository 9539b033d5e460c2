//! API models for notifications.

use crate::db::models::notifications::NotificationDBResponse;
use crate::types::{NotificationId, ProfileId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ConsentRequest,
    VisitUpdate,
    NoShowAlert,
    SponsorshipAccepted,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: NotificationId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: ProfileId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub reference_id: Option<Uuid>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationDBResponse> for NotificationResponse {
    fn from(db: NotificationDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            kind: db.kind,
            title: db.title,
            body: db.body,
            reference_id: db.reference_id,
            read_at: db.read_at,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClearedResponse {
    pub deleted: u64,
}
