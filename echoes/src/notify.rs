//! Best-effort notification inserts.
//!
//! Notifications are UI affordances, not part of any workflow's correctness:
//! the triggering mutation has already committed by the time these run, and a
//! failed insert is logged and swallowed (at-most-once, never retried).

use sqlx::PgPool;

use crate::api::models::notifications::NotificationKind;
use crate::db::handlers::{Notifications, SponsorLinks};
use crate::db::models::notifications::NotificationCreateDBRequest;
use crate::types::ProfileId;

/// Insert one notification row. Failures are logged at warn and swallowed.
pub async fn notify(pool: &PgPool, request: NotificationCreateDBRequest) {
    let mut conn = match pool.acquire().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(user = %request.user_id, error = %e, "Failed to acquire connection for notification");
            return;
        }
    };

    let mut repo = Notifications::new(&mut conn);
    if let Err(e) = repo.create(&request).await {
        tracing::warn!(
            user = %request.user_id,
            kind = ?request.kind,
            error = %e,
            "Failed to insert notification"
        );
    }
}

/// Fan out one notification to every sponsor with an active link to the
/// patient. Sequential, best-effort: a failed insert does not stop the loop
/// and nothing is rolled back.
pub async fn notify_sponsors_of_patient(pool: &PgPool, patient_id: ProfileId, kind: NotificationKind, title: &str, body: &str) {
    let sponsor_ids = {
        let mut conn = match pool.acquire().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(patient = %patient_id, error = %e, "Failed to acquire connection for sponsor fan-out");
                return;
            }
        };

        let mut links = SponsorLinks::new(&mut conn);
        match links.active_sponsor_ids(patient_id).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(patient = %patient_id, error = %e, "Failed to look up sponsors for fan-out");
                return;
            }
        }
    };

    if sponsor_ids.is_empty() {
        return;
    }

    for sponsor_id in sponsor_ids {
        notify(
            pool,
            NotificationCreateDBRequest {
                user_id: sponsor_id,
                kind,
                title: title.to_string(),
                body: Some(body.to_string()),
                reference_id: None,
            },
        )
        .await;
    }
}
