//! Database repository for notifications.

use crate::db::{
    errors::Result,
    models::notifications::{NotificationCreateDBRequest, NotificationDBResponse},
};
use crate::types::{abbrev_uuid, NotificationId, ProfileId};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

pub struct Notifications<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Notifications<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user = %abbrev_uuid(&request.user_id), kind = ?request.kind), err)]
    pub async fn create(&mut self, request: &NotificationCreateDBRequest) -> Result<NotificationDBResponse> {
        let row = sqlx::query_as::<_, NotificationDBResponse>(
            r#"
            INSERT INTO notifications (id, user_id, kind, title, body, reference_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(request.kind)
        .bind(&request.title)
        .bind(&request.body)
        .bind(request.reference_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row)
    }

    #[instrument(skip(self), fields(user = %abbrev_uuid(&user_id)), err)]
    pub async fn list_for_user(&mut self, user_id: ProfileId) -> Result<Vec<NotificationDBResponse>> {
        let rows = sqlx::query_as::<_, NotificationDBResponse>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self), fields(user = %abbrev_uuid(&user_id)), err)]
    pub async fn unread_count(&mut self, user_id: ProfileId) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(count)
    }

    /// Scoped to the owner: marking someone else's notification is a no-op.
    #[instrument(skip(self), fields(notification_id = %abbrev_uuid(&id), user = %abbrev_uuid(&user_id)), err)]
    pub async fn mark_read(&mut self, id: NotificationId, user_id: ProfileId) -> Result<bool> {
        let result = sqlx::query("UPDATE notifications SET read_at = NOW() WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(user = %abbrev_uuid(&user_id)), err)]
    pub async fn clear_for_user(&mut self, user_id: ProfileId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::notifications::NotificationKind;
    use crate::api::models::profiles::Role;
    use crate::db::handlers::{profiles::Profiles, repository::Repository};
    use crate::db::models::profiles::ProfileCreateDBRequest;
    use sqlx::PgPool;

    async fn seed_profile(conn: &mut PgConnection, email: &str) -> ProfileId {
        let mut profiles = Profiles::new(conn);
        profiles
            .create(&ProfileCreateDBRequest {
                email: email.to_string(),
                password_hash: Some("hash".to_string()),
                role: Role::User,
                full_name: None,
                avatar_url: None,
                date_of_birth: None,
            })
            .await
            .unwrap()
            .id
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_mark_read_is_owner_scoped(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let owner = seed_profile(&mut conn, "owner@example.com").await;
        let other = seed_profile(&mut conn, "other@example.com").await;

        let mut repo = Notifications::new(&mut conn);
        let n = repo
            .create(&NotificationCreateDBRequest {
                user_id: owner,
                kind: NotificationKind::VisitUpdate,
                title: "Visit completed".to_string(),
                body: None,
                reference_id: None,
            })
            .await
            .unwrap();

        assert_eq!(repo.unread_count(owner).await.unwrap(), 1);
        // Someone else cannot mark it
        assert!(!repo.mark_read(n.id, other).await.unwrap());
        assert_eq!(repo.unread_count(owner).await.unwrap(), 1);

        assert!(repo.mark_read(n.id, owner).await.unwrap());
        assert_eq!(repo.unread_count(owner).await.unwrap(), 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_clear_deletes_only_own_rows(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let owner = seed_profile(&mut conn, "owner@example.com").await;
        let other = seed_profile(&mut conn, "other@example.com").await;

        let mut repo = Notifications::new(&mut conn);
        for user in [owner, owner, other] {
            repo.create(&NotificationCreateDBRequest {
                user_id: user,
                kind: NotificationKind::NoShowAlert,
                title: "No-show alert".to_string(),
                body: None,
                reference_id: None,
            })
            .await
            .unwrap();
        }

        assert_eq!(repo.clear_for_user(owner).await.unwrap(), 2);
        assert_eq!(repo.list_for_user(owner).await.unwrap().len(), 0);
        assert_eq!(repo.list_for_user(other).await.unwrap().len(), 1);
    }
}
