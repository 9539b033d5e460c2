//! Database repository for password reset tokens.

use crate::auth::password;
use crate::db::{
    errors::{DbError, Result},
    models::password_reset_tokens::PasswordResetTokenDBResponse,
};
use crate::types::{abbrev_uuid, ProfileId};
use chrono::{Duration, Utc};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

pub struct PasswordResetTokens<'c> {
    db: &'c mut PgConnection,
}

impl<'c> PasswordResetTokens<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Create a token for a user. Returns the raw token (for the email) and
    /// the stored row; only the Argon2 hash of the token touches the database.
    #[instrument(skip(self, ttl), fields(user = %abbrev_uuid(&user_id)), err)]
    pub async fn create_for_user(
        &mut self,
        user_id: ProfileId,
        ttl: std::time::Duration,
    ) -> Result<(String, PasswordResetTokenDBResponse)> {
        let raw_token = password::generate_reset_token();
        let token_hash = password::hash_string(&raw_token).map_err(|e| DbError::Other(anyhow::anyhow!("{e}")))?;
        let expires_at = Utc::now() + Duration::from_std(ttl).unwrap_or_else(|_| Duration::minutes(30));

        let row = sqlx::query_as::<_, PasswordResetTokenDBResponse>(
            r#"
            INSERT INTO password_reset_tokens (id, user_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&token_hash)
        .bind(expires_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok((raw_token, row))
    }

    /// Look up an unused, unexpired token by id and verify the raw value
    /// against the stored hash.
    #[instrument(skip(self, raw_token), fields(token_id = %abbrev_uuid(&token_id)), err)]
    pub async fn find_valid_token_by_id(
        &mut self,
        token_id: Uuid,
        raw_token: &str,
    ) -> Result<Option<PasswordResetTokenDBResponse>> {
        let row = sqlx::query_as::<_, PasswordResetTokenDBResponse>(
            "SELECT * FROM password_reset_tokens WHERE id = $1 AND used_at IS NULL AND expires_at > NOW()",
        )
        .bind(token_id)
        .fetch_optional(&mut *self.db)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let matches =
            password::verify_string(raw_token, &row.token_hash).map_err(|e| DbError::Other(anyhow::anyhow!("{e}")))?;

        Ok(matches.then_some(row))
    }

    /// Invalidate every outstanding token for a user (including the one being
    /// consumed).
    #[instrument(skip(self), fields(user = %abbrev_uuid(&user_id)), err)]
    pub async fn consume_all_for_user(&mut self, user_id: ProfileId) -> Result<u64> {
        let result = sqlx::query("UPDATE password_reset_tokens SET used_at = NOW() WHERE user_id = $1 AND used_at IS NULL")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::profiles::Role;
    use crate::db::handlers::{profiles::Profiles, repository::Repository};
    use crate::db::models::profiles::ProfileCreateDBRequest;
    use sqlx::PgPool;

    async fn seed_profile(conn: &mut PgConnection) -> ProfileId {
        let mut profiles = Profiles::new(conn);
        profiles
            .create(&ProfileCreateDBRequest {
                email: "reset@example.com".to_string(),
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
    async fn test_token_roundtrip_and_single_use(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user = seed_profile(&mut conn).await;

        let mut repo = PasswordResetTokens::new(&mut conn);
        let (raw, row) = repo
            .create_for_user(user, std::time::Duration::from_secs(30 * 60))
            .await
            .unwrap();
        assert_ne!(raw, row.token_hash);

        // Wrong raw value does not verify
        assert!(repo.find_valid_token_by_id(row.id, "not-the-token").await.unwrap().is_none());

        let found = repo.find_valid_token_by_id(row.id, &raw).await.unwrap();
        assert!(found.is_some());

        repo.consume_all_for_user(user).await.unwrap();
        assert!(repo.find_valid_token_by_id(row.id, &raw).await.unwrap().is_none());
    }
}
