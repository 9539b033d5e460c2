//! Database repository for profiles.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::profiles::{ProfileCreateDBRequest, ProfileDBResponse, ProfileUpdateDBRequest},
};
use crate::types::{abbrev_uuid, ProfileId};
use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing profiles
#[derive(Debug, Clone)]
pub struct ProfileFilter {
    pub skip: i64,
    pub limit: i64,
}

impl ProfileFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

pub struct Profiles<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Profiles<'c> {
    type CreateRequest = ProfileCreateDBRequest;
    type UpdateRequest = ProfileUpdateDBRequest;
    type Response = ProfileDBResponse;
    type Id = ProfileId;
    type Filter = ProfileFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let profile_id = Uuid::new_v4();

        let profile = sqlx::query_as::<_, ProfileDBResponse>(
            r#"
            INSERT INTO profiles (id, email, password_hash, role, full_name, avatar_url, date_of_birth)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(profile_id)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(request.role)
        .bind(&request.full_name)
        .bind(&request.avatar_url)
        .bind(request.date_of_birth)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(profile)
    }

    #[instrument(skip(self), fields(profile_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(profile)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<ProfileId>) -> Result<HashMap<Self::Id, ProfileDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let profiles = sqlx::query_as::<_, ProfileDBResponse>("SELECT * FROM profiles WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(profiles.into_iter().map(|p| (p.id, p)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let profiles = sqlx::query_as::<_, ProfileDBResponse>(
            "SELECT * FROM profiles ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(profiles)
    }

    #[instrument(skip(self), fields(profile_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(profile_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>(
            r#"
            UPDATE profiles SET
                full_name = COALESCE($2, full_name),
                avatar_url = COALESCE($3, avatar_url),
                date_of_birth = COALESCE($4, date_of_birth),
                password_hash = COALESCE($5, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.full_name)
        .bind(&request.avatar_url)
        .bind(request.date_of_birth)
        .bind(&request.password_hash)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(profile)
    }
}

impl<'c> Profiles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Emails are stored lowercased; callers are expected to normalize before
    /// lookup (handlers do `trim().to_lowercase()`).
    #[instrument(skip(self, email), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<ProfileDBResponse>> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>("SELECT * FROM profiles WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(profile)
    }

    #[instrument(skip(self, password_hash), fields(profile_id = %abbrev_uuid(&id)), err)]
    pub async fn set_password(&mut self, id: ProfileId, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE profiles SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
