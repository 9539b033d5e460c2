//! Database repository for clinician signup requests.

use crate::api::models::clinician_requests::SignupStatus;
use crate::db::{
    errors::Result,
    models::clinician_requests::{SignupRequestCreateDBRequest, SignupRequestDBResponse},
};
use crate::types::{abbrev_uuid, ProfileId, SignupRequestId};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

pub struct SignupRequests<'c> {
    db: &'c mut PgConnection,
}

impl<'c> SignupRequests<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    pub async fn create(&mut self, request: &SignupRequestCreateDBRequest) -> Result<SignupRequestDBResponse> {
        let row = sqlx::query_as::<_, SignupRequestDBResponse>(
            r#"
            INSERT INTO clinician_signup_requests
                (id, email, full_name, license_number, specialty, institution, license_image_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.email)
        .bind(&request.full_name)
        .bind(&request.license_number)
        .bind(&request.specialty)
        .bind(&request.institution)
        .bind(&request.license_image_path)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row)
    }

    #[instrument(skip(self), fields(request_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: SignupRequestId) -> Result<Option<SignupRequestDBResponse>> {
        let row = sqlx::query_as::<_, SignupRequestDBResponse>("SELECT * FROM clinician_signup_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(row)
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self, status: Option<SignupStatus>) -> Result<Vec<SignupRequestDBResponse>> {
        let rows = sqlx::query_as::<_, SignupRequestDBResponse>(
            r#"
            SELECT * FROM clinician_signup_requests
            WHERE ($1::signup_request_status IS NULL OR status = $1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(status)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self), err)]
    pub async fn count_pending(&mut self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM clinician_signup_requests WHERE status = 'pending'",
        )
        .fetch_one(&mut *self.db)
        .await?;

        Ok(count)
    }

    /// Transition a pending request to its terminal state. The status guard is
    /// part of the UPDATE itself, so under concurrent reviewers exactly one
    /// call observes a row; the loser gets `None`.
    #[instrument(skip(self), fields(request_id = %abbrev_uuid(&id), reviewer = %abbrev_uuid(&reviewer)), err)]
    pub async fn review(
        &mut self,
        id: SignupRequestId,
        reviewer: ProfileId,
        status: SignupStatus,
    ) -> Result<Option<SignupRequestDBResponse>> {
        let row = sqlx::query_as::<_, SignupRequestDBResponse>(
            r#"
            UPDATE clinician_signup_requests
            SET status = $3, reviewed_by = $2, reviewed_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reviewer)
        .bind(status)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(row)
    }
}
