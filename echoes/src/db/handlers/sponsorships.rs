//! Database repositories for consent requests and sponsor-patient plan links.

use crate::api::models::sponsorships::ConsentStatus;
use crate::db::{
    errors::Result,
    models::sponsorships::{
        ConsentRequestCreateDBRequest, ConsentRequestDBResponse, SponsorLinkCreateDBRequest, SponsorLinkDBResponse,
    },
};
use crate::types::{abbrev_uuid, ConsentRequestId, ProfileId, SponsorLinkId};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

pub struct ConsentRequests<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ConsentRequests<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(sponsor = %abbrev_uuid(&request.sponsor_id)), err)]
    pub async fn create(&mut self, request: &ConsentRequestCreateDBRequest) -> Result<ConsentRequestDBResponse> {
        let row = sqlx::query_as::<_, ConsentRequestDBResponse>(
            r#"
            INSERT INTO sponsorship_consent_requests
                (id, sponsor_id, patient_email, patient_id, care_plan_id, payment_simulated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.sponsor_id)
        .bind(&request.patient_email)
        .bind(request.patient_id)
        .bind(request.care_plan_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row)
    }

    #[instrument(skip(self), fields(request_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: ConsentRequestId) -> Result<Option<ConsentRequestDBResponse>> {
        let row = sqlx::query_as::<_, ConsentRequestDBResponse>("SELECT * FROM sponsorship_consent_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(row)
    }

    /// Respond to a pending request. The `status = 'pending'` guard makes the
    /// transition atomic: once a request leaves `pending` no later call can
    /// move it again, and the loser of a race gets `None`.
    #[instrument(skip(self, decline_reason), fields(request_id = %abbrev_uuid(&id), ?status), err)]
    pub async fn respond(
        &mut self,
        id: ConsentRequestId,
        status: ConsentStatus,
        decline_reason: Option<&str>,
    ) -> Result<Option<ConsentRequestDBResponse>> {
        let row = sqlx::query_as::<_, ConsentRequestDBResponse>(
            r#"
            UPDATE sponsorship_consent_requests
            SET status = $2, decline_reason = $3, responded_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(decline_reason)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(row)
    }

    #[instrument(skip(self), fields(sponsor = %abbrev_uuid(&sponsor_id)), err)]
    pub async fn list_for_sponsor(&mut self, sponsor_id: ProfileId) -> Result<Vec<ConsentRequestDBResponse>> {
        let rows = sqlx::query_as::<_, ConsentRequestDBResponse>(
            "SELECT * FROM sponsorship_consent_requests WHERE sponsor_id = $1 ORDER BY created_at DESC",
        )
        .bind(sponsor_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self), fields(patient = %abbrev_uuid(&patient_id)), err)]
    pub async fn list_for_patient(&mut self, patient_id: ProfileId) -> Result<Vec<ConsentRequestDBResponse>> {
        let rows = sqlx::query_as::<_, ConsentRequestDBResponse>(
            "SELECT * FROM sponsorship_consent_requests WHERE patient_id = $1 ORDER BY created_at DESC",
        )
        .bind(patient_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self), fields(patient = %abbrev_uuid(&patient_id)), err)]
    pub async fn list_pending_for_patient(&mut self, patient_id: ProfileId) -> Result<Vec<ConsentRequestDBResponse>> {
        let rows = sqlx::query_as::<_, ConsentRequestDBResponse>(
            "SELECT * FROM sponsorship_consent_requests WHERE patient_id = $1 AND status = 'pending' ORDER BY created_at DESC",
        )
        .bind(patient_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }
}

pub struct SponsorLinks<'c> {
    db: &'c mut PgConnection,
}

impl<'c> SponsorLinks<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(patient = %abbrev_uuid(&request.patient_id)), err)]
    pub async fn create(&mut self, request: &SponsorLinkCreateDBRequest) -> Result<SponsorLinkDBResponse> {
        let row = sqlx::query_as::<_, SponsorLinkDBResponse>(
            r#"
            INSERT INTO sponsor_patient_plans (id, sponsor_id, patient_id, care_plan_id, consent_request_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.sponsor_id)
        .bind(request.patient_id)
        .bind(request.care_plan_id)
        .bind(request.consent_request_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row)
    }

    #[instrument(skip(self), fields(link_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: SponsorLinkId) -> Result<Option<SponsorLinkDBResponse>> {
        let row = sqlx::query_as::<_, SponsorLinkDBResponse>("SELECT * FROM sponsor_patient_plans WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(row)
    }

    /// Sponsors with a currently-active link to this patient. Ended links
    /// (`ended_at IS NOT NULL`) are excluded; this is the fan-out audience
    /// for visit notifications.
    #[instrument(skip(self), fields(patient = %abbrev_uuid(&patient_id)), err)]
    pub async fn active_sponsor_ids(&mut self, patient_id: ProfileId) -> Result<Vec<ProfileId>> {
        let ids = sqlx::query_scalar::<_, ProfileId>(
            "SELECT sponsor_id FROM sponsor_patient_plans WHERE patient_id = $1 AND ended_at IS NULL",
        )
        .bind(patient_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(ids)
    }

    #[instrument(skip(self), fields(sponsor = %abbrev_uuid(&sponsor_id), patient = %abbrev_uuid(&patient_id)), err)]
    pub async fn active_link_exists(&mut self, sponsor_id: ProfileId, patient_id: ProfileId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM sponsor_patient_plans WHERE sponsor_id = $1 AND patient_id = $2 AND ended_at IS NULL)",
        )
        .bind(sponsor_id)
        .bind(patient_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(exists)
    }

    #[instrument(skip(self), fields(sponsor = %abbrev_uuid(&sponsor_id)), err)]
    pub async fn list_active_for_sponsor(&mut self, sponsor_id: ProfileId) -> Result<Vec<SponsorLinkDBResponse>> {
        let rows = sqlx::query_as::<_, SponsorLinkDBResponse>(
            "SELECT * FROM sponsor_patient_plans WHERE sponsor_id = $1 AND ended_at IS NULL ORDER BY started_at DESC",
        )
        .bind(sponsor_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self), fields(patient = %abbrev_uuid(&patient_id)), err)]
    pub async fn list_active_for_patient(&mut self, patient_id: ProfileId) -> Result<Vec<SponsorLinkDBResponse>> {
        let rows = sqlx::query_as::<_, SponsorLinkDBResponse>(
            "SELECT * FROM sponsor_patient_plans WHERE patient_id = $1 AND ended_at IS NULL ORDER BY started_at DESC",
        )
        .bind(patient_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    /// All active links, for the staff portal's patient roster.
    #[instrument(skip(self), err)]
    pub async fn list_active(&mut self) -> Result<Vec<SponsorLinkDBResponse>> {
        let rows = sqlx::query_as::<_, SponsorLinkDBResponse>(
            "SELECT * FROM sponsor_patient_plans WHERE ended_at IS NULL ORDER BY started_at DESC",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    /// Soft-delete: mark the link ended. Returns false if the link was already
    /// ended (or never existed).
    #[instrument(skip(self), fields(link_id = %abbrev_uuid(&id)), err)]
    pub async fn end(&mut self, id: SponsorLinkId) -> Result<bool> {
        let result = sqlx::query("UPDATE sponsor_patient_plans SET ended_at = NOW() WHERE id = $1 AND ended_at IS NULL")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
