//! Database repository for the care plan catalog.
//!
//! Care plans are reference data seeded by migration; this repository is
//! read-only.

use crate::db::{errors::Result, models::care_plans::CarePlanDBResponse};
use crate::types::{abbrev_uuid, CarePlanId};
use sqlx::PgConnection;
use tracing::instrument;

pub struct CarePlans<'c> {
    db: &'c mut PgConnection,
}

impl<'c> CarePlans<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<CarePlanDBResponse>> {
        let plans = sqlx::query_as::<_, CarePlanDBResponse>("SELECT * FROM care_plans ORDER BY price_cents ASC")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(plans)
    }

    #[instrument(skip(self), fields(plan_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: CarePlanId) -> Result<Option<CarePlanDBResponse>> {
        let plan = sqlx::query_as::<_, CarePlanDBResponse>("SELECT * FROM care_plans WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(plan)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Option<CarePlanDBResponse>> {
        let plan = sqlx::query_as::<_, CarePlanDBResponse>("SELECT * FROM care_plans WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(plan)
    }
}
