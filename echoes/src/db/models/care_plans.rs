//! Database models for the care plan catalog.

use crate::types::CarePlanId;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct CarePlanDBResponse {
    pub id: CarePlanId,
    pub slug: String,
    pub name: String,
    pub price_cents: i64,
    pub features: Vec<String>,
}
