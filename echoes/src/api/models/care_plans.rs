//! API models for the care plan catalog.

use crate::db::models::care_plans::CarePlanDBResponse;
use crate::types::CarePlanId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CarePlanResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CarePlanId,
    pub slug: String,
    pub name: String,
    pub price_cents: i64,
    pub features: Vec<String>,
}

impl From<CarePlanDBResponse> for CarePlanResponse {
    fn from(db: CarePlanDBResponse) -> Self {
        Self {
            id: db.id,
            slug: db.slug,
            name: db.name,
            price_cents: db.price_cents,
            features: db.features,
        }
    }
}
