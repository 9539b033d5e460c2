use axum::{extract::State, Json};

use crate::{
    api::models::care_plans::CarePlanResponse,
    db::handlers::CarePlans,
    errors::Error,
    AppState,
};

/// List the care plan catalog, cheapest first
#[utoipa::path(
    get,
    path = "/care-plans",
    tag = "care-plans",
    responses(
        (status = 200, description = "Care plan catalog", body = [CarePlanResponse]),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_care_plans(State(state): State<AppState>) -> Result<Json<Vec<CarePlanResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut plans = CarePlans::new(&mut conn);

    let catalog = plans.list().await?;

    Ok(Json(catalog.into_iter().map(CarePlanResponse::from).collect()))
}
