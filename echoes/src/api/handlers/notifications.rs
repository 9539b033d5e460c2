use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::models::notifications::{ClearedResponse, NotificationResponse},
    api::models::profiles::CurrentUser,
    db::handlers::Notifications,
    errors::Error,
    types::NotificationId,
    AppState,
};

/// List the caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    responses(
        (status = 200, description = "Caller's notifications", body = [NotificationResponse]),
        (status = 401, description = "Not signed in"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_notifications(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Vec<NotificationResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Notifications::new(&mut conn);

    let rows = repo.list_for_user(user.id).await?;

    Ok(Json(rows.into_iter().map(NotificationResponse::from).collect()))
}

/// Mark one of the caller's notifications as read
#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    tag = "notifications",
    params(("id" = String, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Marked read"),
        (status = 404, description = "Not found (or not owned by caller)"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<NotificationId>,
) -> Result<axum::http::StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Notifications::new(&mut conn);

    // Owner-scoped: someone else's notification reads as not-found
    if !repo.mark_read(id, user.id).await? {
        return Err(Error::NotFound {
            resource: "Notification".to_string(),
            id: id.to_string(),
        });
    }

    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// Delete all of the caller's notifications
#[utoipa::path(
    delete,
    path = "/notifications",
    tag = "notifications",
    responses(
        (status = 200, description = "Notifications cleared", body = ClearedResponse),
        (status = 401, description = "Not signed in"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn clear_notifications(State(state): State<AppState>, user: CurrentUser) -> Result<Json<ClearedResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Notifications::new(&mut conn);

    let deleted = repo.clear_for_user(user.id).await?;

    Ok(Json(ClearedResponse { deleted }))
}
