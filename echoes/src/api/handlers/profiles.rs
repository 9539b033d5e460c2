use axum::{extract::State, Json};

use crate::{
    api::models::profiles::{CurrentUser, ProfileResponse, ProfileUpdate},
    db::handlers::{Profiles, Repository},
    db::models::profiles::ProfileUpdateDBRequest,
    errors::Error,
    AppState,
};

/// Get the caller's own profile
#[utoipa::path(
    get,
    path = "/profiles/me",
    tag = "profiles",
    responses(
        (status = 200, description = "Caller's profile", body = ProfileResponse),
        (status = 401, description = "Not signed in"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_me(State(state): State<AppState>, user: CurrentUser) -> Result<Json<ProfileResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut profiles = Profiles::new(&mut conn);

    let profile = profiles.get_by_id(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Profile".to_string(),
        id: user.id.to_string(),
    })?;

    Ok(Json(ProfileResponse::from(profile)))
}

/// Update the caller's own profile
#[utoipa::path(
    patch,
    path = "/profiles/me",
    request_body = ProfileUpdate,
    tag = "profiles",
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 401, description = "Not signed in"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_me(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut profiles = Profiles::new(&mut conn);

    let updated = profiles
        .update(
            user.id,
            &ProfileUpdateDBRequest {
                full_name: request.full_name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
                avatar_url: request.avatar_url,
                date_of_birth: request.date_of_birth,
                password_hash: None,
            },
        )
        .await?;

    Ok(Json(ProfileResponse::from(updated)))
}
