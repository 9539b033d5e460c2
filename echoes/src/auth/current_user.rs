//! Extractors for the authenticated caller.
//!
//! [`CurrentUser`] resolves the session cookie to a JWT, then re-reads the
//! caller's profile row - including the role - from the database. Role checks
//! therefore always see current state; revoking a role takes effect
//! immediately, not at token expiry.
//!
//! [`Staff`] and [`Admin`] wrap [`CurrentUser`] with a role gate, so a
//! handler's signature states its permitted set:
//!
//! ```ignore
//! async fn approve(State(state): State<AppState>, Admin(reviewer): Admin, ...) -> ... {}
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::instrument;

pub use crate::api::models::profiles::CurrentUser;
use crate::{
    auth::session,
    db::handlers::{Profiles, Repository},
    errors::{Error, Result},
    AppState,
};

/// Extract the session token from the request's cookies, if present.
fn session_cookie(parts: &Parts, cookie_name: &str) -> Result<Option<String>> {
    let Some(cookie_header) = parts.headers.get(axum::http::header::COOKIE) else {
        return Ok(None);
    };

    let cookie_str = cookie_header.to_str().map_err(|e| Error::BadRequest {
        message: format!("Invalid cookie header: {e}"),
    })?;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == cookie_name {
                return Ok(Some(value.to_string()));
            }
        }
    }
    Ok(None)
}

#[instrument(skip_all)]
async fn resolve_current_user(parts: &mut Parts, state: &AppState) -> Result<CurrentUser> {
    let cookie_name = &state.config.auth.native.session.cookie_name;
    let token = session_cookie(parts, cookie_name)?.ok_or(Error::Unauthenticated { message: None })?;

    let claims = session::verify_session_token(&token, &state.config)?;

    // Fresh role read; the JWT only proves identity
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut profiles = Profiles::new(&mut conn);
    let profile = profiles
        .get_by_id(claims.sub)
        .await?
        .ok_or(Error::Unauthenticated { message: None })?;

    Ok(CurrentUser::from(profile))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        resolve_current_user(parts, state).await
    }
}

/// Gate: clinicians and admins only. Legacy `front_desk` is not staff.
pub struct Staff(pub CurrentUser);

impl FromRequestParts<AppState> for Staff {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = resolve_current_user(parts, state).await?;
        if !user.role.is_staff() {
            return Err(Error::Forbidden {
                action: "perform clinical operations".to_string(),
            });
        }
        Ok(Staff(user))
    }
}

/// Gate: admins only.
pub struct Admin(pub CurrentUser);

impl FromRequestParts<AppState> for Admin {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = resolve_current_user(parts, state).await?;
        if user.role != crate::api::models::profiles::Role::Admin {
            return Err(Error::Forbidden {
                action: "administer the platform".to_string(),
            });
        }
        Ok(Admin(user))
    }
}
