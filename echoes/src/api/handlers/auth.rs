use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use uuid::Uuid;

use crate::{
    api::models::{
        auth::{
            AuthResponse, LoginRequest, LoginResponse, PasswordResetConfirmRequest, PasswordResetRequest,
            PasswordResetResponse, RegisterRequest, RegisterResponse, SignoutRequest,
        },
        profiles::{ProfileResponse, Role},
    },
    auth::{password, session},
    config::Config,
    db::handlers::{PasswordResetTokens, Profiles, Repository},
    db::models::profiles::ProfileCreateDBRequest,
    email::EmailService,
    errors::Error,
    AppState,
};

/// Build the session Set-Cookie header value.
pub(crate) fn create_session_cookie(token: &str, config: &Config) -> String {
    let session = &config.auth.native.session;
    let secure = if session.cookie_secure { "; Secure" } else { "" };
    let max_age = config.auth.security.jwt_expiry.as_secs();

    format!(
        "{}={}; Path=/; HttpOnly{}; SameSite={}; Max-Age={}",
        session.cookie_name, token, secure, session.cookie_same_site, max_age
    )
}

/// Build a Set-Cookie value that clears the session.
fn clear_session_cookie(config: &Config) -> String {
    let session = &config.auth.native.session;
    let secure = if session.cookie_secure { "; Secure" } else { "" };

    format!(
        "{}=; Path=/; HttpOnly{}; SameSite={}; Max-Age=0",
        session.cookie_name, secure, session.cookie_same_site
    )
}

fn validate_password_length(password: &str, config: &Config) -> Result<(), Error> {
    let password_config = &config.auth.native.password;
    if password.len() < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if password.len() > password_config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }
    Ok(())
}

/// Register a new patient account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "auth",
    responses(
        (status = 201, description = "Account registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Account already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<RegisterResponse, Error> {
    if !state.config.auth.native.allow_registration {
        return Err(Error::BadRequest {
            message: "Registration is disabled".to_string(),
        });
    }

    let email = request.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(Error::BadRequest {
            message: "Email is required".to_string(),
        });
    }
    validate_password_length(&request.password, &state.config)?;

    // Hash the password on a blocking thread to avoid blocking the async runtime
    let password_hash = tokio::task::spawn_blocking({
        let password = request.password.clone();
        move || password::hash_string(&password)
    })
    .await
    .map_err(|e| Error::Internal {
        operation: format!("spawn password hashing task: {e}"),
    })??;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut profiles = Profiles::new(&mut conn);

    if profiles.get_by_email(&email).await?.is_some() {
        return Err(Error::BadRequest {
            message: "An account with this email address already exists".to_string(),
        });
    }

    // Self-registration always creates a patient account; staff accounts go
    // through the clinician approval flow.
    let created = profiles
        .create(&ProfileCreateDBRequest {
            email: email.clone(),
            password_hash: Some(password_hash),
            role: Role::User,
            full_name: request.full_name.clone(),
            avatar_url: None,
            date_of_birth: None,
        })
        .await?;

    let token = session::create_session_token(created.id, &created.email, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    Ok(RegisterResponse {
        auth_response: AuthResponse {
            profile: ProfileResponse::from(created),
            message: "Registration successful".to_string(),
        },
        cookie,
    })
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    let email = request.email.trim().to_lowercase();

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut profiles = Profiles::new(&mut conn);

    let profile = profiles.get_by_email(&email).await?.ok_or_else(|| Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    })?;

    // Provisioned accounts have no password until the first reset
    let password_hash = profile.password_hash.clone().ok_or_else(|| Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    })?;

    // Verify password on a blocking thread to avoid blocking the async runtime
    let is_valid = tokio::task::spawn_blocking({
        let password = request.password.clone();
        move || password::verify_string(&password, &password_hash)
    })
    .await
    .map_err(|e| Error::Internal {
        operation: format!("spawn password verification task: {e}"),
    })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Invalid email or password".to_string()),
        });
    }

    let token = session::create_session_token(profile.id, &profile.email, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    Ok(LoginResponse {
        auth_response: AuthResponse {
            profile: ProfileResponse::from(profile),
            message: "Login successful".to_string(),
        },
        cookie,
    })
}

/// Sign out: clear the session cookie and redirect
#[utoipa::path(
    post,
    path = "/auth/signout",
    tag = "auth",
    responses(
        (status = 302, description = "Session cleared, redirecting"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn signout(State(state): State<AppState>, Form(form): Form<SignoutRequest>) -> Response {
    // Only relative paths are honored, anything else falls back to "/"
    let redirect_to = match form.redirect_to.as_deref() {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/".to_string(),
    };

    (
        StatusCode::FOUND,
        [
            (header::SET_COOKIE, clear_session_cookie(&state.config)),
            (header::LOCATION, redirect_to),
        ],
    )
        .into_response()
}

/// Request password reset (send email)
#[utoipa::path(
    post,
    path = "/auth/password-resets",
    request_body = PasswordResetRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Password reset email sent", body = PasswordResetResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<Json<PasswordResetResponse>, Error> {
    let email = request.email.trim().to_lowercase();

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    // Uniform success response to avoid email enumeration; only send when the
    // account actually exists.
    let profile = {
        let mut profiles = Profiles::new(&mut tx);
        profiles.get_by_email(&email).await?
    };

    if let Some(profile) = profile {
        let (raw_token, token) = {
            let mut tokens = PasswordResetTokens::new(&mut tx);
            tokens
                .create_for_user(profile.id, state.config.auth.native.password_reset_token_duration)
                .await?
        };

        let email_service = EmailService::new(&state.config)?;
        email_service
            .send_password_reset_email(&profile.email, profile.full_name.as_deref(), &token.id, &raw_token)
            .await?;
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(PasswordResetResponse {
        message: "If an account with that email exists, a password reset link has been sent.".to_string(),
    }))
}

/// Confirm password reset with token
#[utoipa::path(
    post,
    path = "/auth/password-resets/{token_id}/confirm",
    request_body = PasswordResetConfirmRequest,
    tag = "auth",
    params(("token_id" = String, Path, description = "Reset token ID from the email link")),
    responses(
        (status = 200, description = "Password reset successful", body = PasswordResetResponse),
        (status = 400, description = "Invalid or expired token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Path(token_id): Path<Uuid>,
    Json(request): Json<PasswordResetConfirmRequest>,
) -> Result<Json<PasswordResetResponse>, Error> {
    validate_password_length(&request.new_password, &state.config)?;

    let new_password_hash = tokio::task::spawn_blocking({
        let password = request.new_password.clone();
        move || password::hash_string(&password)
    })
    .await
    .map_err(|e| Error::Internal {
        operation: format!("spawn password hashing task: {e}"),
    })??;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let token = {
        let mut tokens = PasswordResetTokens::new(&mut tx);
        tokens
            .find_valid_token_by_id(token_id, &request.token)
            .await?
            .ok_or_else(|| Error::BadRequest {
                message: "Invalid or expired reset token".to_string(),
            })?
    };

    {
        let mut profiles = Profiles::new(&mut tx);
        profiles.set_password(token.user_id, &new_password_hash).await?;
    }

    {
        // Invalidate all tokens for this user (including the current one)
        let mut tokens = PasswordResetTokens::new(&mut tx);
        tokens.consume_all_for_user(token.user_id).await?;
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(PasswordResetResponse {
        message: "Password has been reset. You can now sign in.".to_string(),
    }))
}
