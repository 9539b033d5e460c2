use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::clinician_requests::{ListSignupRequestsQuery, SignupRequestResponse, SignupStatus},
    api::models::profiles::Role,
    auth::current_user::Admin,
    auth::password,
    db::handlers::{PasswordResetTokens, Profiles, Repository, SignupRequests},
    db::models::clinician_requests::SignupRequestCreateDBRequest,
    db::models::profiles::ProfileCreateDBRequest,
    email::EmailService,
    errors::Error,
    types::SignupRequestId,
    uploads::LicenseStore,
    AppState,
};

/// Submit a clinician signup request with a license image
///
/// Public endpoint: the prospective clinician has no account yet. The license
/// file must be jpeg/png/webp/pdf and within the configured size limit; both
/// checks happen before anything touches disk.
#[utoipa::path(
    post,
    path = "/clinician-requests",
    tag = "clinician-requests",
    request_body(
        content_type = "multipart/form-data",
        description = "Signup fields plus a `license` file part"
    ),
    responses(
        (status = 201, description = "Request submitted", body = SignupRequestResponse),
        (status = 400, description = "Missing field or disallowed file type"),
        (status = 413, description = "License file too large"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_request(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SignupRequestResponse>), Error> {
    let store = LicenseStore::new(&state.config.uploads);

    let mut email: Option<String> = None;
    let mut full_name: Option<String> = None;
    let mut license_number: Option<String> = None;
    let mut specialty: Option<String> = None;
    let mut institution: Option<String> = None;
    let mut license_file: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "license" => {
                let content_type = field.content_type().unwrap_or("").to_string();
                store.validate_content_type(&content_type)?;

                let filename = field.file_name().map(|s| s.to_string()).unwrap_or_else(|| "license".to_string());

                // Stream chunks with an incremental size check so oversized
                // uploads abort before the body is fully read
                let mut bytes: Vec<u8> = Vec::new();
                while let Some(chunk) = field.chunk().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read license file: {e}"),
                })? {
                    store.validate_size((bytes.len() + chunk.len()) as u64)?;
                    bytes.extend_from_slice(&chunk);
                }

                license_file = Some((filename, bytes));
            }
            name => {
                let value = field.text().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read field {name:?}: {e}"),
                })?;
                let value = value.trim().to_string();
                let value = (!value.is_empty()).then_some(value);

                match name {
                    "email" => email = value.map(|v| v.to_lowercase()),
                    "full_name" => full_name = value,
                    "license_number" => license_number = value,
                    "specialty" => specialty = value,
                    "institution" => institution = value,
                    other => {
                        tracing::debug!(field = other, "Ignoring unknown multipart field");
                    }
                }
            }
        }
    }

    let email = email.ok_or_else(|| Error::BadRequest {
        message: "Email is required".to_string(),
    })?;
    let full_name = full_name.ok_or_else(|| Error::BadRequest {
        message: "Full name is required".to_string(),
    })?;
    let license_number = license_number.ok_or_else(|| Error::BadRequest {
        message: "License number is required".to_string(),
    })?;
    let (filename, bytes) = license_file.ok_or_else(|| Error::BadRequest {
        message: "A license image is required".to_string(),
    })?;

    // All validation passed; now the file may land on disk
    let license_image_path = store.save(&filename, &bytes).await?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut requests = SignupRequests::new(&mut conn);

    let created = requests
        .create(&SignupRequestCreateDBRequest {
            email,
            full_name,
            license_number,
            specialty,
            institution,
            license_image_path,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(SignupRequestResponse::from(created))))
}

/// List clinician signup requests (admin approval queue)
#[utoipa::path(
    get,
    path = "/clinician-requests",
    tag = "clinician-requests",
    params(ListSignupRequestsQuery),
    responses(
        (status = 200, description = "Signup requests, oldest first", body = [SignupRequestResponse]),
        (status = 403, description = "Not an admin"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_requests(
    State(state): State<AppState>,
    Admin(_admin): Admin,
    Query(query): Query<ListSignupRequestsQuery>,
) -> Result<Json<Vec<SignupRequestResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut requests = SignupRequests::new(&mut conn);

    let rows = requests.list(query.status).await?;

    Ok(Json(rows.into_iter().map(SignupRequestResponse::from).collect()))
}

/// Approve a pending signup request and provision the clinician account
///
/// The `pending -> approved` flip and the account provisioning share one
/// transaction. If the email already belongs to an account the request is
/// still marked approved without creating a second one (idempotent
/// provisioning). The welcome email goes out after commit, best-effort.
#[utoipa::path(
    post,
    path = "/clinician-requests/{id}/approve",
    tag = "clinician-requests",
    params(("id" = String, Path, description = "Signup request ID")),
    responses(
        (status = 200, description = "Request approved", body = SignupRequestResponse),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request was already reviewed"),
    )
)]
#[tracing::instrument(skip_all, fields(request_id = %id))]
pub async fn approve_request(
    State(state): State<AppState>,
    Admin(reviewer): Admin,
    Path(id): Path<SignupRequestId>,
) -> Result<Json<SignupRequestResponse>, Error> {
    let temp_password_hash = tokio::task::spawn_blocking(|| {
        let temp_password = password::generate_temp_password();
        password::hash_string(&temp_password)
    })
    .await
    .map_err(|e| Error::Internal {
        operation: format!("spawn password hashing task: {e}"),
    })??;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let reviewed = {
        let mut requests = SignupRequests::new(&mut tx);
        requests.review(id, reviewer.id, SignupStatus::Approved).await?
    };

    let Some(request) = reviewed else {
        return Err(already_reviewed_or_missing(&mut tx, id).await?);
    };

    let existing = {
        let mut profiles = Profiles::new(&mut tx);
        profiles.get_by_email(&request.email).await?
    };

    // "Already registered" is treated as idempotent provisioning: the request
    // stays approved and no second account or email is produced.
    let welcome = match existing {
        Some(profile) => {
            tracing::info!(email = %request.email, profile_id = %profile.id, "Clinician email already registered, skipping provisioning");
            None
        }
        None => {
            let created = {
                let mut profiles = Profiles::new(&mut tx);
                profiles
                    .create(&ProfileCreateDBRequest {
                        email: request.email.clone(),
                        password_hash: Some(temp_password_hash),
                        role: Role::Clinician,
                        full_name: Some(request.full_name.clone()),
                        avatar_url: None,
                        date_of_birth: None,
                    })
                    .await?
            };

            let (raw_token, token) = {
                let mut tokens = PasswordResetTokens::new(&mut tx);
                tokens
                    .create_for_user(created.id, state.config.auth.native.password_reset_token_duration)
                    .await?
            };

            Some((created, raw_token, token))
        }
    };

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    // Email is a side effect of an already-committed approval: log and move on
    if let Some((profile, raw_token, token)) = welcome {
        match EmailService::new(&state.config) {
            Ok(email_service) => {
                if let Err(e) = email_service
                    .send_clinician_welcome_email(&profile.email, profile.full_name.as_deref(), &token.id, &raw_token)
                    .await
                {
                    tracing::error!(email = %profile.email, error = %e, "Failed to send clinician welcome email");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create email service for clinician welcome email");
            }
        }
    }

    Ok(Json(SignupRequestResponse::from(request)))
}

/// Reject a pending signup request
#[utoipa::path(
    post,
    path = "/clinician-requests/{id}/reject",
    tag = "clinician-requests",
    params(("id" = String, Path, description = "Signup request ID")),
    responses(
        (status = 200, description = "Request rejected", body = SignupRequestResponse),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request was already reviewed"),
    )
)]
#[tracing::instrument(skip_all, fields(request_id = %id))]
pub async fn reject_request(
    State(state): State<AppState>,
    Admin(reviewer): Admin,
    Path(id): Path<SignupRequestId>,
) -> Result<Json<SignupRequestResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let reviewed = {
        let mut requests = SignupRequests::new(&mut tx);
        requests.review(id, reviewer.id, SignupStatus::Rejected).await?
    };

    let Some(request) = reviewed else {
        return Err(already_reviewed_or_missing(&mut tx, id).await?);
    };

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(SignupRequestResponse::from(request)))
}

/// A review that matched no pending row is either a stale id or a second
/// review; look again to tell the two apart.
async fn already_reviewed_or_missing(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: SignupRequestId,
) -> Result<Error, Error> {
    let mut requests = SignupRequests::new(tx);
    Ok(match requests.get_by_id(id).await? {
        None => Error::NotFound {
            resource: "Signup request".to_string(),
            id: id.to_string(),
        },
        Some(_) => Error::StateConflict {
            message: "Request was already reviewed".to_string(),
        },
    })
}
