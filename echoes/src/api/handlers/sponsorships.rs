use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::notifications::NotificationKind,
    api::models::profiles::CurrentUser,
    api::models::sponsorships::{
        ConsentRequestResponse, ConsentStatus, DeclineRequest, PurchaseRequest, SponsorLinkResponse, SponsorshipsResponse,
    },
    db::handlers::{CarePlans, ConsentRequests, Profiles, SponsorLinks},
    db::models::notifications::NotificationCreateDBRequest,
    db::models::sponsorships::{ConsentRequestCreateDBRequest, SponsorLinkCreateDBRequest},
    errors::Error,
    notify,
    types::{ConsentRequestId, SponsorLinkId},
    AppState,
};

/// Purchase a care plan for a patient (creates a pending consent request)
///
/// The patient email is resolved to an existing account at creation time;
/// when it matches, `patient_id` is backfilled and the patient gets a
/// `consent_request` notification. Nothing is shared until the patient
/// accepts.
#[utoipa::path(
    post,
    path = "/sponsorships",
    request_body = PurchaseRequest,
    tag = "sponsorships",
    responses(
        (status = 201, description = "Consent request created", body = ConsentRequestResponse),
        (status = 400, description = "Invalid plan or missing email"),
        (status = 401, description = "Not signed in"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn purchase_plan(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<ConsentRequestResponse>), Error> {
    let patient_email = request.patient_email.trim().to_lowercase();
    if patient_email.is_empty() {
        return Err(Error::BadRequest {
            message: "Patient email is required".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let plan = {
        let mut plans = CarePlans::new(&mut tx);
        plans.get_by_id(request.care_plan_id).await?.ok_or_else(|| Error::BadRequest {
            message: "Invalid plan".to_string(),
        })?
    };

    let patient = {
        let mut profiles = Profiles::new(&mut tx);
        profiles.get_by_email(&patient_email).await?
    };

    let consent = {
        let mut consents = ConsentRequests::new(&mut tx);
        consents
            .create(&ConsentRequestCreateDBRequest {
                sponsor_id: user.id,
                patient_email,
                patient_id: patient.as_ref().map(|p| p.id),
                care_plan_id: plan.id,
            })
            .await?
    };

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    // Notify the matched patient after commit, best-effort
    if let Some(patient) = patient {
        let sponsor_name = user.display_name();
        notify::notify(
            &state.db,
            NotificationCreateDBRequest {
                user_id: patient.id,
                kind: NotificationKind::ConsentRequest,
                title: format!("{sponsor_name} wants to sponsor your care"),
                body: Some(format!(
                    "{sponsor_name} has purchased the {} plan for you. Accept to allow them to see \
                     your health information and appointment schedules.",
                    plan.name
                )),
                reference_id: Some(consent.id),
            },
        )
        .await;
    }

    Ok((StatusCode::CREATED, Json(ConsentRequestResponse::from(consent))))
}

/// Accept a consent request addressed to the caller
///
/// The status flip and the active link insert run in one transaction: either
/// the request is accepted AND the sponsor-patient link exists, or neither.
#[utoipa::path(
    post,
    path = "/sponsorships/{id}/accept",
    tag = "sponsorships",
    params(("id" = String, Path, description = "Consent request ID")),
    responses(
        (status = 200, description = "Request accepted, link created", body = ConsentRequestResponse),
        (status = 403, description = "Request is addressed to someone else"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request was already responded to"),
    )
)]
#[tracing::instrument(skip_all, fields(request_id = %id))]
pub async fn accept_consent(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ConsentRequestId>,
) -> Result<Json<ConsentRequestResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    // Ownership check first: a request addressed to someone else is always an
    // authorization error, whatever its status
    let request = {
        let mut consents = ConsentRequests::new(&mut tx);
        consents.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "Consent request".to_string(),
            id: id.to_string(),
        })?
    };

    if request.patient_id != Some(user.id) {
        return Err(Error::Forbidden {
            action: "respond to consent requests addressed to someone else".to_string(),
        });
    }

    let accepted = {
        let mut consents = ConsentRequests::new(&mut tx);
        consents.respond(id, ConsentStatus::Accepted, None).await?
    }
    .ok_or_else(|| Error::StateConflict {
        message: "This request was already responded to".to_string(),
    })?;

    {
        let mut links = SponsorLinks::new(&mut tx);
        links
            .create(&SponsorLinkCreateDBRequest {
                sponsor_id: accepted.sponsor_id,
                patient_id: user.id,
                care_plan_id: accepted.care_plan_id,
                consent_request_id: accepted.id,
            })
            .await?;
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let patient_name = user.display_name();
    notify::notify(
        &state.db,
        NotificationCreateDBRequest {
            user_id: accepted.sponsor_id,
            kind: NotificationKind::SponsorshipAccepted,
            title: "Sponsorship accepted".to_string(),
            body: Some(format!(
                "{patient_name} accepted your care plan sponsorship. You can now view their metrics and appointments."
            )),
            reference_id: Some(accepted.id),
        },
    )
    .await;

    Ok(Json(ConsentRequestResponse::from(accepted)))
}

/// Decline a consent request addressed to the caller
#[utoipa::path(
    post,
    path = "/sponsorships/{id}/decline",
    request_body = DeclineRequest,
    tag = "sponsorships",
    params(("id" = String, Path, description = "Consent request ID")),
    responses(
        (status = 200, description = "Request declined", body = ConsentRequestResponse),
        (status = 403, description = "Request is addressed to someone else"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request was already responded to"),
    )
)]
#[tracing::instrument(skip_all, fields(request_id = %id))]
pub async fn decline_consent(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ConsentRequestId>,
    Json(body): Json<DeclineRequest>,
) -> Result<Json<ConsentRequestResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut consents = ConsentRequests::new(&mut conn);

    let request = consents.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Consent request".to_string(),
        id: id.to_string(),
    })?;

    if request.patient_id != Some(user.id) {
        return Err(Error::Forbidden {
            action: "respond to consent requests addressed to someone else".to_string(),
        });
    }

    let reason = body.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
    let declined = consents
        .respond(id, ConsentStatus::Declined, reason)
        .await?
        .ok_or_else(|| Error::StateConflict {
            message: "This request was already responded to".to_string(),
        })?;

    Ok(Json(ConsentRequestResponse::from(declined)))
}

/// List the caller's sponsorships in both directions
#[utoipa::path(
    get,
    path = "/sponsorships",
    tag = "sponsorships",
    responses(
        (status = 200, description = "Requests and active links", body = SponsorshipsResponse),
        (status = 401, description = "Not signed in"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_sponsorships(State(state): State<AppState>, user: CurrentUser) -> Result<Json<SponsorshipsResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let (sent, received) = {
        let mut consents = ConsentRequests::new(&mut conn);
        let sent = consents.list_for_sponsor(user.id).await?;
        let received = consents.list_for_patient(user.id).await?;
        (sent, received)
    };

    let (as_sponsor, as_patient) = {
        let mut links = SponsorLinks::new(&mut conn);
        let as_sponsor = links.list_active_for_sponsor(user.id).await?;
        let as_patient = links.list_active_for_patient(user.id).await?;
        (as_sponsor, as_patient)
    };

    Ok(Json(SponsorshipsResponse {
        sent_requests: sent.into_iter().map(ConsentRequestResponse::from).collect(),
        received_requests: received.into_iter().map(ConsentRequestResponse::from).collect(),
        links_as_sponsor: as_sponsor.into_iter().map(SponsorLinkResponse::from).collect(),
        links_as_patient: as_patient.into_iter().map(SponsorLinkResponse::from).collect(),
    }))
}

/// End an active sponsorship link (soft-delete)
///
/// Allowed for the sponsoring user, the sponsored patient, or an admin. Ended
/// links drop out of every active-link read and out of visit fan-outs.
#[utoipa::path(
    post,
    path = "/sponsorships/links/{id}/end",
    tag = "sponsorships",
    params(("id" = String, Path, description = "Sponsor-patient link ID")),
    responses(
        (status = 200, description = "Link ended", body = SponsorLinkResponse),
        (status = 403, description = "Caller is not a party to the link"),
        (status = 404, description = "Link not found"),
        (status = 409, description = "Link was already ended"),
    )
)]
#[tracing::instrument(skip_all, fields(link_id = %id))]
pub async fn end_link(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<SponsorLinkId>,
) -> Result<Json<SponsorLinkResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut links = SponsorLinks::new(&mut conn);

    let link = links.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Sponsorship link".to_string(),
        id: id.to_string(),
    })?;

    let is_party = link.sponsor_id == user.id || link.patient_id == user.id;
    if !is_party && user.role != crate::api::models::profiles::Role::Admin {
        return Err(Error::Forbidden {
            action: "end a sponsorship you are not part of".to_string(),
        });
    }

    if !links.end(id).await? {
        return Err(Error::StateConflict {
            message: "This sponsorship was already ended".to_string(),
        });
    }

    let ended = links.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Sponsorship link".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(SponsorLinkResponse::from(ended)))
}
