use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::PgConnection;

use crate::{
    api::models::appointments::{
        AppointmentCreate, AppointmentDetailResponse, AppointmentResponse, AppointmentReschedule, AppointmentStatus,
        AppointmentStatusUpdate, ListAppointmentsQuery, NoteCreate, NoteResponse, ServiceCreate, ServiceResponse,
    },
    api::models::metrics::{MetricCreate, MetricResponse},
    api::models::notifications::NotificationKind,
    api::models::profiles::CurrentUser,
    auth::current_user::Staff,
    db::handlers::{Appointments, PatientMetrics, SponsorLinks},
    db::models::appointments::{AppointmentCreateDBRequest, NoteCreateDBRequest, ServiceCreateDBRequest},
    db::models::metrics::MetricCreateDBRequest,
    errors::Error,
    notify,
    types::{AppointmentId, ProfileId},
    AppState,
};

/// Staff, the patient themself, or a sponsor with an active link may read a
/// patient's clinical data.
async fn ensure_can_view_patient(conn: &mut PgConnection, user: &CurrentUser, patient_id: ProfileId) -> Result<(), Error> {
    if user.role.is_staff() || user.id == patient_id {
        return Ok(());
    }

    let mut links = SponsorLinks::new(conn);
    if links.active_link_exists(user.id, patient_id).await? {
        return Ok(());
    }

    Err(Error::Forbidden {
        action: "view this patient's records".to_string(),
    })
}

/// Schedule an appointment
#[utoipa::path(
    post,
    path = "/appointments",
    request_body = AppointmentCreate,
    tag = "appointments",
    responses(
        (status = 201, description = "Appointment scheduled", body = AppointmentResponse),
        (status = 403, description = "Not clinical staff"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_appointment(
    State(state): State<AppState>,
    Staff(clinician): Staff,
    Json(request): Json<AppointmentCreate>,
) -> Result<(StatusCode, Json<AppointmentResponse>), Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut appointments = Appointments::new(&mut conn);

    let created = appointments
        .create(&AppointmentCreateDBRequest {
            patient_id: request.patient_id,
            clinician_id: clinician.id,
            scheduled_at: request.scheduled_at,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(AppointmentResponse::from(created))))
}

/// List appointments visible to the caller
#[utoipa::path(
    get,
    path = "/appointments",
    tag = "appointments",
    params(ListAppointmentsQuery),
    responses(
        (status = 200, description = "Appointments, most recent first", body = [AppointmentResponse]),
        (status = 403, description = "Caller may not view that patient"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_appointments(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListAppointmentsQuery>,
) -> Result<Json<Vec<AppointmentResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let rows = match query.patient_id {
        Some(patient_id) => {
            ensure_can_view_patient(&mut conn, &user, patient_id).await?;
            let mut appointments = Appointments::new(&mut conn);
            appointments.list_for_patient(patient_id).await?
        }
        None => {
            let mut appointments = Appointments::new(&mut conn);
            if user.role.is_staff() {
                appointments.list_for_clinician(user.id).await?
            } else {
                appointments.list_for_patient(user.id).await?
            }
        }
    };

    Ok(Json(rows.into_iter().map(AppointmentResponse::from).collect()))
}

/// Appointment detail with notes and services
#[utoipa::path(
    get,
    path = "/appointments/{id}",
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment with its documentation", body = AppointmentDetailResponse),
        (status = 403, description = "Caller may not view this appointment"),
        (status = 404, description = "Appointment not found"),
    )
)]
#[tracing::instrument(skip_all, fields(appointment_id = %id))]
pub async fn get_appointment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<AppointmentId>,
) -> Result<Json<AppointmentDetailResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let appointment = {
        let mut appointments = Appointments::new(&mut conn);
        appointments.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "Appointment".to_string(),
            id: id.to_string(),
        })?
    };

    ensure_can_view_patient(&mut conn, &user, appointment.patient_id).await?;

    let mut appointments = Appointments::new(&mut conn);
    let notes = appointments.list_notes(id).await?;
    let services = appointments.list_services(id).await?;

    Ok(Json(AppointmentDetailResponse {
        appointment: AppointmentResponse::from(appointment),
        notes: notes.into_iter().map(NoteResponse::from).collect(),
        services: services.into_iter().map(ServiceResponse::from).collect(),
    }))
}

/// Transition an appointment out of `scheduled`
///
/// One-way and exactly-once. On `no_show` every active sponsor of the patient
/// gets a `no_show_alert`; on `completed`, a `visit_update`. Fan-out runs
/// after the transition commits and is best-effort.
#[utoipa::path(
    post,
    path = "/appointments/{id}/status",
    request_body = AppointmentStatusUpdate,
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment transitioned", body = AppointmentResponse),
        (status = 400, description = "Target status is not a transition"),
        (status = 403, description = "Not clinical staff"),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Appointment already resolved"),
    )
)]
#[tracing::instrument(skip_all, fields(appointment_id = %id))]
pub async fn update_appointment_status(
    State(state): State<AppState>,
    Staff(_clinician): Staff,
    Path(id): Path<AppointmentId>,
    Json(request): Json<AppointmentStatusUpdate>,
) -> Result<Json<AppointmentResponse>, Error> {
    if request.status == AppointmentStatus::Scheduled {
        return Err(Error::BadRequest {
            message: "Appointments cannot transition back to scheduled".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let updated = {
        let mut appointments = Appointments::new(&mut conn);

        let Some(updated) = appointments.transition(id, request.status).await? else {
            // Distinguish a stale id from an already-resolved appointment
            return Err(match appointments.get_by_id(id).await? {
                None => Error::NotFound {
                    resource: "Appointment".to_string(),
                    id: id.to_string(),
                },
                Some(_) => Error::StateConflict {
                    message: "This appointment was already resolved".to_string(),
                },
            });
        };
        updated
    };
    drop(conn);

    let date_str = updated.scheduled_at.format("%Y-%m-%d").to_string();
    match updated.status {
        AppointmentStatus::NoShow => {
            notify::notify_sponsors_of_patient(
                &state.db,
                updated.patient_id,
                NotificationKind::NoShowAlert,
                "No-show alert",
                &format!("A patient had a scheduled visit on {date_str} and did not show up."),
            )
            .await;
        }
        AppointmentStatus::Completed => {
            notify::notify_sponsors_of_patient(
                &state.db,
                updated.patient_id,
                NotificationKind::VisitUpdate,
                "Visit completed",
                &format!("A scheduled visit on {date_str} was completed. Check the visit summary for details."),
            )
            .await;
        }
        _ => {}
    }

    Ok(Json(AppointmentResponse::from(updated)))
}

/// Reschedule an appointment
///
/// Moves the timestamp only: no status change, no notification.
#[utoipa::path(
    post,
    path = "/appointments/{id}/schedule",
    request_body = AppointmentReschedule,
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment rescheduled", body = AppointmentResponse),
        (status = 403, description = "Not clinical staff"),
        (status = 404, description = "Appointment not found"),
    )
)]
#[tracing::instrument(skip_all, fields(appointment_id = %id))]
pub async fn reschedule_appointment(
    State(state): State<AppState>,
    Staff(_clinician): Staff,
    Path(id): Path<AppointmentId>,
    Json(request): Json<AppointmentReschedule>,
) -> Result<Json<AppointmentResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut appointments = Appointments::new(&mut conn);

    let updated = appointments
        .reschedule(id, request.scheduled_at)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Appointment".to_string(),
            id: id.to_string(),
        })?;

    Ok(Json(AppointmentResponse::from(updated)))
}

/// Append a clinical note to an appointment
#[utoipa::path(
    post,
    path = "/appointments/{id}/notes",
    request_body = NoteCreate,
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment ID")),
    responses(
        (status = 201, description = "Note added", body = NoteResponse),
        (status = 400, description = "Empty note"),
        (status = 403, description = "Not clinical staff"),
        (status = 404, description = "Appointment not found"),
    )
)]
#[tracing::instrument(skip_all, fields(appointment_id = %id))]
pub async fn add_note(
    State(state): State<AppState>,
    Staff(clinician): Staff,
    Path(id): Path<AppointmentId>,
    Json(request): Json<NoteCreate>,
) -> Result<(StatusCode, Json<NoteResponse>), Error> {
    let content = request.content.trim().to_string();
    if content.is_empty() {
        return Err(Error::BadRequest {
            message: "Note content is required".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut appointments = Appointments::new(&mut conn);

    if appointments.get_by_id(id).await?.is_none() {
        return Err(Error::NotFound {
            resource: "Appointment".to_string(),
            id: id.to_string(),
        });
    }

    let note = appointments
        .add_note(&NoteCreateDBRequest {
            appointment_id: id,
            content,
            created_by: clinician.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(NoteResponse::from(note))))
}

/// Record a service performed during an appointment
#[utoipa::path(
    post,
    path = "/appointments/{id}/services",
    request_body = ServiceCreate,
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment ID")),
    responses(
        (status = 201, description = "Service recorded", body = ServiceResponse),
        (status = 403, description = "Not clinical staff"),
        (status = 404, description = "Appointment not found"),
    )
)]
#[tracing::instrument(skip_all, fields(appointment_id = %id))]
pub async fn add_service(
    State(state): State<AppState>,
    Staff(_clinician): Staff,
    Path(id): Path<AppointmentId>,
    Json(request): Json<ServiceCreate>,
) -> Result<(StatusCode, Json<ServiceResponse>), Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut appointments = Appointments::new(&mut conn);

    if appointments.get_by_id(id).await?.is_none() {
        return Err(Error::NotFound {
            resource: "Appointment".to_string(),
            id: id.to_string(),
        });
    }

    let service = appointments
        .add_service(&ServiceCreateDBRequest {
            appointment_id: id,
            service_type: request.service_type,
            details: request.details.as_deref().map(str::trim).filter(|d| !d.is_empty()).map(String::from),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ServiceResponse::from(service))))
}

/// Record a metrics row for a patient
///
/// Every call appends a new row; corrections are new rows, never edits.
#[utoipa::path(
    post,
    path = "/patients/{id}/metrics",
    request_body = MetricCreate,
    tag = "metrics",
    params(("id" = String, Path, description = "Patient ID")),
    responses(
        (status = 201, description = "Metrics recorded", body = MetricResponse),
        (status = 403, description = "Not clinical staff"),
    )
)]
#[tracing::instrument(skip_all, fields(patient_id = %id))]
pub async fn record_metrics(
    State(state): State<AppState>,
    Staff(clinician): Staff,
    Path(id): Path<ProfileId>,
    Json(request): Json<MetricCreate>,
) -> Result<(StatusCode, Json<MetricResponse>), Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut metrics = PatientMetrics::new(&mut conn);

    let row = metrics
        .record(&MetricCreateDBRequest {
            patient_id: id,
            appointment_id: request.appointment_id,
            recorded_by: clinician.id,
            blood_pressure_systolic: request.blood_pressure_systolic,
            blood_pressure_diastolic: request.blood_pressure_diastolic,
            weight_kg: request.weight_kg,
            a1c: request.a1c,
            medication_adherence: request.medication_adherence,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(MetricResponse::from(row))))
}

/// List a patient's metrics, most recent first
#[utoipa::path(
    get,
    path = "/patients/{id}/metrics",
    tag = "metrics",
    params(("id" = String, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Metric rows, newest first", body = [MetricResponse]),
        (status = 403, description = "Caller may not view this patient"),
    )
)]
#[tracing::instrument(skip_all, fields(patient_id = %id))]
pub async fn list_metrics(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ProfileId>,
) -> Result<Json<Vec<MetricResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    ensure_can_view_patient(&mut conn, &user, id).await?;

    let mut metrics = PatientMetrics::new(&mut conn);
    let rows = metrics.list_for_patient(id, 100).await?;

    Ok(Json(rows.into_iter().map(MetricResponse::from).collect()))
}
