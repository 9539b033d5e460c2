use std::collections::HashMap;

use axum::{extract::State, Json};
use sqlx::PgConnection;

use crate::{
    api::models::appointments::AppointmentResponse,
    api::models::care_plans::CarePlanResponse,
    api::models::overview::{OverviewResponse, PatientOverview, SponsoredPatientSummary, StaffOverview},
    api::models::profiles::{CurrentUser, Role},
    api::models::sponsorships::ConsentRequestResponse,
    db::handlers::{Appointments, CarePlans, ConsentRequests, Notifications, Profiles, Repository, SignupRequests, SponsorLinks},
    db::models::sponsorships::SponsorLinkDBResponse,
    errors::Error,
    types::ProfileId,
    AppState,
};

/// Resolve active links into dashboard cards: patient name, plan name, and
/// next upcoming visit.
async fn summarize_links(conn: &mut PgConnection, links: Vec<SponsorLinkDBResponse>) -> Result<Vec<SponsoredPatientSummary>, Error> {
    if links.is_empty() {
        return Ok(Vec::new());
    }

    let patient_ids: Vec<ProfileId> = {
        let mut seen = std::collections::HashSet::new();
        links.iter().map(|l| l.patient_id).filter(|id| seen.insert(*id)).collect()
    };

    let names = {
        let mut profiles = Profiles::new(&mut *conn);
        profiles.get_bulk(patient_ids.clone()).await?
    };

    let plan_names: HashMap<_, _> = {
        let mut plans = CarePlans::new(&mut *conn);
        plans.list().await?.into_iter().map(|p| (p.id, p.name)).collect()
    };

    let next_by_patient: HashMap<_, _> = {
        let mut appointments = Appointments::new(&mut *conn);
        appointments
            .next_scheduled_for(&patient_ids)
            .await?
            .into_iter()
            .map(|row| (row.patient_id, row.scheduled_at))
            .collect()
    };

    Ok(links
        .into_iter()
        .map(|link| SponsoredPatientSummary {
            link_id: link.id,
            patient_id: link.patient_id,
            patient_name: names.get(&link.patient_id).and_then(|p| p.full_name.clone()),
            care_plan_name: plan_names.get(&link.care_plan_id).cloned().unwrap_or_default(),
            next_appointment: next_by_patient.get(&link.patient_id).copied(),
        })
        .collect())
}

/// Role-shaped dashboard aggregate
///
/// Patients (and sponsors, which are patient-role accounts) get their pending
/// consent requests, sponsored patients, upcoming visits, unread notification
/// count, and the catalog. Staff get the roster of patients under active
/// plans plus their own schedule; admins additionally get the pending
/// signup-request count.
#[utoipa::path(
    get,
    path = "/overview",
    tag = "overview",
    responses(
        (status = 200, description = "Dashboard data for the caller's role", body = OverviewResponse),
        (status = 401, description = "Not signed in"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_overview(State(state): State<AppState>, user: CurrentUser) -> Result<Json<OverviewResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if user.role.is_staff() {
        let links = {
            let mut links = SponsorLinks::new(&mut conn);
            links.list_active().await?
        };
        let patients = summarize_links(&mut conn, links).await?;

        let upcoming = {
            let mut appointments = Appointments::new(&mut conn);
            appointments.upcoming_for_clinician(user.id).await?
        };

        let pending_signup_requests = if user.role == Role::Admin {
            let mut requests = SignupRequests::new(&mut conn);
            Some(requests.count_pending().await?)
        } else {
            None
        };

        return Ok(Json(OverviewResponse::Staff(StaffOverview {
            patients,
            upcoming_appointments: upcoming.into_iter().map(AppointmentResponse::from).collect(),
            pending_signup_requests,
        })));
    }

    let pending_consents = {
        let mut consents = ConsentRequests::new(&mut conn);
        consents.list_pending_for_patient(user.id).await?
    };

    let sponsor_links = {
        let mut links = SponsorLinks::new(&mut conn);
        links.list_active_for_sponsor(user.id).await?
    };
    let sponsored_patients = summarize_links(&mut conn, sponsor_links).await?;

    let upcoming = {
        let mut appointments = Appointments::new(&mut conn);
        appointments.upcoming_for_patient(user.id).await?
    };

    let unread_notifications = {
        let mut notifications = Notifications::new(&mut conn);
        notifications.unread_count(user.id).await?
    };

    let care_plans = {
        let mut plans = CarePlans::new(&mut conn);
        plans.list().await?
    };

    Ok(Json(OverviewResponse::Patient(PatientOverview {
        pending_consents: pending_consents.into_iter().map(ConsentRequestResponse::from).collect(),
        sponsored_patients,
        upcoming_appointments: upcoming.into_iter().map(AppointmentResponse::from).collect(),
        unread_notifications,
        care_plans: care_plans.into_iter().map(CarePlanResponse::from).collect(),
    })))
}
