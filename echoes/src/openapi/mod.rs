//! OpenAPI documentation for the management API at `/api/v1/*`.

use utoipa::OpenApi;

use crate::api::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Island Echoes Health API",
        description = "Care coordination platform connecting patients, sponsors, and clinical staff."
    ),
    servers((url = "/api/v1")),
    paths(
        crate::api::handlers::auth::register,
        crate::api::handlers::auth::login,
        crate::api::handlers::auth::signout,
        crate::api::handlers::auth::request_password_reset,
        crate::api::handlers::auth::confirm_password_reset,
        crate::api::handlers::profiles::get_me,
        crate::api::handlers::profiles::update_me,
        crate::api::handlers::care_plans::list_care_plans,
        crate::api::handlers::clinician_requests::submit_request,
        crate::api::handlers::clinician_requests::list_requests,
        crate::api::handlers::clinician_requests::approve_request,
        crate::api::handlers::clinician_requests::reject_request,
        crate::api::handlers::sponsorships::purchase_plan,
        crate::api::handlers::sponsorships::accept_consent,
        crate::api::handlers::sponsorships::decline_consent,
        crate::api::handlers::sponsorships::list_sponsorships,
        crate::api::handlers::sponsorships::end_link,
        crate::api::handlers::appointments::create_appointment,
        crate::api::handlers::appointments::list_appointments,
        crate::api::handlers::appointments::get_appointment,
        crate::api::handlers::appointments::update_appointment_status,
        crate::api::handlers::appointments::reschedule_appointment,
        crate::api::handlers::appointments::add_note,
        crate::api::handlers::appointments::add_service,
        crate::api::handlers::appointments::record_metrics,
        crate::api::handlers::appointments::list_metrics,
        crate::api::handlers::notifications::list_notifications,
        crate::api::handlers::notifications::mark_notification_read,
        crate::api::handlers::notifications::clear_notifications,
        crate::api::handlers::overview::get_overview,
    ),
    components(schemas(
        models::profiles::Role,
        models::profiles::ProfileResponse,
        models::profiles::ProfileUpdate,
        models::auth::RegisterRequest,
        models::auth::LoginRequest,
        models::auth::AuthResponse,
        models::auth::SignoutRequest,
        models::auth::PasswordResetRequest,
        models::auth::PasswordResetConfirmRequest,
        models::auth::PasswordResetResponse,
        models::care_plans::CarePlanResponse,
        models::clinician_requests::SignupStatus,
        models::clinician_requests::SignupRequestResponse,
        models::sponsorships::ConsentStatus,
        models::sponsorships::PurchaseRequest,
        models::sponsorships::DeclineRequest,
        models::sponsorships::ConsentRequestResponse,
        models::sponsorships::SponsorLinkResponse,
        models::sponsorships::SponsorshipsResponse,
        models::appointments::AppointmentStatus,
        models::appointments::ServiceType,
        models::appointments::AppointmentCreate,
        models::appointments::AppointmentStatusUpdate,
        models::appointments::AppointmentReschedule,
        models::appointments::AppointmentResponse,
        models::appointments::NoteCreate,
        models::appointments::NoteResponse,
        models::appointments::ServiceCreate,
        models::appointments::ServiceResponse,
        models::appointments::AppointmentDetailResponse,
        models::metrics::MedicationAdherence,
        models::metrics::MetricCreate,
        models::metrics::MetricResponse,
        models::notifications::NotificationKind,
        models::notifications::NotificationResponse,
        models::notifications::ClearedResponse,
        models::overview::SponsoredPatientSummary,
        models::overview::PatientOverview,
        models::overview::StaffOverview,
        models::overview::OverviewResponse,
    ))
)]
pub struct ApiDoc;
