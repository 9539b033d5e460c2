//! # echoes: Island Echoes Health backend
//!
//! `echoes` is the backend for Island Echoes Health, a care coordination
//! platform connecting patients, sponsors (family members who pay for care
//! plans), and clinical staff. It provides a JSON API for authentication,
//! role-gated dashboards, care-plan purchase and consent workflows,
//! appointment scheduling, clinical note-taking, and patient metric
//! recording.
//!
//! ## Overview
//!
//! The central object of the platform is the sponsorship: a sponsor purchases
//! a care plan for a patient (identified by email), which opens a pending
//! consent request. Nothing is shared until the patient accepts; acceptance
//! atomically creates an active sponsor-patient link, which is what grants
//! the sponsor visibility into the patient's metrics and schedule and makes
//! them an audience for visit notifications. Clinical staff accounts are
//! provisioned through an admin-reviewed signup queue with license image
//! uploads.
//!
//! ### Workflow state
//!
//! The workflows are deliberately small state machines with one-way, exactly-
//! once transitions, enforced as conditional UPDATEs rather than
//! read-then-write:
//!
//! - clinician signup requests: `pending -> approved | rejected`
//! - consent requests: `pending -> accepted | declined`
//! - appointments: `scheduled -> completed | no_show | cancelled`
//!
//! Multi-row consequences of a transition (the sponsor-patient link on
//! accept, account provisioning on approve) share the transition's
//! transaction. Notifications are the exception: they are best-effort inserts
//! after commit, because they are UI affordances rather than workflow state.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL for all persistence. Requests pass
//! through authentication extractors that resolve the session cookie and
//! re-read the caller's role from the database, then reach handlers that
//! validate input and talk to the database through repository interfaces.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use echoes::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = echoes::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     echoes::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! The application requires a PostgreSQL database and automatically runs
//! migrations on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
//! echoes::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
mod email;
pub mod errors;
mod notify;
mod openapi;
pub mod telemetry;
mod types;
mod uploads;

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
mod test;

use crate::api::models::profiles::Role;
use crate::db::handlers::{Profiles, Repository};
use crate::db::models::profiles::ProfileCreateDBRequest;
use crate::openapi::ApiDoc;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use bon::Builder;
pub use config::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{AppointmentId, CarePlanId, ConsentRequestId, NotificationId, ProfileId, SignupRequestId, SponsorLinkId};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `db`: PostgreSQL connection pool
/// - `config`: Application configuration loaded from file/environment
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the echoes database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: called on every startup so a fresh deployment always has an
/// admin account. Returns the admin's profile ID.
#[instrument(skip(password, db))]
pub async fn create_initial_admin_user(email: &str, password: Option<&str>, db: &PgPool) -> anyhow::Result<ProfileId> {
    let email = email.trim().to_lowercase();

    let password_hash = match password {
        Some(password) => {
            let password = password.to_string();
            Some(tokio::task::spawn_blocking(move || auth::password::hash_string(&password)).await??)
        }
        None => None,
    };

    let mut conn = db.acquire().await?;
    let mut profiles = Profiles::new(&mut conn);

    if let Some(existing) = profiles.get_by_email(&email).await? {
        return Ok(existing.id);
    }

    let created = profiles
        .create(&ProfileCreateDBRequest {
            email: email.clone(),
            password_hash,
            role: Role::Admin,
            full_name: None,
            avatar_url: None,
            date_of_birth: None,
        })
        .await?;

    info!(email = %email, "Created initial admin user");
    Ok(created.id)
}

/// Create the CORS layer from config.
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors = &config.auth.security.cors;
    if cors.allowed_origins.is_empty() {
        return Ok(CorsLayer::new());
    }

    let origins = cors
        .allowed_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;

    let mut layer = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::AllowMethods::mirror_request())
        .allow_headers(tower_http::cors::AllowHeaders::mirror_request());

    if cors.allow_credentials {
        layer = layer.allow_credentials(true);
    }

    Ok(layer)
}

/// Build the application router.
pub fn create_router(state: AppState) -> anyhow::Result<Router> {
    // Our own per-chunk size check should be the limit that fires, not axum's
    // default body cap
    let body_limit = (state.config.uploads.max_file_size as usize).saturating_mul(2);

    let api_routes = Router::new()
        .route("/auth/register", post(api::handlers::auth::register))
        .route("/auth/login", post(api::handlers::auth::login))
        .route("/auth/signout", post(api::handlers::auth::signout))
        .route("/auth/password-resets", post(api::handlers::auth::request_password_reset))
        .route(
            "/auth/password-resets/{token_id}/confirm",
            post(api::handlers::auth::confirm_password_reset),
        )
        .route("/profiles/me", get(api::handlers::profiles::get_me))
        .route("/profiles/me", patch(api::handlers::profiles::update_me))
        .route("/care-plans", get(api::handlers::care_plans::list_care_plans))
        .route("/clinician-requests", post(api::handlers::clinician_requests::submit_request))
        .route("/clinician-requests", get(api::handlers::clinician_requests::list_requests))
        .route(
            "/clinician-requests/{id}/approve",
            post(api::handlers::clinician_requests::approve_request),
        )
        .route(
            "/clinician-requests/{id}/reject",
            post(api::handlers::clinician_requests::reject_request),
        )
        .route("/sponsorships", post(api::handlers::sponsorships::purchase_plan))
        .route("/sponsorships", get(api::handlers::sponsorships::list_sponsorships))
        .route("/sponsorships/{id}/accept", post(api::handlers::sponsorships::accept_consent))
        .route("/sponsorships/{id}/decline", post(api::handlers::sponsorships::decline_consent))
        .route("/sponsorships/links/{id}/end", post(api::handlers::sponsorships::end_link))
        .route("/appointments", post(api::handlers::appointments::create_appointment))
        .route("/appointments", get(api::handlers::appointments::list_appointments))
        .route("/appointments/{id}", get(api::handlers::appointments::get_appointment))
        .route("/appointments/{id}/status", post(api::handlers::appointments::update_appointment_status))
        .route(
            "/appointments/{id}/schedule",
            post(api::handlers::appointments::reschedule_appointment),
        )
        .route("/appointments/{id}/notes", post(api::handlers::appointments::add_note))
        .route("/appointments/{id}/services", post(api::handlers::appointments::add_service))
        .route("/patients/{id}/metrics", post(api::handlers::appointments::record_metrics))
        .route("/patients/{id}/metrics", get(api::handlers::appointments::list_metrics))
        .route("/notifications", get(api::handlers::notifications::list_notifications))
        .route("/notifications", delete(api::handlers::notifications::clear_notifications))
        .route(
            "/notifications/{id}/read",
            post(api::handlers::notifications::mark_notification_read),
        )
        .route("/overview", get(api::handlers::overview::get_overview))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(create_cors_layer(&state.config)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// The assembled application: a bound listener plus the router.
pub struct Application {
    router: Router,
    listener: TcpListener,
}

impl Application {
    /// Connect to the database, run migrations, seed the initial admin, and
    /// bind the HTTP listener.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_pool.max_connections)
            .min_connections(config.database_pool.min_connections)
            .acquire_timeout(Duration::from_secs(config.database_pool.acquire_timeout_secs))
            .connect(&config.database_url)
            .await?;

        Self::with_pool(config, pool).await
    }

    /// Like [`Application::new`] but with an externally-constructed pool.
    pub async fn with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        migrator().run(&pool).await?;

        create_initial_admin_user(&config.admin_email, config.admin_password.as_deref(), &pool).await?;

        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr).await?;
        info!(addr = %addr, "Island Echoes Health backend listening");

        let state = AppState::builder().db(pool).config(config).build();
        let router = create_router(state)?;

        Ok(Self { router, listener })
    }

    /// Run until the shutdown future resolves.
    pub async fn serve(self, shutdown: impl std::future::Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}
