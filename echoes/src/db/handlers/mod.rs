//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction and provides
//! strongly-typed operations for one table. [`Profiles`] implements the
//! generic [`Repository`] trait (it has genuine full CRUD); the workflow
//! tables expose purpose-built methods instead, because their lifecycles are
//! conditional transitions rather than free-form updates.
//!
//! # Common Pattern
//!
//! ```ignore
//! use echoes::db::handlers::{Profiles, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Profiles::new(&mut tx);
//!     // ... operations ...
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```
//!
//! Multi-row mutations (accepting a consent request, approving a clinician)
//! always run inside one transaction so either every row lands or none do.

pub mod appointments;
pub mod care_plans;
pub mod clinician_requests;
pub mod metrics;
pub mod notifications;
pub mod password_reset_tokens;
pub mod profiles;
pub mod repository;
pub mod sponsorships;

pub use appointments::Appointments;
pub use care_plans::CarePlans;
pub use clinician_requests::SignupRequests;
pub use metrics::PatientMetrics;
pub use notifications::Notifications;
pub use password_reset_tokens::PasswordResetTokens;
pub use profiles::Profiles;
pub use repository::Repository;
pub use sponsorships::{ConsentRequests, SponsorLinks};
