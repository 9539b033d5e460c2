//! API request handlers.
//!
//! One module per resource. Handlers authenticate via the extractors in
//! [`crate::auth::current_user`], validate input before any write, and talk
//! to the database through the repositories in [`crate::db::handlers`].

pub mod appointments;
pub mod auth;
pub mod care_plans;
pub mod clinician_requests;
pub mod notifications;
pub mod overview;
pub mod profiles;
pub mod sponsorships;
