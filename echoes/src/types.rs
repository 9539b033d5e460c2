//! Common type definitions.
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety:
//!
//! - [`ProfileId`]: Account/profile identifier (patients, sponsors, staff)
//! - [`CarePlanId`]: Care plan catalog entry identifier
//! - [`ConsentRequestId`]: Sponsorship consent request identifier
//! - [`SponsorLinkId`]: Active sponsor-patient plan link identifier
//! - [`AppointmentId`]: Appointment identifier
//! - [`SignupRequestId`]: Clinician signup request identifier
//! - [`NotificationId`]: Notification row identifier

use uuid::Uuid;

pub type ProfileId = Uuid;
pub type CarePlanId = Uuid;
pub type ConsentRequestId = Uuid;
pub type SponsorLinkId = Uuid;
pub type AppointmentId = Uuid;
pub type SignupRequestId = Uuid;
pub type NotificationId = Uuid;
pub type MetricId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}
