//! Authentication and authorization.
//!
//! # Authentication
//!
//! Browser-style session authentication: users log in with email/password at
//! `/api/v1/auth/login` and receive a JWT in a secure, HTTP-only cookie. The
//! token proves identity only; authorization state is never cached in it.
//!
//! # Authorization
//!
//! Every protected handler re-reads the caller's role from the `profiles`
//! table via the extractors in [`current_user`]:
//!
//! - `CurrentUser`: any signed-in account
//! - `Staff`: clinicians and admins
//! - `Admin`: admins only
//!
//! Checks against specific rows (the named patient of a consent request, a
//! sponsor's active link to a patient) happen in the handlers, after the role
//! gate.
//!
//! # Modules
//!
//! - [`current_user`]: Extractors for getting the authenticated user in handlers
//! - [`password`]: Password hashing and verification using Argon2
//! - [`session`]: JWT session token creation and verification

pub mod current_user;
pub mod password;
pub mod session;
