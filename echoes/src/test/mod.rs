//! End-to-end workflow tests against the full router.

mod auth_flow;
mod workflows;
