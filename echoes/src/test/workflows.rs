use axum_test::TestServer;
use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::PgPool;

use crate::api::models::profiles::Role;
use crate::test_utils::{create_test_app, logged_in_server, seed_profile};

async fn chronic_care_plan_id(server: &TestServer) -> String {
    let plans: Vec<serde_json::Value> = server.get("/api/v1/care-plans").await.json();
    plans
        .iter()
        .find(|p| p["slug"] == "chronic-care")
        .expect("chronic-care plan should be seeded")["id"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Sponsor purchases a plan for the patient's email; returns the consent
/// request id.
async fn purchase(sponsor: &TestServer, patient_email: &str, plan_id: &str) -> String {
    let response = sponsor
        .post("/api/v1/sponsorships")
        .json(&json!({ "patient_email": patient_email, "care_plan_id": plan_id }))
        .await;
    assert_eq!(response.status_code(), 201, "purchase failed: {}", response.text());
    let body: serde_json::Value = response.json();
    body["id"].as_str().unwrap().to_string()
}

#[sqlx::test]
#[test_log::test]
async fn test_sponsorship_purchase_accept_flow(pool: PgPool) {
    let sponsor = logged_in_server(&pool, "sponsor@example.com", Role::User).await;
    let patient = logged_in_server(&pool, "patient@example.com", Role::User).await;

    let plan_id = chronic_care_plan_id(&sponsor).await;
    let consent_id = purchase(&sponsor, "patient@example.com", &plan_id).await;

    // The request was matched to the existing patient account and the
    // patient got exactly one consent_request notification referencing it
    let sponsorships: serde_json::Value = patient.get("/api/v1/sponsorships").await.json();
    let received = sponsorships["received_requests"].as_array().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["status"], "pending");
    assert!(received[0]["patient_id"].is_string());

    let notifications: Vec<serde_json::Value> = patient.get("/api/v1/notifications").await.json();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["kind"], "consent_request");
    assert_eq!(notifications[0]["reference_id"], consent_id.as_str());
    assert!(notifications[0]["title"].as_str().unwrap().contains("wants to sponsor your care"));
    assert!(notifications[0]["body"].as_str().unwrap().contains("Chronic Care"));

    // Patient accepts: the request flips and exactly one active link appears
    let response = patient.post(&format!("/api/v1/sponsorships/{consent_id}/accept")).await;
    assert_eq!(response.status_code(), 200);
    let accepted: serde_json::Value = response.json();
    assert_eq!(accepted["status"], "accepted");
    assert!(accepted["responded_at"].is_string());

    let sponsorships: serde_json::Value = sponsor.get("/api/v1/sponsorships").await.json();
    let links = sponsorships["links_as_sponsor"].as_array().unwrap();
    assert_eq!(links.len(), 1);
    assert!(links[0]["ended_at"].is_null());

    // Sponsor got exactly one sponsorship_accepted notification
    let notifications: Vec<serde_json::Value> = sponsor.get("/api/v1/notifications").await.json();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["kind"], "sponsorship_accepted");

    // Terminal: accepting or declining again conflicts, and no second link
    let response = patient.post(&format!("/api/v1/sponsorships/{consent_id}/accept")).await;
    assert_eq!(response.status_code(), 409);
    let response = patient
        .post(&format!("/api/v1/sponsorships/{consent_id}/decline"))
        .json(&json!({ "reason": "too late" }))
        .await;
    assert_eq!(response.status_code(), 409);

    let sponsorships: serde_json::Value = sponsor.get("/api/v1/sponsorships").await.json();
    assert_eq!(sponsorships["links_as_sponsor"].as_array().unwrap().len(), 1);
}

#[sqlx::test]
#[test_log::test]
async fn test_consent_response_requires_named_patient(pool: PgPool) {
    let sponsor = logged_in_server(&pool, "sponsor@example.com", Role::User).await;
    seed_profile(&pool, "patient@example.com", Role::User, "correct horse battery").await;
    let bystander = logged_in_server(&pool, "bystander@example.com", Role::User).await;

    let plan_id = chronic_care_plan_id(&sponsor).await;
    let consent_id = purchase(&sponsor, "patient@example.com", &plan_id).await;

    // Anyone other than the named patient gets an authorization error,
    // regardless of request state - including the sponsor themself
    let response = bystander.post(&format!("/api/v1/sponsorships/{consent_id}/accept")).await;
    assert_eq!(response.status_code(), 403);
    let response = sponsor.post(&format!("/api/v1/sponsorships/{consent_id}/accept")).await;
    assert_eq!(response.status_code(), 403);
    let response = bystander
        .post(&format!("/api/v1/sponsorships/{consent_id}/decline"))
        .json(&json!({ "reason": null }))
        .await;
    assert_eq!(response.status_code(), 403);
}

#[sqlx::test]
#[test_log::test]
async fn test_decline_records_reason(pool: PgPool) {
    let sponsor = logged_in_server(&pool, "sponsor@example.com", Role::User).await;
    let patient = logged_in_server(&pool, "patient@example.com", Role::User).await;

    let plan_id = chronic_care_plan_id(&sponsor).await;
    let consent_id = purchase(&sponsor, "patient@example.com", &plan_id).await;

    let response = patient
        .post(&format!("/api/v1/sponsorships/{consent_id}/decline"))
        .json(&json!({ "reason": "  prefer to pay myself  " }))
        .await;
    assert_eq!(response.status_code(), 200);
    let declined: serde_json::Value = response.json();
    assert_eq!(declined["status"], "declined");
    assert_eq!(declined["decline_reason"], "prefer to pay myself");

    // No link was created
    let sponsorships: serde_json::Value = sponsor.get("/api/v1/sponsorships").await.json();
    assert!(sponsorships["links_as_sponsor"].as_array().unwrap().is_empty());
}

#[sqlx::test]
#[test_log::test]
async fn test_purchase_for_unknown_email_creates_unmatched_request(pool: PgPool) {
    let sponsor = logged_in_server(&pool, "sponsor@example.com", Role::User).await;
    let plan_id = chronic_care_plan_id(&sponsor).await;

    let response = sponsor
        .post("/api/v1/sponsorships")
        .json(&json!({ "patient_email": "NotYet@Example.com", "care_plan_id": plan_id }))
        .await;
    assert_eq!(response.status_code(), 201);
    let body: serde_json::Value = response.json();
    assert_eq!(body["patient_email"], "notyet@example.com");
    assert!(body["patient_id"].is_null());
    assert!(body["payment_simulated_at"].is_string());

    // Invalid plan and empty email are rejected before any write
    let response = sponsor
        .post("/api/v1/sponsorships")
        .json(&json!({ "patient_email": "x@example.com", "care_plan_id": uuid::Uuid::new_v4() }))
        .await;
    assert_eq!(response.status_code(), 400);
    let response = sponsor
        .post("/api/v1/sponsorships")
        .json(&json!({ "patient_email": "   ", "care_plan_id": plan_id }))
        .await;
    assert_eq!(response.status_code(), 400);
}

/// Full scenario from the appointment side: a no-show fans out exactly one
/// alert per active sponsor and none to ended links.
#[sqlx::test]
#[test_log::test]
async fn test_no_show_fanout_to_active_sponsors(pool: PgPool) {
    let patient = logged_in_server(&pool, "patient@example.com", Role::User).await;
    let clinician = logged_in_server(&pool, "doc@example.com", Role::Clinician).await;

    let first_sponsor = logged_in_server(&pool, "first-sponsor@example.com", Role::User).await;
    let second_sponsor = logged_in_server(&pool, "second-sponsor@example.com", Role::User).await;
    let former_sponsor = logged_in_server(&pool, "former-sponsor@example.com", Role::User).await;

    let plan_id = chronic_care_plan_id(&patient).await;
    for sponsor in [&first_sponsor, &second_sponsor, &former_sponsor] {
        let consent_id = purchase(sponsor, "patient@example.com", &plan_id).await;
        let response = patient.post(&format!("/api/v1/sponsorships/{consent_id}/accept")).await;
        assert_eq!(response.status_code(), 200);
    }

    // The former sponsor's link is ended before the visit
    let sponsorships: serde_json::Value = former_sponsor.get("/api/v1/sponsorships").await.json();
    let link_id = sponsorships["links_as_sponsor"][0]["id"].as_str().unwrap().to_string();
    let response = former_sponsor.post(&format!("/api/v1/sponsorships/links/{link_id}/end")).await;
    assert_eq!(response.status_code(), 200);

    // Clinician schedules and then records a no-show
    let patient_id = {
        let me: serde_json::Value = patient.get("/api/v1/profiles/me").await.json();
        me["id"].as_str().unwrap().to_string()
    };
    let response = clinician
        .post("/api/v1/appointments")
        .json(&json!({ "patient_id": patient_id, "scheduled_at": Utc::now() + Duration::days(1) }))
        .await;
    assert_eq!(response.status_code(), 201);
    let appointment_id = response.json::<serde_json::Value>()["id"].as_str().unwrap().to_string();

    let response = clinician
        .post(&format!("/api/v1/appointments/{appointment_id}/status"))
        .json(&json!({ "status": "no_show" }))
        .await;
    assert_eq!(response.status_code(), 200);

    // Exactly one no_show_alert per active sponsor (they also each hold one
    // earlier sponsorship_accepted notification)
    for sponsor in [&first_sponsor, &second_sponsor] {
        let notifications: Vec<serde_json::Value> = sponsor.get("/api/v1/notifications").await.json();
        let alerts: Vec<_> = notifications.iter().filter(|n| n["kind"] == "no_show_alert").collect();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0]["body"].as_str().unwrap().contains("did not show up"));
    }

    // The ended link got nothing
    let notifications: Vec<serde_json::Value> = former_sponsor.get("/api/v1/notifications").await.json();
    assert!(notifications.iter().all(|n| n["kind"] != "no_show_alert"));

    // The transition was terminal
    let response = clinician
        .post(&format!("/api/v1/appointments/{appointment_id}/status"))
        .json(&json!({ "status": "completed" }))
        .await;
    assert_eq!(response.status_code(), 409);
}

#[sqlx::test]
#[test_log::test]
async fn test_completed_visit_notifies_sponsors(pool: PgPool) {
    let patient = logged_in_server(&pool, "patient@example.com", Role::User).await;
    let clinician = logged_in_server(&pool, "doc@example.com", Role::Clinician).await;
    let sponsor = logged_in_server(&pool, "sponsor@example.com", Role::User).await;

    let plan_id = chronic_care_plan_id(&patient).await;
    let consent_id = purchase(&sponsor, "patient@example.com", &plan_id).await;
    patient.post(&format!("/api/v1/sponsorships/{consent_id}/accept")).await;

    let patient_id = patient.get("/api/v1/profiles/me").await.json::<serde_json::Value>()["id"]
        .as_str()
        .unwrap()
        .to_string();
    let response = clinician
        .post("/api/v1/appointments")
        .json(&json!({ "patient_id": patient_id, "scheduled_at": Utc::now() + Duration::hours(2) }))
        .await;
    let appointment_id = response.json::<serde_json::Value>()["id"].as_str().unwrap().to_string();

    // Reschedule first: no status change, no notification
    let response = clinician
        .post(&format!("/api/v1/appointments/{appointment_id}/schedule"))
        .json(&json!({ "scheduled_at": Utc::now() + Duration::days(3) }))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<serde_json::Value>()["status"], "scheduled");

    let notifications: Vec<serde_json::Value> = sponsor.get("/api/v1/notifications").await.json();
    assert!(notifications.iter().all(|n| n["kind"] != "visit_update"));

    // Completing the visit produces exactly one visit_update
    let response = clinician
        .post(&format!("/api/v1/appointments/{appointment_id}/status"))
        .json(&json!({ "status": "completed" }))
        .await;
    assert_eq!(response.status_code(), 200);

    let notifications: Vec<serde_json::Value> = sponsor.get("/api/v1/notifications").await.json();
    let updates: Vec<_> = notifications.iter().filter(|n| n["kind"] == "visit_update").collect();
    assert_eq!(updates.len(), 1);
    assert!(updates[0]["body"].as_str().unwrap().contains("was completed"));
}

#[sqlx::test]
#[test_log::test]
async fn test_appointment_actions_are_staff_gated(pool: PgPool) {
    let patient = logged_in_server(&pool, "patient@example.com", Role::User).await;
    let patient_id = patient.get("/api/v1/profiles/me").await.json::<serde_json::Value>()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // A patient cannot schedule, transition, or go back to scheduled
    let response = patient
        .post("/api/v1/appointments")
        .json(&json!({ "patient_id": patient_id, "scheduled_at": Utc::now() }))
        .await;
    assert_eq!(response.status_code(), 403);

    let clinician = logged_in_server(&pool, "doc@example.com", Role::Clinician).await;
    let response = clinician
        .post("/api/v1/appointments")
        .json(&json!({ "patient_id": patient_id, "scheduled_at": Utc::now() + Duration::days(1) }))
        .await;
    assert_eq!(response.status_code(), 201);
    let appointment_id = response.json::<serde_json::Value>()["id"].as_str().unwrap().to_string();

    let response = patient
        .post(&format!("/api/v1/appointments/{appointment_id}/status"))
        .json(&json!({ "status": "cancelled" }))
        .await;
    assert_eq!(response.status_code(), 403);

    // `scheduled` is not a transition target even for staff
    let response = clinician
        .post(&format!("/api/v1/appointments/{appointment_id}/status"))
        .json(&json!({ "status": "scheduled" }))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[sqlx::test]
#[test_log::test]
async fn test_clinical_documentation_and_metrics_access(pool: PgPool) {
    let patient = logged_in_server(&pool, "patient@example.com", Role::User).await;
    let clinician = logged_in_server(&pool, "doc@example.com", Role::Clinician).await;
    let sponsor = logged_in_server(&pool, "sponsor@example.com", Role::User).await;
    let bystander = logged_in_server(&pool, "bystander@example.com", Role::User).await;

    let plan_id = chronic_care_plan_id(&patient).await;
    let consent_id = purchase(&sponsor, "patient@example.com", &plan_id).await;
    patient.post(&format!("/api/v1/sponsorships/{consent_id}/accept")).await;

    let patient_id = patient.get("/api/v1/profiles/me").await.json::<serde_json::Value>()["id"]
        .as_str()
        .unwrap()
        .to_string();
    let response = clinician
        .post("/api/v1/appointments")
        .json(&json!({ "patient_id": patient_id, "scheduled_at": Utc::now() }))
        .await;
    let appointment_id = response.json::<serde_json::Value>()["id"].as_str().unwrap().to_string();

    // Notes: staff-only, trimmed, appended in order
    let response = patient
        .post(&format!("/api/v1/appointments/{appointment_id}/notes"))
        .json(&json!({ "content": "patient-written note" }))
        .await;
    assert_eq!(response.status_code(), 403);

    let response = clinician
        .post(&format!("/api/v1/appointments/{appointment_id}/notes"))
        .json(&json!({ "content": "  BP stable, continue current meds  " }))
        .await;
    assert_eq!(response.status_code(), 201);
    assert_eq!(response.json::<serde_json::Value>()["content"], "BP stable, continue current meds");

    let response = clinician
        .post(&format!("/api/v1/appointments/{appointment_id}/notes"))
        .json(&json!({ "content": "   " }))
        .await;
    assert_eq!(response.status_code(), 400);

    // Services: closed enum, invalid values rejected at deserialization
    let response = clinician
        .post(&format!("/api/v1/appointments/{appointment_id}/services"))
        .json(&json!({ "service_type": "chronic_lab", "details": "A1C panel" }))
        .await;
    assert_eq!(response.status_code(), 201);

    let response = clinician
        .post(&format!("/api/v1/appointments/{appointment_id}/services"))
        .json(&json!({ "service_type": "massage" }))
        .await;
    assert!(response.status_code().is_client_error());

    // Metrics: staff-recorded, visible to patient, sponsor with active link,
    // and staff; hidden from everyone else
    let response = clinician
        .post(&format!("/api/v1/patients/{patient_id}/metrics"))
        .json(&json!({
            "appointment_id": appointment_id,
            "blood_pressure_systolic": 128,
            "blood_pressure_diastolic": 82,
            "medication_adherence": "good"
        }))
        .await;
    assert_eq!(response.status_code(), 201);

    let response = clinician
        .post(&format!("/api/v1/patients/{patient_id}/metrics"))
        .json(&json!({ "weight_kg": 74.2 }))
        .await;
    assert_eq!(response.status_code(), 201);

    for (server, expected) in [(&patient, 200), (&sponsor, 200), (&clinician, 200), (&bystander, 403)] {
        let response = server.get(&format!("/api/v1/patients/{patient_id}/metrics")).await;
        assert_eq!(response.status_code(), expected);
    }

    // Newest first; nullable fields stay independent per row
    let metrics: Vec<serde_json::Value> = sponsor.get(&format!("/api/v1/patients/{patient_id}/metrics")).await.json();
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0]["weight_kg"], 74.2);
    assert!(metrics[0]["blood_pressure_systolic"].is_null());
    assert_eq!(metrics[1]["blood_pressure_systolic"], 128);

    // The appointment detail shows the documentation trail
    let detail: serde_json::Value = clinician.get(&format!("/api/v1/appointments/{appointment_id}")).await.json();
    assert_eq!(detail["notes"].as_array().unwrap().len(), 1);
    assert_eq!(detail["services"].as_array().unwrap().len(), 1);
    // The bystander cannot see it
    let response = bystander.get(&format!("/api/v1/appointments/{appointment_id}")).await;
    assert_eq!(response.status_code(), 403);
}

#[sqlx::test]
#[test_log::test]
async fn test_overview_shapes_by_role(pool: PgPool) {
    let patient = logged_in_server(&pool, "patient@example.com", Role::User).await;
    let sponsor = logged_in_server(&pool, "sponsor@example.com", Role::User).await;
    let admin = logged_in_server(&pool, "admin@example.com", Role::Admin).await;

    let plan_id = chronic_care_plan_id(&patient).await;
    let consent_id = purchase(&sponsor, "patient@example.com", &plan_id).await;

    // Patient sees the pending consent and the catalog
    let overview: serde_json::Value = patient.get("/api/v1/overview").await.json();
    assert_eq!(overview["view"], "patient");
    assert_eq!(overview["pending_consents"].as_array().unwrap().len(), 1);
    assert_eq!(overview["care_plans"].as_array().unwrap().len(), 3);
    assert_eq!(overview["unread_notifications"], 1);

    patient.post(&format!("/api/v1/sponsorships/{consent_id}/accept")).await;

    // Sponsor sees the sponsored patient card with the plan name
    let overview: serde_json::Value = sponsor.get("/api/v1/overview").await.json();
    assert_eq!(overview["view"], "patient");
    let cards = overview["sponsored_patients"].as_array().unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0]["care_plan_name"], "Chronic Care");

    // Admin gets the staff view with the roster and pending signup count
    let overview: serde_json::Value = admin.get("/api/v1/overview").await.json();
    assert_eq!(overview["view"], "staff");
    assert_eq!(overview["patients"].as_array().unwrap().len(), 1);
    assert_eq!(overview["pending_signup_requests"], 0);
}
