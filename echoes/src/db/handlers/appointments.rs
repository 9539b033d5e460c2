//! Database repository for appointments and their documentation trail.

use crate::api::models::appointments::AppointmentStatus;
use crate::db::{
    errors::Result,
    models::appointments::{
        AppointmentCreateDBRequest, AppointmentDBResponse, NextAppointmentRow, NoteCreateDBRequest, NoteDBResponse,
        ServiceCreateDBRequest, ServiceDBResponse,
    },
};
use crate::types::{abbrev_uuid, AppointmentId, ProfileId};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

pub struct Appointments<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Appointments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(patient = %abbrev_uuid(&request.patient_id)), err)]
    pub async fn create(&mut self, request: &AppointmentCreateDBRequest) -> Result<AppointmentDBResponse> {
        let row = sqlx::query_as::<_, AppointmentDBResponse>(
            r#"
            INSERT INTO appointments (id, patient_id, clinician_id, scheduled_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.patient_id)
        .bind(request.clinician_id)
        .bind(request.scheduled_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row)
    }

    #[instrument(skip(self), fields(appointment_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: AppointmentId) -> Result<Option<AppointmentDBResponse>> {
        let row = sqlx::query_as::<_, AppointmentDBResponse>("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(row)
    }

    /// One-way transition out of `scheduled`. The guard is in the UPDATE, so a
    /// resolved appointment can never transition again; the loser of a
    /// concurrent race gets `None`.
    #[instrument(skip(self), fields(appointment_id = %abbrev_uuid(&id), ?status), err)]
    pub async fn transition(&mut self, id: AppointmentId, status: AppointmentStatus) -> Result<Option<AppointmentDBResponse>> {
        let row = sqlx::query_as::<_, AppointmentDBResponse>(
            r#"
            UPDATE appointments
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'scheduled'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(row)
    }

    /// Reschedule moves the timestamp only; status is untouched.
    #[instrument(skip(self), fields(appointment_id = %abbrev_uuid(&id)), err)]
    pub async fn reschedule(&mut self, id: AppointmentId, scheduled_at: DateTime<Utc>) -> Result<Option<AppointmentDBResponse>> {
        let row = sqlx::query_as::<_, AppointmentDBResponse>(
            "UPDATE appointments SET scheduled_at = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(scheduled_at)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(row)
    }

    #[instrument(skip(self), fields(patient = %abbrev_uuid(&patient_id)), err)]
    pub async fn list_for_patient(&mut self, patient_id: ProfileId) -> Result<Vec<AppointmentDBResponse>> {
        let rows = sqlx::query_as::<_, AppointmentDBResponse>(
            "SELECT * FROM appointments WHERE patient_id = $1 ORDER BY scheduled_at DESC",
        )
        .bind(patient_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self), fields(clinician = %abbrev_uuid(&clinician_id)), err)]
    pub async fn list_for_clinician(&mut self, clinician_id: ProfileId) -> Result<Vec<AppointmentDBResponse>> {
        let rows = sqlx::query_as::<_, AppointmentDBResponse>(
            "SELECT * FROM appointments WHERE clinician_id = $1 ORDER BY scheduled_at DESC",
        )
        .bind(clinician_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self), fields(patient = %abbrev_uuid(&patient_id)), err)]
    pub async fn upcoming_for_patient(&mut self, patient_id: ProfileId) -> Result<Vec<AppointmentDBResponse>> {
        let rows = sqlx::query_as::<_, AppointmentDBResponse>(
            r#"
            SELECT * FROM appointments
            WHERE patient_id = $1 AND status = 'scheduled' AND scheduled_at >= NOW()
            ORDER BY scheduled_at ASC
            "#,
        )
        .bind(patient_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self), fields(clinician = %abbrev_uuid(&clinician_id)), err)]
    pub async fn upcoming_for_clinician(&mut self, clinician_id: ProfileId) -> Result<Vec<AppointmentDBResponse>> {
        let rows = sqlx::query_as::<_, AppointmentDBResponse>(
            r#"
            SELECT * FROM appointments
            WHERE clinician_id = $1 AND status = 'scheduled' AND scheduled_at >= NOW()
            ORDER BY scheduled_at ASC
            "#,
        )
        .bind(clinician_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    /// Next upcoming scheduled visit per patient, for dashboard summaries.
    #[instrument(skip(self, patient_ids), fields(count = patient_ids.len()), err)]
    pub async fn next_scheduled_for(&mut self, patient_ids: &[ProfileId]) -> Result<Vec<NextAppointmentRow>> {
        if patient_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, NextAppointmentRow>(
            r#"
            SELECT DISTINCT ON (patient_id) patient_id, scheduled_at
            FROM appointments
            WHERE patient_id = ANY($1) AND status = 'scheduled' AND scheduled_at >= NOW()
            ORDER BY patient_id, scheduled_at ASC
            "#,
        )
        .bind(patient_ids)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self, request), fields(appointment_id = %abbrev_uuid(&request.appointment_id)), err)]
    pub async fn add_note(&mut self, request: &NoteCreateDBRequest) -> Result<NoteDBResponse> {
        let row = sqlx::query_as::<_, NoteDBResponse>(
            r#"
            INSERT INTO appointment_notes (id, appointment_id, content, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.appointment_id)
        .bind(&request.content)
        .bind(request.created_by)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row)
    }

    #[instrument(skip(self), fields(appointment_id = %abbrev_uuid(&appointment_id)), err)]
    pub async fn list_notes(&mut self, appointment_id: AppointmentId) -> Result<Vec<NoteDBResponse>> {
        let rows = sqlx::query_as::<_, NoteDBResponse>(
            "SELECT * FROM appointment_notes WHERE appointment_id = $1 ORDER BY created_at ASC",
        )
        .bind(appointment_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self, request), fields(appointment_id = %abbrev_uuid(&request.appointment_id)), err)]
    pub async fn add_service(&mut self, request: &ServiceCreateDBRequest) -> Result<ServiceDBResponse> {
        let row = sqlx::query_as::<_, ServiceDBResponse>(
            r#"
            INSERT INTO appointment_services (id, appointment_id, service_type, details)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.appointment_id)
        .bind(request.service_type)
        .bind(&request.details)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row)
    }

    #[instrument(skip(self), fields(appointment_id = %abbrev_uuid(&appointment_id)), err)]
    pub async fn list_services(&mut self, appointment_id: AppointmentId) -> Result<Vec<ServiceDBResponse>> {
        let rows = sqlx::query_as::<_, ServiceDBResponse>(
            "SELECT * FROM appointment_services WHERE appointment_id = $1 ORDER BY created_at ASC",
        )
        .bind(appointment_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::appointments::ServiceType;
    use crate::api::models::profiles::Role;
    use crate::db::handlers::{profiles::Profiles, repository::Repository};
    use crate::db::models::profiles::ProfileCreateDBRequest;
    use chrono::Duration;
    use sqlx::PgPool;

    async fn seed_profile(conn: &mut PgConnection, email: &str, role: Role) -> ProfileId {
        let mut profiles = Profiles::new(conn);
        profiles
            .create(&ProfileCreateDBRequest {
                email: email.to_string(),
                password_hash: Some("hash".to_string()),
                role,
                full_name: None,
                avatar_url: None,
                date_of_birth: None,
            })
            .await
            .unwrap()
            .id
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_transition_is_one_way(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let patient = seed_profile(&mut conn, "patient@example.com", Role::User).await;
        let clinician = seed_profile(&mut conn, "doc@example.com", Role::Clinician).await;

        let mut repo = Appointments::new(&mut conn);
        let apt = repo
            .create(&AppointmentCreateDBRequest {
                patient_id: patient,
                clinician_id: clinician,
                scheduled_at: Utc::now() + Duration::days(1),
            })
            .await
            .unwrap();
        assert_eq!(apt.status, AppointmentStatus::Scheduled);

        let completed = repo.transition(apt.id, AppointmentStatus::Completed).await.unwrap().unwrap();
        assert_eq!(completed.status, AppointmentStatus::Completed);
        assert!(completed.updated_at > apt.updated_at);

        // Resolved appointments never transition again, to any state
        assert!(repo.transition(apt.id, AppointmentStatus::NoShow).await.unwrap().is_none());
        assert!(repo.transition(apt.id, AppointmentStatus::Cancelled).await.unwrap().is_none());
        assert_eq!(
            repo.get_by_id(apt.id).await.unwrap().unwrap().status,
            AppointmentStatus::Completed
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reschedule_keeps_status(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let patient = seed_profile(&mut conn, "patient@example.com", Role::User).await;
        let clinician = seed_profile(&mut conn, "doc@example.com", Role::Clinician).await;

        let mut repo = Appointments::new(&mut conn);
        let apt = repo
            .create(&AppointmentCreateDBRequest {
                patient_id: patient,
                clinician_id: clinician,
                scheduled_at: Utc::now() + Duration::days(1),
            })
            .await
            .unwrap();

        let new_time = Utc::now() + Duration::days(7);
        let moved = repo.reschedule(apt.id, new_time).await.unwrap().unwrap();
        assert_eq!(moved.status, AppointmentStatus::Scheduled);
        assert_eq!(moved.scheduled_at.timestamp(), new_time.timestamp());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_notes_and_services_append_only(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let patient = seed_profile(&mut conn, "patient@example.com", Role::User).await;
        let clinician = seed_profile(&mut conn, "doc@example.com", Role::Clinician).await;

        let mut repo = Appointments::new(&mut conn);
        let apt = repo
            .create(&AppointmentCreateDBRequest {
                patient_id: patient,
                clinician_id: clinician,
                scheduled_at: Utc::now(),
            })
            .await
            .unwrap();

        repo.add_note(&NoteCreateDBRequest {
            appointment_id: apt.id,
            content: "Patient doing well".to_string(),
            created_by: clinician,
        })
        .await
        .unwrap();
        repo.add_note(&NoteCreateDBRequest {
            appointment_id: apt.id,
            content: "Follow up in a month".to_string(),
            created_by: clinician,
        })
        .await
        .unwrap();

        repo.add_service(&ServiceCreateDBRequest {
            appointment_id: apt.id,
            service_type: ServiceType::Vitals,
            details: None,
        })
        .await
        .unwrap();

        let notes = repo.list_notes(apt.id).await.unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].content, "Patient doing well");

        let services = repo.list_services(apt.id).await.unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].service_type, ServiceType::Vitals);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_next_scheduled_picks_soonest_per_patient(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let patient = seed_profile(&mut conn, "patient@example.com", Role::User).await;
        let clinician = seed_profile(&mut conn, "doc@example.com", Role::Clinician).await;

        let mut repo = Appointments::new(&mut conn);
        let base = Utc::now();
        let soon = base + Duration::days(2);
        for days in [5i64, 2, 9] {
            repo.create(&AppointmentCreateDBRequest {
                patient_id: patient,
                clinician_id: clinician,
                scheduled_at: base + Duration::days(days),
            })
            .await
            .unwrap();
        }

        let next = repo.next_scheduled_for(&[patient]).await.unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].patient_id, patient);
        assert_eq!(next[0].scheduled_at.timestamp(), soon.timestamp());
    }
}
