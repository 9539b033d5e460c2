//! Database repository for patient metric rows.
//!
//! Metrics are an append-only time series: corrections are new rows, never
//! edits, so trend displays keep their history.

use crate::db::{
    errors::Result,
    models::metrics::{MetricCreateDBRequest, MetricDBResponse},
};
use crate::types::{abbrev_uuid, ProfileId};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

pub struct PatientMetrics<'c> {
    db: &'c mut PgConnection,
}

impl<'c> PatientMetrics<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(patient = %abbrev_uuid(&request.patient_id)), err)]
    pub async fn record(&mut self, request: &MetricCreateDBRequest) -> Result<MetricDBResponse> {
        let row = sqlx::query_as::<_, MetricDBResponse>(
            r#"
            INSERT INTO patient_metrics
                (id, patient_id, appointment_id, recorded_by, blood_pressure_systolic,
                 blood_pressure_diastolic, weight_kg, a1c, medication_adherence)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.patient_id)
        .bind(request.appointment_id)
        .bind(request.recorded_by)
        .bind(request.blood_pressure_systolic)
        .bind(request.blood_pressure_diastolic)
        .bind(request.weight_kg)
        .bind(request.a1c)
        .bind(request.medication_adherence)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row)
    }

    /// Most recent first, which is the display order everywhere.
    #[instrument(skip(self), fields(patient = %abbrev_uuid(&patient_id)), err)]
    pub async fn list_for_patient(&mut self, patient_id: ProfileId, limit: i64) -> Result<Vec<MetricDBResponse>> {
        let rows = sqlx::query_as::<_, MetricDBResponse>(
            "SELECT * FROM patient_metrics WHERE patient_id = $1 ORDER BY recorded_at DESC LIMIT $2",
        )
        .bind(patient_id)
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::metrics::MedicationAdherence;
    use crate::api::models::profiles::Role;
    use crate::db::handlers::{profiles::Profiles, repository::Repository};
    use crate::db::models::profiles::ProfileCreateDBRequest;
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
    async fn test_metrics_are_append_only_and_newest_first(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let patient = seed_profile(&mut conn, "patient@example.com", Role::User).await;
        let clinician = seed_profile(&mut conn, "doc@example.com", Role::Clinician).await;

        let mut repo = PatientMetrics::new(&mut conn);
        let blank = MetricCreateDBRequest {
            patient_id: patient,
            appointment_id: None,
            recorded_by: clinician,
            blood_pressure_systolic: None,
            blood_pressure_diastolic: None,
            weight_kg: None,
            a1c: None,
            medication_adherence: None,
        };

        repo.record(&MetricCreateDBRequest {
            weight_kg: Some(82.5),
            ..blank.clone()
        })
        .await
        .unwrap();
        // A correction is a second row, not an edit
        repo.record(&MetricCreateDBRequest {
            weight_kg: Some(81.9),
            medication_adherence: Some(MedicationAdherence::Good),
            ..blank.clone()
        })
        .await
        .unwrap();

        let rows = repo.list_for_patient(patient, 50).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].weight_kg, Some(81.9));
        assert_eq!(rows[0].medication_adherence, Some(MedicationAdherence::Good));
        assert_eq!(rows[1].weight_kg, Some(82.5));
        // Untouched fields stay null rather than inheriting earlier rows
        assert_eq!(rows[0].blood_pressure_systolic, None);
        assert_eq!(rows[0].a1c, None);
    }
}
