//! Process-local implementation of [`PatientsBackend`].
//!
//! Mirrors the server-side behaviour the store relies on: unique MRNs, unique
//! `(patient_id, visit_number)` pairs, admissions cascading on patient delete and
//! the attending user joined onto each admission. Nothing is persisted.

use crate::backend::PatientsBackend;
use crate::error::{BackendError, BackendResult};
use crate::models::{
    Admission, AttendingUser, NewAdmission, NewPatient, PatientRecord, PatientUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;
use ward_types::MedicalRecordNumber;

#[derive(Default)]
struct Tables {
    patients: Vec<PatientRecord>,
    admissions: Vec<Admission>,
    users: HashMap<Uuid, AttendingUser>,
    last_created_at: Option<DateTime<Utc>>,
}

impl Tables {
    /// Strictly increasing creation timestamps, so "newest first" is well defined even when
    /// rows are inserted within the same clock tick.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_created_at {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(ts);
        ts
    }

    fn with_admissions(&self, record: &PatientRecord) -> PatientRecord {
        let admissions = self
            .admissions
            .iter()
            .filter(|a| a.patient_id == record.id)
            .map(|a| {
                let mut a = a.clone();
                a.attending_user = a.attending_user_id.and_then(|id| self.users.get(&id).cloned());
                a
            })
            .collect();

        PatientRecord {
            admissions: Some(admissions),
            ..record.clone()
        }
    }

    fn mrn_taken(&self, mrn: &str, except: Option<Uuid>) -> bool {
        self.patients
            .iter()
            .any(|p| p.mrn == mrn && Some(p.id) != except)
    }
}

fn unique_violation(constraint: &str) -> BackendError {
    BackendError::Api {
        status: 409,
        message: format!("duplicate key value violates unique constraint \"{constraint}\""),
    }
}

/// In-memory tables standing in for the remote service.
#[derive(Default)]
pub struct InMemoryBackend {
    tables: RwLock<Tables>,
    pending_failure: Mutex<Option<String>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row in the `users` reference table and return its id.
    pub async fn add_user(&self, full_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.write().await.users.insert(
            id,
            AttendingUser {
                id,
                full_name: full_name.to_string(),
            },
        );
        id
    }

    /// Make the next backend call fail with `message`.
    pub async fn fail_next(&self, message: impl Into<String>) {
        *self.pending_failure.lock().await = Some(message.into());
    }

    pub async fn patient_count(&self) -> usize {
        self.tables.read().await.patients.len()
    }

    pub async fn admission_count(&self) -> usize {
        self.tables.read().await.admissions.len()
    }

    /// Admissions stored for a patient, in insertion order, without the user join.
    pub async fn admissions_for(&self, patient_id: Uuid) -> Vec<Admission> {
        self.tables
            .read()
            .await
            .admissions
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect()
    }

    async fn check_failure(&self) -> BackendResult<()> {
        match self.pending_failure.lock().await.take() {
            Some(message) => Err(BackendError::Injected(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PatientsBackend for InMemoryBackend {
    async fn list_patients(&self) -> BackendResult<Vec<PatientRecord>> {
        self.check_failure().await?;
        let tables = self.tables.read().await;

        let mut rows: Vec<PatientRecord> = tables
            .patients
            .iter()
            .map(|p| tables.with_admissions(p))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn fetch_patient(&self, id: Uuid) -> BackendResult<PatientRecord> {
        self.check_failure().await?;
        let tables = self.tables.read().await;

        tables
            .patients
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.with_admissions(p))
            .ok_or_else(|| BackendError::NotFound(format!("patient {id}")))
    }

    async fn find_patient_by_mrn(
        &self,
        mrn: &MedicalRecordNumber,
    ) -> BackendResult<Option<PatientRecord>> {
        self.check_failure().await?;
        let tables = self.tables.read().await;

        let rows: Vec<PatientRecord> = tables
            .patients
            .iter()
            .filter(|p| p.mrn == mrn.as_str())
            .cloned()
            .collect();
        crate::backend::maybe_single_row(rows, "patient")
    }

    async fn max_visit_number(&self, patient_id: Uuid) -> BackendResult<Option<u32>> {
        self.check_failure().await?;
        let tables = self.tables.read().await;

        Ok(tables
            .admissions
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .map(|a| a.visit_number)
            .max())
    }

    async fn insert_patient(&self, patient: &NewPatient) -> BackendResult<PatientRecord> {
        self.check_failure().await?;
        let mut tables = self.tables.write().await;

        if tables.mrn_taken(patient.mrn.as_str(), None) {
            return Err(unique_violation("patients_mrn_key"));
        }

        let record = PatientRecord {
            id: Uuid::new_v4(),
            mrn: patient.mrn.as_str().to_string(),
            name: patient.name.as_str().to_string(),
            date_of_birth: patient.date_of_birth,
            gender: patient.gender,
            phone: patient.phone.clone(),
            created_at: tables.next_created_at(),
            admissions: None,
        };
        tables.patients.push(record.clone());
        Ok(record)
    }

    async fn insert_admission(&self, admission: &NewAdmission) -> BackendResult<Admission> {
        self.check_failure().await?;
        let mut tables = self.tables.write().await;

        if !tables.patients.iter().any(|p| p.id == admission.patient_id) {
            return Err(BackendError::Api {
                status: 409,
                message: "insert or update on table \"admissions\" violates foreign key constraint \"admissions_patient_id_fkey\"".into(),
            });
        }
        if tables
            .admissions
            .iter()
            .any(|a| a.patient_id == admission.patient_id && a.visit_number == admission.visit_number)
        {
            return Err(unique_violation("admissions_patient_id_visit_number_key"));
        }

        let row = Admission {
            id: Uuid::new_v4(),
            patient_id: admission.patient_id,
            status: admission.status,
            admission_date: admission.admission_date,
            discharge_date: None,
            department: Some(admission.department.as_str().to_string()),
            diagnosis: Some(admission.diagnosis.as_str().to_string()),
            visit_number: admission.visit_number,
            safety_type: admission.safety_type,
            attending_user_id: admission.attending_user_id,
            attending_user: None,
            created_at: tables.next_created_at(),
        };
        tables.admissions.push(row.clone());
        Ok(row)
    }

    async fn update_patient(
        &self,
        id: Uuid,
        update: &PatientUpdate,
    ) -> BackendResult<PatientRecord> {
        self.check_failure().await?;
        let mut tables = self.tables.write().await;

        if let Some(mrn) = &update.mrn {
            if tables.mrn_taken(mrn.as_str(), Some(id)) {
                return Err(unique_violation("patients_mrn_key"));
            }
        }

        let record = tables
            .patients
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| BackendError::NotFound(format!("patient {id}")))?;
        update.apply_to(record);
        Ok(record.clone())
    }

    async fn delete_patient(&self, id: Uuid) -> BackendResult<()> {
        self.check_failure().await?;
        let mut tables = self.tables.write().await;

        tables.patients.retain(|p| p.id != id);
        tables.admissions.retain(|a| a.patient_id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AdmissionStatus;
    use chrono::TimeZone;
    use ward_types::NonEmptyText;

    fn new_patient(mrn: &str) -> NewPatient {
        NewPatient {
            mrn: MedicalRecordNumber::parse(mrn).unwrap(),
            name: NonEmptyText::new("Test Patient").unwrap(),
            date_of_birth: None,
            gender: None,
            phone: None,
        }
    }

    fn new_admission(patient_id: Uuid, visit_number: u32) -> NewAdmission {
        NewAdmission {
            patient_id,
            status: AdmissionStatus::Active,
            admission_date: Utc.with_ymd_and_hms(2024, 1, visit_number, 0, 0, 0).unwrap(),
            department: NonEmptyText::new("General Medicine").unwrap(),
            diagnosis: NonEmptyText::new("Pneumonia").unwrap(),
            visit_number,
            safety_type: None,
            attending_user_id: None,
        }
    }

    #[tokio::test]
    async fn duplicate_mrn_is_rejected() {
        let backend = InMemoryBackend::new();
        backend.insert_patient(&new_patient("A1")).await.unwrap();

        let err = backend
            .insert_patient(&new_patient("a1"))
            .await
            .expect_err("duplicate mrn should fail");
        assert!(matches!(err, BackendError::Api { status: 409, .. }));
    }

    #[tokio::test]
    async fn list_is_newest_first_with_joined_users() {
        let backend = InMemoryBackend::new();
        let doctor = backend.add_user("Dr. Lin").await;

        let first = backend.insert_patient(&new_patient("A1")).await.unwrap();
        let second = backend.insert_patient(&new_patient("A2")).await.unwrap();

        let mut admission = new_admission(first.id, 1);
        admission.attending_user_id = Some(doctor);
        backend.insert_admission(&admission).await.unwrap();

        let rows = backend.list_patients().await.unwrap();
        assert_eq!(rows[0].id, second.id);
        assert_eq!(rows[1].id, first.id);

        let admissions = rows[1].admissions.as_ref().expect("admissions are nested");
        assert_eq!(
            admissions[0].attending_user.as_ref().map(|u| u.full_name.as_str()),
            Some("Dr. Lin")
        );
    }

    #[tokio::test]
    async fn visit_numbers_are_unique_per_patient() {
        let backend = InMemoryBackend::new();
        let patient = backend.insert_patient(&new_patient("A1")).await.unwrap();

        backend
            .insert_admission(&new_admission(patient.id, 1))
            .await
            .unwrap();
        assert!(backend
            .insert_admission(&new_admission(patient.id, 1))
            .await
            .is_err());
        assert_eq!(backend.max_visit_number(patient.id).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn delete_cascades_to_admissions() {
        let backend = InMemoryBackend::new();
        let patient = backend.insert_patient(&new_patient("A1")).await.unwrap();
        backend
            .insert_admission(&new_admission(patient.id, 1))
            .await
            .unwrap();

        backend.delete_patient(patient.id).await.unwrap();

        assert_eq!(backend.patient_count().await, 0);
        assert_eq!(backend.admission_count().await, 0);
    }

    #[tokio::test]
    async fn injected_failure_applies_once() {
        let backend = InMemoryBackend::new();
        backend.fail_next("service unavailable").await;

        let err = backend.list_patients().await.expect_err("should fail once");
        assert_eq!(err.to_string(), "service unavailable");
        assert!(backend.list_patients().await.is_ok());
    }
}
