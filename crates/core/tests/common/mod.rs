use chrono::{TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;
use ward_core::{
    AddPatientInput, AdmissionDetails, InMemoryBackend, MedicalRecordNumber, NewPatient,
    NonEmptyText, PatientStore,
};

/// Test helper to create a store over fresh in-memory tables
pub fn setup_store() -> (Arc<InMemoryBackend>, PatientStore) {
    let backend = Arc::new(InMemoryBackend::new());
    let store = PatientStore::new(backend.clone());
    (backend, store)
}

/// Create an admission request for `mrn` admitted on day `day` of March 2024
pub fn admission(
    mrn: &str,
    day: u32,
    department: &str,
    attending_user_id: Option<Uuid>,
) -> AddPatientInput {
    AddPatientInput {
        patient: NewPatient {
            mrn: MedicalRecordNumber::parse(mrn).expect("valid test mrn"),
            name: NonEmptyText::new("TestGiven TestFamily").unwrap(),
            date_of_birth: chrono::NaiveDate::from_ymd_opt(1980, 1, 1),
            gender: None,
            phone: None,
        },
        admission: AdmissionDetails {
            admission_date: Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap(),
            department: NonEmptyText::new(department).unwrap(),
            diagnosis: NonEmptyText::new(format!("{department} review")).unwrap(),
            attending_user_id,
            safety_type: None,
        },
    }
}
