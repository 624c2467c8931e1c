//! Typed payload for admitting a patient.

use super::admission::{AdmissionStatus, NewAdmission, SafetyClassification};
use super::patient::NewPatient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use ward_types::NonEmptyText;

/// Admission details supplied by the caller. Visit number and status are
/// assigned by the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionDetails {
    pub admission_date: DateTime<Utc>,
    pub department: NonEmptyText,
    pub diagnosis: NonEmptyText,
    #[serde(default)]
    pub attending_user_id: Option<Uuid>,
    #[serde(default)]
    pub safety_type: Option<SafetyClassification>,
}

impl AdmissionDetails {
    pub(crate) fn into_new_admission(self, patient_id: Uuid, visit_number: u32) -> NewAdmission {
        NewAdmission {
            patient_id,
            status: AdmissionStatus::Active,
            admission_date: self.admission_date,
            department: self.department,
            diagnosis: self.diagnosis,
            visit_number,
            safety_type: self.safety_type,
            attending_user_id: self.attending_user_id,
        }
    }
}

/// Input to [`PatientStore::add_patient`](crate::store::PatientStore::add_patient).
///
/// `patient` is only inserted when no patient with the same MRN exists yet;
/// for a returning patient only `admission` is used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPatientInput {
    pub patient: NewPatient,
    pub admission: AdmissionDetails,
}
