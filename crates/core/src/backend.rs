//! The seam between the store and the remote data service.
//!
//! The store only ever talks to a [`PatientsBackend`]. The HTTP implementation lives in the
//! `ward-postgrest` crate; [`InMemoryBackend`](crate::memory::InMemoryBackend) provides the
//! same contract without a network.

use crate::error::{BackendError, BackendResult};
use crate::models::{Admission, NewAdmission, NewPatient, PatientRecord, PatientUpdate};
use async_trait::async_trait;
use uuid::Uuid;
use ward_types::MedicalRecordNumber;

/// Remote operations the patient store depends on.
///
/// Every method maps to a single request against the service. Implementations must not retry
/// or cache; the store treats each call as fire-and-confirm.
#[async_trait]
pub trait PatientsBackend: Send + Sync {
    /// All patients, newest `created_at` first, each with nested admissions and the
    /// admissions' attending users.
    async fn list_patients(&self) -> BackendResult<Vec<PatientRecord>>;

    /// One patient with nested admissions.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] when no row has `id`.
    async fn fetch_patient(&self, id: Uuid) -> BackendResult<PatientRecord>;

    /// Look up a patient row by medical record number.
    ///
    /// Returns `Ok(None)` only when no row matches. More than one match is
    /// [`BackendError::MultipleRows`]; callers must not treat any error as "absent".
    async fn find_patient_by_mrn(
        &self,
        mrn: &MedicalRecordNumber,
    ) -> BackendResult<Option<PatientRecord>>;

    /// Highest visit number recorded for a patient, `None` if it has no admissions.
    async fn max_visit_number(&self, patient_id: Uuid) -> BackendResult<Option<u32>>;

    async fn insert_patient(&self, patient: &NewPatient) -> BackendResult<PatientRecord>;

    async fn insert_admission(&self, admission: &NewAdmission) -> BackendResult<Admission>;

    /// Apply a partial update and return the updated row (without admissions).
    async fn update_patient(&self, id: Uuid, update: &PatientUpdate)
        -> BackendResult<PatientRecord>;

    async fn delete_patient(&self, id: Uuid) -> BackendResult<()>;
}

/// Reduce a result set that must hold exactly one row.
pub fn single_row<T>(mut rows: Vec<T>, what: &str) -> BackendResult<T> {
    match rows.len() {
        0 => Err(BackendError::NotFound(what.to_string())),
        1 => Ok(rows.remove(0)),
        count => Err(BackendError::MultipleRows {
            what: what.to_string(),
            count,
        }),
    }
}

/// Reduce a result set that may hold zero or one row.
pub fn maybe_single_row<T>(mut rows: Vec<T>, what: &str) -> BackendResult<Option<T>> {
    match rows.len() {
        0 => Ok(None),
        1 => Ok(Some(rows.remove(0))),
        count => Err(BackendError::MultipleRows {
            what: what.to_string(),
            count,
        }),
    }
}
