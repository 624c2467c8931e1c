//! The patient store.
//!
//! Holds the in-memory view of the `patients` table (with nested admissions), the currently
//! selected patient, a loading flag and the last error message. Every remote operation follows
//! the same shape:
//!
//! 1. set `loading` and clear `error`;
//! 2. await the backend calls one after another;
//! 3. on success patch or replace the cached state, clear `loading`, notify subscribers;
//! 4. on failure record the message and clear `loading`.
//!
//! Only [`PatientStore::add_patient`] hands the error back to the caller. The other operations
//! record it in [`StoreState::error`] and return normally.
//!
//! State is never held locked across a backend call, so concurrent operations interleave and
//! the last one to write wins.

use crate::backend::PatientsBackend;
use crate::constants::FIRST_VISIT_NUMBER;
use crate::error::{StoreError, StoreResult};
use crate::events::{ChangeNotifier, Subscription};
use crate::models::{AddPatientInput, Patient, PatientRecord, PatientUpdate};
use crate::validation::{validate_add_patient, validate_patient_update};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

/// Snapshot of everything the store holds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreState {
    /// Newest `created_at` first after a fetch; additions go to the front.
    pub patients: Vec<Patient>,
    pub selected_patient: Option<Patient>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Client-side state container for patients.
///
/// Cloning yields another handle onto the same state and subscribers.
#[derive(Clone)]
pub struct PatientStore {
    backend: Arc<dyn PatientsBackend>,
    state: Arc<RwLock<StoreState>>,
    notifier: Arc<ChangeNotifier>,
}

impl PatientStore {
    pub fn new(backend: Arc<dyn PatientsBackend>) -> Self {
        Self {
            backend,
            state: Arc::new(RwLock::new(StoreState::default())),
            notifier: ChangeNotifier::new(),
        }
    }

    // ========================================================================
    // READ ACCESS
    // ========================================================================

    pub async fn snapshot(&self) -> StoreState {
        self.state.read().await.clone()
    }

    pub async fn patients(&self) -> Vec<Patient> {
        self.state.read().await.patients.clone()
    }

    pub async fn patient(&self, id: Uuid) -> Option<Patient> {
        self.state
            .read()
            .await
            .patients
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub async fn selected_patient(&self) -> Option<Patient> {
        self.state.read().await.selected_patient.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    // ========================================================================
    // SUBSCRIPTIONS
    // ========================================================================

    /// Register a listener called after every successful fetch or mutation and after the
    /// selection changes. The listener receives nothing; read the store to see the change.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.notifier.subscribe(callback)
    }

    /// Revision counter advanced on the same events that reach [`subscribe`](Self::subscribe)
    /// listeners.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.notifier.changes()
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    /// Replace the cached patients with a fresh listing from the backend.
    ///
    /// Each patient's admissions are sorted newest first and its display fields derived from
    /// the latest one. Failures are recorded in the state, not returned.
    pub async fn fetch_patients(&self) {
        tracing::debug!("Fetching patients");
        self.begin().await;

        match self.backend.list_patients().await {
            Ok(records) => {
                let mut patients: Vec<Patient> =
                    records.into_iter().map(Patient::from_record).collect();
                patients.sort_by(|a, b| b.created_at.cmp(&a.created_at));

                tracing::info!(count = patients.len(), "Fetched patients");
                {
                    let mut state = self.state.write().await;
                    state.patients = patients;
                    state.loading = false;
                }
                self.notifier.notify();
            }
            Err(e) => self.fail("fetch_patients", e.into()).await,
        }
    }

    /// Admit a patient, creating the patient row first if the MRN is unknown.
    ///
    /// For a known MRN a new `active` admission is added with the next visit number; for a new
    /// MRN the patient is inserted together with visit 1. The full patient is then re-read and
    /// placed at the front of the cached list, replacing any stale copy.
    ///
    /// # Errors
    ///
    /// Returns the recorded [`StoreError`] if validation or any backend call fails. A failing
    /// MRN lookup is reported as such and never falls through to creating a new patient.
    pub async fn add_patient(&self, input: AddPatientInput) -> StoreResult<Patient> {
        self.begin().await;

        match self.admit(input).await {
            Ok(patient) => {
                {
                    let mut state = self.state.write().await;
                    state.patients.retain(|p| p.id != patient.id);
                    state.patients.insert(0, patient.clone());
                    if let Some(selected) = state
                        .selected_patient
                        .as_mut()
                        .filter(|p| p.id == patient.id)
                    {
                        *selected = patient.clone();
                    }
                    state.loading = false;
                }
                self.notifier.notify();
                Ok(patient)
            }
            Err(e) => {
                self.fail("add_patient", e.clone()).await;
                Err(e)
            }
        }
    }

    /// Apply a partial update to a patient and merge the returned row into the cache.
    ///
    /// The cached admissions and display fields are kept. Failures are recorded in the state.
    pub async fn update_patient(&self, id: Uuid, updates: PatientUpdate) {
        tracing::info!(patient_id = %id, "Updating patient");
        self.begin().await;

        match self.apply_update(id, &updates).await {
            Ok(record) => {
                {
                    let mut state = self.state.write().await;
                    if let Some(patient) = state.patients.iter_mut().find(|p| p.id == id) {
                        patient.apply_record(record.clone());
                    }
                    if let Some(selected) =
                        state.selected_patient.as_mut().filter(|p| p.id == id)
                    {
                        selected.apply_record(record);
                    }
                    state.loading = false;
                }
                self.notifier.notify();
            }
            Err(e) => self.fail("update_patient", e).await,
        }
    }

    /// Delete a patient remotely and drop it from the cache and the selection.
    pub async fn delete_patient(&self, id: Uuid) {
        tracing::info!(patient_id = %id, "Deleting patient");
        self.begin().await;

        match self.backend.delete_patient(id).await {
            Ok(()) => {
                {
                    let mut state = self.state.write().await;
                    state.patients.retain(|p| p.id != id);
                    if state
                        .selected_patient
                        .as_ref()
                        .is_some_and(|p| p.id == id)
                    {
                        state.selected_patient = None;
                    }
                    state.loading = false;
                }
                self.notifier.notify();
            }
            Err(e) => self.fail("delete_patient", e.into()).await,
        }
    }

    /// Set or clear the selected patient. No remote call is made.
    pub async fn set_selected_patient(&self, patient: Option<Patient>) {
        self.state.write().await.selected_patient = patient;
        self.notifier.notify();
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    async fn admit(&self, input: AddPatientInput) -> StoreResult<Patient> {
        validate_add_patient(&input)?;
        let AddPatientInput { patient, admission } = input;

        let patient_id = match self.backend.find_patient_by_mrn(&patient.mrn).await? {
            Some(existing) => {
                let visit_number = match self.backend.max_visit_number(existing.id).await? {
                    Some(max) => max.checked_add(1).ok_or_else(|| {
                        StoreError::InvalidInput(format!(
                            "visit number overflow for patient {}",
                            existing.id
                        ))
                    })?,
                    None => FIRST_VISIT_NUMBER,
                };

                tracing::info!(
                    patient_id = %existing.id,
                    mrn = %patient.mrn,
                    visit_number,
                    "Admitting returning patient"
                );
                self.backend
                    .insert_admission(&admission.into_new_admission(existing.id, visit_number))
                    .await?;
                existing.id
            }
            None => {
                let created = self.backend.insert_patient(&patient).await?;
                tracing::info!(patient_id = %created.id, mrn = %patient.mrn, "Created patient");

                self.backend
                    .insert_admission(
                        &admission.into_new_admission(created.id, FIRST_VISIT_NUMBER),
                    )
                    .await?;
                created.id
            }
        };

        let record = self.backend.fetch_patient(patient_id).await?;
        Ok(Patient::from_record(record))
    }

    async fn apply_update(&self, id: Uuid, updates: &PatientUpdate) -> StoreResult<PatientRecord> {
        validate_patient_update(updates)?;
        Ok(self.backend.update_patient(id, updates).await?)
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
    }

    async fn fail(&self, operation: &str, error: StoreError) {
        tracing::warn!(operation, error = %error, "Patient store operation failed");
        let mut state = self.state.write().await;
        state.loading = false;
        state.error = Some(error.to_string());
    }
}
