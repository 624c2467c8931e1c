//! # Ward Core
//!
//! Client-side state for the ward patient list.
//!
//! This crate contains:
//! - the patient and admission models, with wire rows kept apart from the denormalised
//!   [`Patient`] the store hands out
//! - the [`PatientsBackend`] trait the store talks through, plus an in-memory implementation
//! - the [`PatientStore`] itself and its change notification
//!
//! **No transport concerns**: the HTTP client for the hosted database lives in
//! `ward-postgrest`; process wiring (environment, logging, CLI) lives in the `ward` binary.

pub mod backend;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod memory;
pub mod models;
pub mod store;
pub mod validation;

pub use backend::PatientsBackend;
pub use config::{BackendKind, CoreConfig};
pub use error::{BackendError, BackendResult, StoreError, StoreResult};
pub use events::Subscription;
pub use memory::InMemoryBackend;
pub use models::{
    AddPatientInput, Admission, AdmissionDetails, AdmissionStatus, AttendingUser, Gender,
    NewAdmission, NewPatient, Patient, PatientRecord, PatientUpdate, SafetyClassification,
};
pub use store::{PatientStore, StoreState};

// Re-export validated text types so callers need only depend on this crate.
pub use ward_types::{MedicalRecordNumber, NonEmptyText, TextError};
