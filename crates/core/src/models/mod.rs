//! Domain and wire models for patients and admissions.

pub mod admission;
pub mod input;
pub mod patient;

pub use admission::{
    Admission, AdmissionStatus, AttendingUser, NewAdmission, SafetyClassification,
};
pub use input::{AddPatientInput, AdmissionDetails};
pub use patient::{Gender, NewPatient, Patient, PatientRecord, PatientUpdate};
