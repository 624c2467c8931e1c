//! Query-string builders for the PostgREST endpoints.
//!
//! Kept free of any HTTP types so the exact parameters sent for each operation can be checked
//! in isolation.

use uuid::Uuid;
use ward_core::MedicalRecordNumber;

/// Patient columns plus nested admissions, each admission carrying its attending user.
///
/// The `!attending_user_id` hint pins the embed to that foreign key in case `admissions`
/// references `users` more than once.
pub const PATIENT_WITH_ADMISSIONS: &str =
    "*,admissions(*,attending_user:users!attending_user_id(id,full_name))";

pub type Params = Vec<(&'static str, String)>;

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

pub fn list_patients() -> Params {
    vec![
        ("select", PATIENT_WITH_ADMISSIONS.to_string()),
        ("order", "created_at.desc".to_string()),
    ]
}

pub fn patient_with_admissions(id: Uuid) -> Params {
    vec![
        ("select", PATIENT_WITH_ADMISSIONS.to_string()),
        ("id", eq(id)),
    ]
}

pub fn patient_by_mrn(mrn: &MedicalRecordNumber) -> Params {
    vec![("select", "*".to_string()), ("mrn", eq(mrn))]
}

pub fn latest_visit_number(patient_id: Uuid) -> Params {
    vec![
        ("select", "visit_number".to_string()),
        ("patient_id", eq(patient_id)),
        ("order", "visit_number.desc".to_string()),
        ("limit", "1".to_string()),
    ]
}

pub fn by_id(id: Uuid) -> Params {
    vec![("id", eq(id))]
}
