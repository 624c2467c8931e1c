//! Input validation utilities.
//!
//! This module contains functions for validating caller inputs before any request reaches the
//! backend. Field-level checks (non-empty names, MRN syntax) are already guaranteed by the
//! `ward-types` wrappers; what remains here are the checks that span fields.

use crate::models::{AddPatientInput, PatientUpdate};
use crate::{StoreError, StoreResult};
use chrono::NaiveDate;

const MAX_PHONE_LEN: usize = 32;

/// Validates an admission request.
///
/// # Errors
///
/// Returns a `StoreError::InvalidInput` if:
/// - the date of birth falls after the admission date,
/// - the phone number is blank, too long, or contains characters other than digits,
///   spaces and `+ - ( )`.
pub fn validate_add_patient(input: &AddPatientInput) -> StoreResult<()> {
    if let Some(dob) = input.patient.date_of_birth {
        let admitted_on = input.admission.admission_date.date_naive();
        validate_birth_date(dob, admitted_on)?;
    }

    if let Some(phone) = &input.patient.phone {
        validate_phone(phone)?;
    }

    Ok(())
}

/// Validates a partial patient update.
///
/// # Errors
///
/// Returns a `StoreError::InvalidInput` if the update changes nothing or carries an invalid
/// phone number.
pub fn validate_patient_update(update: &PatientUpdate) -> StoreResult<()> {
    if update.is_empty() {
        return Err(StoreError::InvalidInput(
            "patient update contains no fields".into(),
        ));
    }

    if let Some(Some(phone)) = &update.phone {
        validate_phone(phone)?;
    }

    Ok(())
}

fn validate_birth_date(dob: NaiveDate, admitted_on: NaiveDate) -> StoreResult<()> {
    if dob > admitted_on {
        return Err(StoreError::InvalidInput(format!(
            "date of birth {dob} is after admission date {admitted_on}"
        )));
    }
    Ok(())
}

fn validate_phone(phone: &str) -> StoreResult<()> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(StoreError::InvalidInput("phone cannot be blank".into()));
    }
    if phone.len() > MAX_PHONE_LEN {
        return Err(StoreError::InvalidInput(format!(
            "phone exceeds maximum length of {MAX_PHONE_LEN} characters"
        )));
    }

    let ok = phone
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b' ' | b'+' | b'-' | b'(' | b')'));
    if !ok {
        return Err(StoreError::InvalidInput(
            "phone contains invalid characters (only digits, spaces and '+-()' allowed)".into(),
        ));
    }

    Ok(())
}
