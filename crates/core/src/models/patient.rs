//! Patient wire rows and the denormalised domain patient.
//!
//! The backend returns [`PatientRecord`] rows, optionally with their nested
//! admissions. [`Patient`] is what the store holds: admissions sorted newest
//! first and the display fields (attending doctor, department, diagnosis,
//! last admission date) lifted from the most recent admission.

use super::admission::Admission;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use ward_types::{MedicalRecordNumber, NonEmptyText};

/// Administrative gender as stored on the patient row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    Unknown,
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            "unknown" => Ok(Gender::Unknown),
            other => Err(format!("unknown gender '{other}'")),
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A `patients` row as returned by the backend.
///
/// `admissions` is only present when the request asked for the nested
/// relationship; plain insert/update responses leave it `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: Uuid,
    pub mrn: String,
    pub name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admissions: Option<Vec<Admission>>,
}

/// A patient as held by the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Patient {
    pub id: Uuid,
    pub mrn: String,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Sorted newest first.
    pub admissions: Vec<Admission>,
    pub attending_doctor: Option<String>,
    pub department: Option<String>,
    pub diagnosis: Option<String>,
    pub last_admission_date: Option<DateTime<Utc>>,
}

impl Patient {
    /// Build a store patient from a backend row, sorting its admissions and
    /// computing the display fields.
    pub fn from_record(record: PatientRecord) -> Self {
        let mut patient = Patient {
            id: record.id,
            mrn: record.mrn,
            name: record.name,
            date_of_birth: record.date_of_birth,
            gender: record.gender,
            phone: record.phone,
            created_at: record.created_at,
            admissions: record.admissions.unwrap_or_default(),
            attending_doctor: None,
            department: None,
            diagnosis: None,
            last_admission_date: None,
        };
        patient.refresh_derived();
        patient
    }

    /// Merge a returned row into this patient.
    ///
    /// Identity fields always come from the row. Admissions are only replaced
    /// when the row carries them, so a plain update response keeps the
    /// admission history and display fields intact.
    pub fn apply_record(&mut self, record: PatientRecord) {
        self.id = record.id;
        self.mrn = record.mrn;
        self.name = record.name;
        self.date_of_birth = record.date_of_birth;
        self.gender = record.gender;
        self.phone = record.phone;
        self.created_at = record.created_at;

        if let Some(admissions) = record.admissions {
            self.admissions = admissions;
            self.refresh_derived();
        }
    }

    /// The most recent admission, if any.
    pub fn latest_admission(&self) -> Option<&Admission> {
        self.admissions.first()
    }

    fn refresh_derived(&mut self) {
        self.admissions.sort_by(Admission::newest_first);

        let latest = self.admissions.first();
        self.attending_doctor = latest
            .and_then(|a| a.attending_user.as_ref())
            .map(|u| u.full_name.clone());
        self.department = latest.and_then(|a| a.department.clone());
        self.diagnosis = latest.and_then(|a| a.diagnosis.clone());
        self.last_admission_date = latest.map(|a| a.admission_date);
    }
}

/// Insert payload for the `patients` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPatient {
    pub mrn: MedicalRecordNumber,
    pub name: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Partial update for a `patients` row. Absent fields are left untouched.
///
/// `date_of_birth` and `phone` are nullable columns: `Some(None)` clears them and is sent as
/// an explicit `null`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mrn: Option<MedicalRecordNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<NonEmptyText>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub date_of_birth: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub phone: Option<Option<String>>,
}

/// Keeps a JSON `null` distinct from a missing key: a present field (even `null`) becomes
/// `Some(..)`, a missing one falls back to the `default` of `None`.
fn present_or_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl PatientUpdate {
    pub fn is_empty(&self) -> bool {
        self.mrn.is_none()
            && self.name.is_none()
            && self.date_of_birth.is_none()
            && self.gender.is_none()
            && self.phone.is_none()
    }

    /// Apply the present fields onto a row.
    pub fn apply_to(&self, record: &mut PatientRecord) {
        if let Some(mrn) = &self.mrn {
            record.mrn = mrn.as_str().to_string();
        }
        if let Some(name) = &self.name {
            record.name = name.as_str().to_string();
        }
        if let Some(dob) = self.date_of_birth {
            record.date_of_birth = dob;
        }
        if let Some(gender) = self.gender {
            record.gender = Some(gender);
        }
        if let Some(phone) = &self.phone {
            record.phone = phone.clone();
        }
    }
}
