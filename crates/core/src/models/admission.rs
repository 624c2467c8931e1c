//! Admission rows and their enumerations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;
use ward_types::NonEmptyText;

/// Lifecycle state of an admission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionStatus {
    Active,
    Discharged,
    Transferred,
}

impl AdmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AdmissionStatus::Active => "active",
            AdmissionStatus::Discharged => "discharged",
            AdmissionStatus::Transferred => "transferred",
        }
    }
}

impl std::fmt::Display for AdmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional safety classification attached to an admission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyClassification {
    Emergency,
    Observation,
    ShortStay,
}

impl SafetyClassification {
    pub fn as_str(self) -> &'static str {
        match self {
            SafetyClassification::Emergency => "emergency",
            SafetyClassification::Observation => "observation",
            SafetyClassification::ShortStay => "short_stay",
        }
    }
}

impl std::fmt::Display for SafetyClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SafetyClassification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "emergency" => Ok(SafetyClassification::Emergency),
            "observation" => Ok(SafetyClassification::Observation),
            "short_stay" => Ok(SafetyClassification::ShortStay),
            other => Err(format!("unknown safety classification '{other}'")),
        }
    }
}

/// The attending user joined onto an admission from the `users` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendingUser {
    pub id: Uuid,
    pub full_name: String,
}

/// A visit record belonging to exactly one patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub status: AdmissionStatus,
    pub admission_date: DateTime<Utc>,
    #[serde(default)]
    pub discharge_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    pub visit_number: u32,
    #[serde(default)]
    pub safety_type: Option<SafetyClassification>,
    #[serde(default)]
    pub attending_user_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attending_user: Option<AttendingUser>,
    pub created_at: DateTime<Utc>,
}

impl Admission {
    /// Ordering used for a patient's admission list: newest admission first,
    /// higher visit number first when two admissions share a date.
    pub fn newest_first(a: &Admission, b: &Admission) -> Ordering {
        b.admission_date
            .cmp(&a.admission_date)
            .then_with(|| b.visit_number.cmp(&a.visit_number))
    }
}

/// Insert payload for the `admissions` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewAdmission {
    pub patient_id: Uuid,
    pub status: AdmissionStatus,
    pub admission_date: DateTime<Utc>,
    pub department: NonEmptyText,
    pub diagnosis: NonEmptyText,
    pub visit_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_type: Option<SafetyClassification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attending_user_id: Option<Uuid>,
}
