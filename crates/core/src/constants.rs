//! Constants used throughout the ward core crate.
//!
//! Table names are shared by every backend so that the in-memory and HTTP
//! implementations agree on what they are addressing.

/// Remote table holding patient identity rows.
pub const PATIENTS_TABLE: &str = "patients";

/// Remote table holding admission rows (one patient, many admissions).
pub const ADMISSIONS_TABLE: &str = "admissions";

/// Schema used when none is configured.
pub const DEFAULT_SCHEMA: &str = "public";

/// Visit number assigned to a patient's first admission.
pub const FIRST_VISIT_NUMBER: u32 = 1;
