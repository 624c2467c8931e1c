use anyhow::bail;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;
use ward_core::{
    AddPatientInput, AdmissionDetails, Gender, MedicalRecordNumber, NewPatient, NonEmptyText,
    Patient, PatientStore, PatientUpdate, SafetyClassification,
};

#[derive(Parser)]
#[command(name = "ward")]
#[command(about = "Ward patient list CLI")]
pub struct Cli {
    /// Print patients as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all patients, newest first
    List,
    /// Show one patient with its admission history
    Show {
        /// Patient UUID
        id: Uuid,
    },
    /// Admit a patient, registering them first if the MRN is new
    Add {
        /// Medical record number
        #[arg(long)]
        mrn: MedicalRecordNumber,
        /// Full name (used only when the MRN is new)
        #[arg(long)]
        name: NonEmptyText,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: Option<NaiveDate>,
        #[arg(long)]
        gender: Option<Gender>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        department: NonEmptyText,
        #[arg(long)]
        diagnosis: NonEmptyText,
        /// Attending user UUID
        #[arg(long)]
        attending: Option<Uuid>,
        /// emergency, observation or short_stay
        #[arg(long)]
        safety: Option<SafetyClassification>,
        /// Admission time (RFC 3339); defaults to now
        #[arg(long)]
        admitted: Option<DateTime<Utc>>,
    },
    /// Update patient details
    Update {
        /// Patient UUID
        id: Uuid,
        #[arg(long)]
        mrn: Option<MedicalRecordNumber>,
        #[arg(long)]
        name: Option<NonEmptyText>,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_dob")]
        dob: Option<NaiveDate>,
        #[arg(long)]
        gender: Option<Gender>,
        #[arg(long, conflicts_with = "clear_phone")]
        phone: Option<String>,
        /// Remove the recorded date of birth
        #[arg(long)]
        clear_dob: bool,
        /// Remove the recorded phone number
        #[arg(long)]
        clear_phone: bool,
    },
    /// Delete a patient and their admissions
    Delete {
        /// Patient UUID
        id: Uuid,
    },
}

/// Fail the command if the last store operation recorded an error.
async fn ensure_ok(store: &PatientStore) -> anyhow::Result<()> {
    match store.error().await {
        Some(message) => bail!(message),
        None => Ok(()),
    }
}

fn print_summary(patient: &Patient) {
    println!(
        "ID: {}, MRN: {}, Name: {}, Department: {}, Attending: {}, Last admitted: {}",
        patient.id,
        patient.mrn,
        patient.name,
        patient.department.as_deref().unwrap_or("-"),
        patient.attending_doctor.as_deref().unwrap_or("-"),
        patient
            .last_admission_date
            .map(|d| d.to_rfc3339())
            .unwrap_or_else(|| "-".into()),
    );
}

fn print_detail(patient: &Patient) {
    print_summary(patient);
    if let Some(dob) = patient.date_of_birth {
        println!("  Born: {dob}");
    }
    if let Some(gender) = patient.gender {
        println!("  Gender: {gender}");
    }
    for admission in &patient.admissions {
        println!(
            "  Visit {}: {} {} [{}] {}{}",
            admission.visit_number,
            admission.admission_date.to_rfc3339(),
            admission.department.as_deref().unwrap_or("-"),
            admission.status,
            admission.diagnosis.as_deref().unwrap_or("-"),
            admission
                .safety_type
                .map(|s| format!(" ({s})"))
                .unwrap_or_default(),
        );
    }
}

pub async fn run(cli: Cli, store: &PatientStore) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::List) => {
            store.fetch_patients().await;
            ensure_ok(store).await?;

            let patients = store.patients().await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&patients)?);
            } else if patients.is_empty() {
                println!("No patients found.");
            } else {
                patients.iter().for_each(print_summary);
            }
        }
        Some(Commands::Show { id }) => {
            store.fetch_patients().await;
            ensure_ok(store).await?;

            let Some(patient) = store.patient(id).await else {
                bail!("patient {id} not found");
            };
            store.set_selected_patient(Some(patient.clone())).await;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&patient)?);
            } else {
                print_detail(&patient);
            }
        }
        Some(Commands::Add {
            mrn,
            name,
            dob,
            gender,
            phone,
            department,
            diagnosis,
            attending,
            safety,
            admitted,
        }) => {
            let input = AddPatientInput {
                patient: NewPatient {
                    mrn,
                    name,
                    date_of_birth: dob,
                    gender,
                    phone,
                },
                admission: AdmissionDetails {
                    admission_date: admitted.unwrap_or_else(Utc::now),
                    department,
                    diagnosis,
                    attending_user_id: attending,
                    safety_type: safety,
                },
            };

            let patient = store.add_patient(input).await?;
            let visit = patient
                .latest_admission()
                .map(|a| a.visit_number)
                .unwrap_or_default();
            println!(
                "Admitted {} (MRN {}) as visit {} with ID: {}",
                patient.name, patient.mrn, visit, patient.id
            );
        }
        Some(Commands::Update {
            id,
            mrn,
            name,
            dob,
            gender,
            phone,
            clear_dob,
            clear_phone,
        }) => {
            let update = PatientUpdate {
                mrn,
                name,
                date_of_birth: if clear_dob { Some(None) } else { dob.map(Some) },
                gender,
                phone: if clear_phone { Some(None) } else { phone.map(Some) },
            };
            store.update_patient(id, update).await;
            ensure_ok(store).await?;
            println!("Updated patient: {id}");
        }
        Some(Commands::Delete { id }) => {
            store.delete_patient(id).await;
            ensure_ok(store).await?;
            println!("Deleted patient: {id}");
        }
        None => {
            println!("Use 'ward --help' for commands");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use ward_core::{InMemoryBackend, PatientsBackend};

    #[test]
    fn add_command_parses_typed_arguments() {
        let cli = Cli::try_parse_from([
            "ward",
            "add",
            "--mrn",
            " mrn-12 ",
            "--name",
            "Ada Lovelace",
            "--department",
            "Cardiology",
            "--diagnosis",
            "Chest pain",
            "--safety",
            "short-stay",
            "--dob",
            "1815-12-10",
        ])
        .expect("arguments should parse");

        match cli.command {
            Some(Commands::Add {
                mrn, safety, dob, ..
            }) => {
                assert_eq!(mrn.as_str(), "mrn-12");
                assert_eq!(safety, Some(SafetyClassification::ShortStay));
                assert_eq!(dob, NaiveDate::from_ymd_opt(1815, 12, 10));
            }
            _ => panic!("expected add command"),
        }
    }

    #[test]
    fn add_command_rejects_overlong_mrn() {
        let mrn = "9".repeat(MedicalRecordNumber::MAX_LEN + 1);
        let result = Cli::try_parse_from([
            "ward",
            "add",
            "--mrn",
            mrn.as_str(),
            "--name",
            "X",
            "--department",
            "D",
            "--diagnosis",
            "Y",
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn update_without_fields_reports_store_error() {
        let store = PatientStore::new(Arc::new(InMemoryBackend::new()));
        let id = Uuid::nil().to_string();
        let cli = Cli::try_parse_from(["ward", "update", id.as_str()]).unwrap();

        let err = run(cli, &store).await.expect_err("empty update should fail");
        assert_eq!(
            err.to_string(),
            "invalid input: patient update contains no fields"
        );
    }

    #[test]
    fn update_clear_flags_conflict_with_values() {
        let id = Uuid::nil().to_string();
        let result = Cli::try_parse_from([
            "ward",
            "update",
            id.as_str(),
            "--phone",
            "0123",
            "--clear-phone",
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn update_can_clear_phone() {
        let backend = Arc::new(InMemoryBackend::new());
        let store = PatientStore::new(backend.clone());
        let patient = store
            .add_patient(AddPatientInput {
                patient: NewPatient {
                    mrn: "MRN-3".parse().unwrap(),
                    name: "Edith Cavell".parse().unwrap(),
                    date_of_birth: None,
                    gender: None,
                    phone: Some("020 7946 0000".into()),
                },
                admission: AdmissionDetails {
                    admission_date: Utc::now(),
                    department: "Surgery".parse().unwrap(),
                    diagnosis: "Appendicitis".parse().unwrap(),
                    attending_user_id: None,
                    safety_type: None,
                },
            })
            .await
            .unwrap();

        let id = patient.id.to_string();
        let cli = Cli::try_parse_from(["ward", "update", id.as_str(), "--clear-phone"]).unwrap();
        run(cli, &store).await.expect("clearing phone should succeed");

        assert_eq!(store.patient(patient.id).await.unwrap().phone, None);
        assert_eq!(backend.fetch_patient(patient.id).await.unwrap().phone, None);
    }

    #[tokio::test]
    async fn show_unknown_patient_fails() {
        let store = PatientStore::new(Arc::new(InMemoryBackend::new()));
        let id = Uuid::new_v4();
        let arg = id.to_string();
        let cli = Cli::try_parse_from(["ward", "show", arg.as_str()]).unwrap();

        let err = run(cli, &store).await.expect_err("unknown id");
        assert_eq!(err.to_string(), format!("patient {id} not found"));
    }
}
