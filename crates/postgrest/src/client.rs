use crate::query;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;
use ward_core::backend::{maybe_single_row, single_row};
use ward_core::constants::{ADMISSIONS_TABLE, PATIENTS_TABLE};
use ward_core::{
    Admission, BackendError, BackendResult, CoreConfig, MedicalRecordNumber, NewAdmission,
    NewPatient, PatientRecord, PatientUpdate, PatientsBackend,
};

const RETURN_REPRESENTATION: &str = "return=representation";
const RETURN_MINIMAL: &str = "return=minimal";

/// Error body returned by PostgREST on failed requests.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VisitNumberRow {
    visit_number: u32,
}

fn request_error(e: reqwest::Error) -> BackendError {
    BackendError::Request(e.to_string())
}

/// Turn a non-success response body into a [`BackendError::Api`].
///
/// Uses the JSON `message` field when present, otherwise the raw body, otherwise the status
/// text. `code` and `details` are only logged.
pub(crate) fn api_error(status: u16, body: &str) -> BackendError {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            message: Some(message),
            details,
            code,
        }) => {
            tracing::debug!(
                status,
                code = code.as_deref().unwrap_or("-"),
                details = details.as_deref().unwrap_or("-"),
                "PostgREST error body"
            );
            message
        }
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("request failed")
            .to_string(),
    };

    BackendError::Api { status, message }
}

/// [`PatientsBackend`] speaking to a PostgREST endpoint over HTTP.
pub struct PostgrestBackend {
    rest_url: String,
    api_key: String,
    schema: String,
    client: reqwest::Client,
}

impl PostgrestBackend {
    /// Create a backend for the REST root in `cfg` (for hosted services this is usually the
    /// `.../rest/v1` URL).
    pub fn new(cfg: &CoreConfig) -> Self {
        Self::with_client(cfg, reqwest::Client::new())
    }

    pub fn with_client(cfg: &CoreConfig, client: reqwest::Client) -> Self {
        Self {
            rest_url: cfg.backend_url().to_string(),
            api_key: cfg.api_key().to_string(),
            schema: cfg.schema().to_string(),
            client,
        }
    }

    pub(crate) fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("Accept-Profile", &self.schema)
            .header("Content-Profile", &self.schema)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
    }

    async fn check(response: Response) -> BackendResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = api_error(status.as_u16(), &body);
        tracing::warn!(status = status.as_u16(), error = %err, "PostgREST request failed");
        Err(err)
    }

    async fn rows<T: DeserializeOwned>(&self, builder: RequestBuilder) -> BackendResult<Vec<T>> {
        let response = builder.send().await.map_err(request_error)?;
        let response = Self::check(response).await?;
        let bytes = response.bytes().await.map_err(request_error)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn execute(&self, builder: RequestBuilder) -> BackendResult<()> {
        let response = builder.send().await.map_err(request_error)?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl PatientsBackend for PostgrestBackend {
    async fn list_patients(&self) -> BackendResult<Vec<PatientRecord>> {
        tracing::debug!("GET {PATIENTS_TABLE} with admissions");
        self.rows(
            self.request(Method::GET, PATIENTS_TABLE)
                .query(&query::list_patients()),
        )
        .await
    }

    async fn fetch_patient(&self, id: Uuid) -> BackendResult<PatientRecord> {
        tracing::debug!(patient_id = %id, "GET {PATIENTS_TABLE} by id");
        let rows = self
            .rows(
                self.request(Method::GET, PATIENTS_TABLE)
                    .query(&query::patient_with_admissions(id)),
            )
            .await?;
        single_row(rows, "patient")
    }

    async fn find_patient_by_mrn(
        &self,
        mrn: &MedicalRecordNumber,
    ) -> BackendResult<Option<PatientRecord>> {
        tracing::debug!(mrn = %mrn, "GET {PATIENTS_TABLE} by mrn");
        let rows = self
            .rows(
                self.request(Method::GET, PATIENTS_TABLE)
                    .query(&query::patient_by_mrn(mrn)),
            )
            .await?;
        maybe_single_row(rows, "patient")
    }

    async fn max_visit_number(&self, patient_id: Uuid) -> BackendResult<Option<u32>> {
        let rows: Vec<VisitNumberRow> = self
            .rows(
                self.request(Method::GET, ADMISSIONS_TABLE)
                    .query(&query::latest_visit_number(patient_id)),
            )
            .await?;
        Ok(rows.first().map(|r| r.visit_number))
    }

    async fn insert_patient(&self, patient: &NewPatient) -> BackendResult<PatientRecord> {
        let rows = self
            .rows(
                self.request(Method::POST, PATIENTS_TABLE)
                    .header("Prefer", RETURN_REPRESENTATION)
                    .json(patient),
            )
            .await?;
        single_row(rows, "patient")
    }

    async fn insert_admission(&self, admission: &NewAdmission) -> BackendResult<Admission> {
        let rows = self
            .rows(
                self.request(Method::POST, ADMISSIONS_TABLE)
                    .header("Prefer", RETURN_REPRESENTATION)
                    .json(admission),
            )
            .await?;
        single_row(rows, "admission")
    }

    async fn update_patient(
        &self,
        id: Uuid,
        update: &PatientUpdate,
    ) -> BackendResult<PatientRecord> {
        let rows = self
            .rows(
                self.request(Method::PATCH, PATIENTS_TABLE)
                    .header("Prefer", RETURN_REPRESENTATION)
                    .query(&query::by_id(id))
                    .json(update),
            )
            .await?;
        single_row(rows, "patient")
    }

    async fn delete_patient(&self, id: Uuid) -> BackendResult<()> {
        self.execute(
            self.request(Method::DELETE, PATIENTS_TABLE)
                .header("Prefer", RETURN_MINIMAL)
                .query(&query::by_id(id)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> PostgrestBackend {
        let cfg = CoreConfig::new("https://db.example.org/rest/v1/", "anon-key", Some("ward"))
            .expect("valid config");
        PostgrestBackend::new(&cfg)
    }

    #[test]
    fn request_carries_auth_and_schema_headers() {
        let request = backend()
            .request(Method::GET, PATIENTS_TABLE)
            .query(&query::list_patients())
            .build()
            .expect("request should build");

        assert_eq!(request.url().path(), "/rest/v1/patients");
        let headers = request.headers();
        assert_eq!(headers["apikey"], "anon-key");
        assert_eq!(headers[AUTHORIZATION], "Bearer anon-key");
        assert_eq!(headers["Accept-Profile"], "ward");
        assert_eq!(headers["Content-Profile"], "ward");

        let pairs: Vec<(String, String)> = request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("select".to_string(), query::PATIENT_WITH_ADMISSIONS.to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn api_error_keeps_only_the_message() {
        let body = r#"{"code":"23505","details":"Key (mrn)=(A1) already exists.","hint":null,"message":"duplicate key value violates unique constraint \"patients_mrn_key\""}"#;
        match api_error(409, body) {
            BackendError::Api { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(
                    message,
                    "duplicate key value violates unique constraint \"patients_mrn_key\""
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn api_error_falls_back_to_body_then_status() {
        assert_eq!(
            api_error(502, "upstream unavailable").to_string(),
            "upstream unavailable (status 502)"
        );
        assert_eq!(api_error(404, "").to_string(), "Not Found (status 404)");
    }

    #[test]
    fn patient_rows_decode_from_embedded_select() {
        let body = r#"[{
            "id": "0f3c5a8e-1d2b-4c6d-8e9f-0a1b2c3d4e5f",
            "mrn": "MRN-9",
            "name": "Rosalind Franklin",
            "date_of_birth": "1920-07-25",
            "gender": "female",
            "phone": null,
            "created_at": "2024-04-01T10:00:00+00:00",
            "admissions": [{
                "id": "7b0a3c3e-56a4-4bde-9d52-2f3a8a0d1c11",
                "patient_id": "0f3c5a8e-1d2b-4c6d-8e9f-0a1b2c3d4e5f",
                "status": "active",
                "admission_date": "2024-04-01T10:05:00+00:00",
                "discharge_date": null,
                "department": "Respiratory",
                "diagnosis": "Pleurisy",
                "visit_number": 1,
                "safety_type": "observation",
                "attending_user_id": null,
                "attending_user": null,
                "created_at": "2024-04-01T10:05:01+00:00"
            }]
        }]"#;

        let rows: Vec<PatientRecord> = serde_json::from_str(body).expect("should decode");
        let patient = ward_core::Patient::from_record(rows.into_iter().next().unwrap());
        assert_eq!(patient.department.as_deref(), Some("Respiratory"));
        assert_eq!(patient.attending_doctor, None);
        assert_eq!(
            patient.admissions[0].safety_type,
            Some(ward_core::SafetyClassification::Observation)
        );
    }

    #[tokio::test]
    async fn unreachable_service_surfaces_request_error() {
        let cfg = CoreConfig::new("http://127.0.0.1:9", "anon-key", None).unwrap();
        let backend = PostgrestBackend::new(&cfg);

        let err = backend
            .list_patients()
            .await
            .expect_err("nothing listens on the discard port");
        assert!(matches!(err, BackendError::Request(_)));
    }
}
