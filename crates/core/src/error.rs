use ward_types::TextError;

/// Failures reported by a [`PatientsBackend`](crate::backend::PatientsBackend).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("{message} (status {status})")]
    Api { status: u16, message: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("expected a single {what} row, got {count}")]
    MultipleRows { what: String, count: usize },
    #[error("{0}")]
    Injected(String),
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        BackendError::Decode(e.to_string())
    }
}

impl BackendError {
    /// The message as reported by the service, without the status or the
    /// transport prefix added by `Display`.
    pub fn message(&self) -> String {
        match self {
            BackendError::Request(message)
            | BackendError::Decode(message)
            | BackendError::Injected(message)
            | BackendError::Api { message, .. } => message.clone(),
            BackendError::NotFound(_) | BackendError::MultipleRows { .. } => self.to_string(),
        }
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Errors surfaced by the [`PatientStore`](crate::store::PatientStore).
///
/// Every remote failure collapses into [`StoreError::Remote`] carrying the
/// backend's message; the store does not distinguish network, validation or
/// not-found failures coming back from the service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Remote(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<BackendError> for StoreError {
    fn from(e: BackendError) -> Self {
        StoreError::Remote(e.message())
    }
}

impl From<TextError> for StoreError {
    fn from(e: TextError) -> Self {
        StoreError::InvalidInput(e.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_keeps_backend_message() {
        let err = StoreError::from(BackendError::Injected("connection reset".into()));
        assert_eq!(err.to_string(), "connection reset");
    }

    #[test]
    fn remote_error_drops_status_and_prefix() {
        let api = BackendError::Api {
            status: 409,
            message: "duplicate key value violates unique constraint".into(),
        };
        assert_eq!(
            StoreError::from(api),
            StoreError::Remote("duplicate key value violates unique constraint".into())
        );

        let transport = BackendError::Request("error sending request".into());
        assert_eq!(StoreError::from(transport).to_string(), "error sending request");

        let missing = BackendError::NotFound("patient".into());
        assert_eq!(StoreError::from(missing).to_string(), "patient not found");
    }

    #[test]
    fn api_error_display_includes_status() {
        let err = BackendError::Api {
            status: 409,
            message: "duplicate key value violates unique constraint".into(),
        };
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint (status 409)"
        );
    }
}
