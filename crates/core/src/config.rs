//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into backends. Library code never reads process-wide environment variables; the
//! binary resolves values and hands a validated [`CoreConfig`] down.

use crate::constants::DEFAULT_SCHEMA;
use crate::error::{StoreError, StoreResult};
use ward_types::NonEmptyText;

/// Which backend implementation the runner should construct.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// Remote PostgREST-compatible service.
    Postgrest,
    /// Process-local tables, nothing persisted.
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgrest" | "" => Ok(BackendKind::Postgrest),
            "memory" => Ok(BackendKind::Memory),
            other => Err(StoreError::InvalidInput(format!(
                "unknown backend '{other}' (expected 'postgrest' or 'memory')"
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    backend_url: String,
    api_key: NonEmptyText,
    schema: NonEmptyText,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// The URL is stored without a trailing slash so that request paths can be appended
    /// directly.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidInput` if:
    /// - `backend_url` is not an `http://` or `https://` URL,
    /// - `api_key` is empty.
    pub fn new(backend_url: &str, api_key: &str, schema: Option<&str>) -> StoreResult<Self> {
        let backend_url = backend_url.trim().trim_end_matches('/');
        if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
            return Err(StoreError::InvalidInput(format!(
                "backend url must start with http:// or https://, got '{backend_url}'"
            )));
        }

        let api_key = NonEmptyText::new(api_key)
            .map_err(|_| StoreError::InvalidInput("backend api key cannot be empty".into()))?;

        let schema = schema_from_value(schema)?;

        Ok(Self {
            backend_url: backend_url.to_string(),
            api_key,
            schema,
        })
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn api_key(&self) -> &str {
        self.api_key.as_str()
    }

    pub fn schema(&self) -> &str {
        self.schema.as_str()
    }
}

/// Parse the database schema from an optional value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_SCHEMA`].
fn schema_from_value(value: Option<&str>) -> StoreResult<NonEmptyText> {
    let value = value.map(str::trim).filter(|v| !v.is_empty());
    let schema = value.unwrap_or(DEFAULT_SCHEMA);

    if !schema
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'_'))
    {
        return Err(StoreError::InvalidInput(format!(
            "schema '{schema}' contains invalid characters (only alphanumeric and '_' allowed)"
        )));
    }

    Ok(NonEmptyText::new(schema)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let cfg = CoreConfig::new("https://db.example.org/", "anon-key", None).unwrap();
        assert_eq!(cfg.backend_url(), "https://db.example.org");
        assert_eq!(cfg.schema(), DEFAULT_SCHEMA);
    }

    #[test]
    fn rejects_non_http_url() {
        let err = CoreConfig::new("ftp://db.example.org", "anon-key", None)
            .expect_err("ftp url should be rejected");
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[test]
    fn rejects_empty_api_key() {
        let err = CoreConfig::new("http://localhost:3000", "  ", None)
            .expect_err("empty key should be rejected");
        assert_eq!(
            err,
            StoreError::InvalidInput("backend api key cannot be empty".into())
        );
    }

    #[test]
    fn blank_schema_falls_back_to_default() {
        let cfg = CoreConfig::new("http://localhost:3000", "k", Some("   ")).unwrap();
        assert_eq!(cfg.schema(), "public");
    }

    #[test]
    fn rejects_schema_with_punctuation() {
        assert!(CoreConfig::new("http://localhost:3000", "k", Some("ward;drop")).is_err());
    }

    #[test]
    fn backend_kind_parses_known_values() {
        assert_eq!("memory".parse::<BackendKind>().unwrap(), BackendKind::Memory);
        assert_eq!(
            " PostgREST ".parse::<BackendKind>().unwrap(),
            BackendKind::Postgrest
        );
        assert!("sqlite".parse::<BackendKind>().is_err());
    }
}
