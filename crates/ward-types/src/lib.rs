//! Validated text primitives shared across the ward crates.
//!
//! Values of these types are checked once at construction, so code further in
//! never has to re-validate names, departments or record numbers.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// The input exceeded the maximum permitted length
    #[error("Text exceeds maximum length of {max} characters")]
    TooLong { max: usize },
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the input is empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for NonEmptyText {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A hospital medical record number (MRN).
///
/// MRNs identify a person across admissions and are matched exactly. Only
/// surrounding whitespace is removed; case and punctuation are kept as issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MedicalRecordNumber(String);

impl MedicalRecordNumber {
    pub const MAX_LEN: usize = 32;

    /// Parses a medical record number.
    ///
    /// # Errors
    ///
    /// Returns [`TextError`] if the input is empty or longer than
    /// [`MedicalRecordNumber::MAX_LEN`] once trimmed.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LEN {
            return Err(TextError::TooLong { max: Self::MAX_LEN });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MedicalRecordNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MedicalRecordNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for MedicalRecordNumber {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for MedicalRecordNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for MedicalRecordNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MedicalRecordNumber::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Cardiology ").expect("should accept padded text");
        assert_eq!(text.as_str(), "Cardiology");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
    }

    #[test]
    fn mrn_is_trimmed_but_keeps_case() {
        let mrn = MedicalRecordNumber::parse(" abc-1 ").expect("should parse");
        assert_eq!(mrn.as_str(), "abc-1");
        assert_ne!(mrn, MedicalRecordNumber::parse("ABC-1").unwrap());
    }

    #[test]
    fn mrn_accepts_punctuation_and_inner_spaces() {
        assert_eq!(MedicalRecordNumber::parse("12/345").unwrap().as_str(), "12/345");
        assert_eq!(MedicalRecordNumber::parse("MRN 001").unwrap().as_str(), "MRN 001");
    }

    #[test]
    fn mrn_rejects_blank_input() {
        assert_eq!(MedicalRecordNumber::parse(" \t "), Err(TextError::Empty));
    }

    #[test]
    fn mrn_rejects_overlong_input() {
        let long = "9".repeat(MedicalRecordNumber::MAX_LEN + 1);
        assert_eq!(
            MedicalRecordNumber::parse(long),
            Err(TextError::TooLong {
                max: MedicalRecordNumber::MAX_LEN
            })
        );
    }

    #[test]
    fn mrn_deserialize_validates() {
        let ok: MedicalRecordNumber = serde_json::from_str("\" abc123 \"").unwrap();
        assert_eq!(ok.as_str(), "abc123");

        let err = serde_json::from_str::<MedicalRecordNumber>("\"\"");
        assert!(err.is_err());
    }
}
