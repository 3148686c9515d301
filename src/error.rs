//! Error types for Pubflow.
//!
//! All errors in Pubflow are represented by the `PubflowError` enum. Every
//! variant is per-call and recoverable: the caller may re-issue a corrected
//! request.

use std::{collections::BTreeMap, convert::Infallible, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field → message mapping produced by validation.
///
/// Keys are field names (`name`, `interval`, `apiConfig.botToken`, ...), values
/// are one of the codes `required`, `invalid` or `invalid_url`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        field: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.0.insert(field.into(), message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(
        &self,
        field: &str,
    ) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(
        &self,
        field: &str,
    ) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Turns a non-empty mapping into `Err(PubflowError::Validation)`.
    pub fn into_result(self) -> Result<(), PubflowError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(PubflowError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Unified error type for all Pubflow operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum PubflowError {
    /// A candidate record broke one or more field rules.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The operation referenced a record that does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Malformed call, e.g. an unknown status value.
    #[error("{0}")]
    InvalidArgument(String),

    /// The persistence adapter failed or timed out.
    #[error("{0}")]
    Persistence(String),

    /// The credential reachability check failed or timed out.
    #[error("{0}")]
    Reachability(String),

    /// Configuration parsing errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML).
    #[error("{0}")]
    Convert(String),
}

impl From<serde_json::Error> for PubflowError {
    fn from(error: serde_json::Error) -> Self {
        PubflowError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for PubflowError {
    fn from(error: toml::de::Error) -> Self {
        PubflowError::Config(error.to_string())
    }
}

impl From<Infallible> for PubflowError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl From<ValidationErrors> for PubflowError {
    fn from(errors: ValidationErrors) -> Self {
        PubflowError::Validation(errors)
    }
}
