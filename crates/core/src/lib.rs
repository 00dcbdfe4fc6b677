//! Shared primitives for all Rust crates in TerraSense.

#![forbid(unsafe_code)]

/// Actor primitives used for audit stamps.
pub mod auth;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use auth::Actor;

/// Result type used across TerraSense crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Identifier of one form session; a new one is issued every time a parameter screen mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a random session identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Required inputs that were empty when a submission was attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingRequired {
    /// Required field names holding empty values.
    pub fields: Vec<String>,
    /// Relationship dimensions with no selected value.
    pub dimensions: Vec<String>,
}

impl MissingRequired {
    /// Returns true when nothing is missing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.dimensions.is_empty()
    }
}

impl Display for MissingRequired {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if !self.fields.is_empty() {
            parts.push(format!("fields [{}]", self.fields.join(", ")));
        }
        if !self.dimensions.is_empty() {
            parts.push(format!("dimensions [{}]", self.dimensions.join(", ")));
        }

        if parts.is_empty() {
            return formatter.write_str("nothing missing");
        }

        write!(formatter, "missing required {}", parts.join(" and "))
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Required fields or relationship dimensions are empty; nothing was submitted.
    #[error("validation error: {0}")]
    MissingRequired(MissingRequired),

    /// The snapshot a diff was computed from no longer matches the stored rows.
    #[error("stale snapshot: {0}")]
    StaleSnapshot(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state or was rejected by the store.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
