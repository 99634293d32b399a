//! Error taxonomy for the extension runtime (spec §7).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias used throughout the runtime.
pub type ExtResult<T> = Result<T, ExtError>;

/// Broad category an [`ExtError`] falls into; used by callers deciding
/// whether to retry, surface to a user, or treat as a programming bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    Transient,
    Configuration,
    Dependency,
    Resource,
    Runtime,
    Validation,
}

/// Closed taxonomy of failure kinds (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ConfigurationMissing,
    FileNotFound,
    InvalidManifest,
    MissingDependency,
    VersionConflict,
    InitializationFailed,
    LanguageModuleNotLoaded,
    CircularDependency,
    ValidationFailed,
    DisabledByPolicy,
    MaxRetriesExceeded,
}

impl ErrorKind {
    /// The category this kind belongs to by default.
    pub fn category(self) -> ErrorCategory {
        match self {
            ErrorKind::ConfigurationMissing => ErrorCategory::Configuration,
            ErrorKind::FileNotFound => ErrorCategory::Resource,
            ErrorKind::InvalidManifest => ErrorCategory::Validation,
            ErrorKind::MissingDependency => ErrorCategory::Dependency,
            ErrorKind::VersionConflict => ErrorCategory::Dependency,
            ErrorKind::InitializationFailed => ErrorCategory::Runtime,
            ErrorKind::LanguageModuleNotLoaded => ErrorCategory::Runtime,
            ErrorKind::CircularDependency => ErrorCategory::Dependency,
            ErrorKind::ValidationFailed => ErrorCategory::Validation,
            ErrorKind::DisabledByPolicy => ErrorCategory::Configuration,
            ErrorKind::MaxRetriesExceeded => ErrorCategory::Transient,
        }
    }
}

/// The runtime's single error type. Carries enough structure for a caller
/// to decide whether to retry, and for a stage to turn it into an
/// extension-level error message (spec §7 "user-visible behavior").
#[derive(Debug, Clone, Error)]
#[error("{kind:?}: {message}")]
pub struct ExtError {
    pub kind: ErrorKind,
    pub message: String,
    pub category: ErrorCategory,
    pub retryable: bool,
    pub retry_delay: Option<Duration>,
}

impl ExtError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            category: kind.category(),
            retryable: false,
            retry_delay: None,
        }
    }

    pub fn retryable(mut self, delay: Duration) -> Self {
        self.retryable = true;
        self.retry_delay = Some(delay);
        self
    }

    pub fn configuration_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigurationMissing, message)
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::FileNotFound,
            format!("file not found: {}", path.into()),
        )
    }

    pub fn invalid_manifest(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidManifest, message)
    }

    pub fn missing_dependency(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            ErrorKind::MissingDependency,
            format!("Dependency '{name}' not found"),
        )
    }

    pub fn version_conflict(
        name: impl Into<String>,
        required: impl Into<String>,
        available: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self::new(
            ErrorKind::VersionConflict,
            format!(
                "'{name}' version conflict: required: {}, available: {}",
                required.into(),
                available.into()
            ),
        )
    }

    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InitializationFailed, message)
    }

    pub fn language_module_not_loaded(language: impl Into<String>) -> Self {
        let language = language.into();
        Self::new(
            ErrorKind::LanguageModuleNotLoaded,
            format!("Language module '{language}' is missing"),
        )
    }

    pub fn circular_dependency(cycle_description: impl Into<String>) -> Self {
        Self::new(ErrorKind::CircularDependency, cycle_description)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationFailed, message)
    }

    pub fn disabled_by_policy(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DisabledByPolicy, message)
    }

    pub fn max_retries_exceeded(operation: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::MaxRetriesExceeded,
            format!("max retries exceeded: {}", operation.into()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_to_expected_category() {
        assert_eq!(
            ErrorKind::CircularDependency.category(),
            ErrorCategory::Dependency
        );
        assert_eq!(
            ErrorKind::MaxRetriesExceeded.category(),
            ErrorCategory::Transient
        );
    }

    #[test]
    fn missing_dependency_message_matches_spec_wording() {
        let err = ExtError::missing_dependency("delta");
        assert_eq!(err.message, "Dependency 'delta' not found");
        assert_eq!(err.kind, ErrorKind::MissingDependency);
    }

    #[test]
    fn version_conflict_mentions_both_sides() {
        let err = ExtError::version_conflict("lib", ">= 2.0.0", "1.5.0");
        assert!(err.message.contains("available: 1.5.0"));
        assert!(err.message.contains("required: >= 2.0.0"));
    }
}
