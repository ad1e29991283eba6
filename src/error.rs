//! Error types for the parapluie-onboarding library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the onboarding flow.

use thiserror::Error;

/// Errors that can occur during the onboarding flow.
#[derive(Error, Debug)]
pub enum OnboardingError {
    /// Field-level validation failure; blocks the step transition, shown inline
    #[error("{0}")]
    Validation(String),

    /// Authentication identity creation or sign-in failure
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Profile insert failed after retry exhaustion (core-identity write)
    #[error("Profile creation failed after {attempts} attempts: {message}")]
    ProfileCreation {
        /// Number of insert attempts performed
        attempts: u32,
        /// Underlying backend error message
        message: String,
    },

    /// Invitation-code uniqueness probe exhausted its attempt budget
    #[error("Failed to generate a unique invitation code after {0} attempts")]
    CodeGenerationExhausted(u32),

    /// Trusted-contact invitation could not be persisted
    #[error("Invitation error: {0}")]
    Invitation(String),

    /// OAuth redirect matched but no session was found
    #[error("Auth callback error: {0}")]
    Callback(String),

    /// Event applied to a step that does not accept it
    #[error("Invalid step for this operation: expected {expected}, at {actual}")]
    InvalidStep {
        /// Step the operation is valid on
        expected: &'static str,
        /// Step the flow is currently at
        actual: &'static str,
    },

    /// Another submission is already in flight for the current step
    #[error("Operation already in progress")]
    Busy,

    /// Local key-value store errors
    #[error("Local store error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Binary serialization errors
    #[error("Binary serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with OnboardingError
pub type Result<T> = std::result::Result<T, OnboardingError>;

impl From<anyhow::Error> for OnboardingError {
    fn from(err: anyhow::Error) -> Self {
        OnboardingError::Other(err.to_string())
    }
}

impl From<sled::Error> for OnboardingError {
    fn from(err: sled::Error) -> Self {
        OnboardingError::Storage(err.to_string())
    }
}
