//! Backend collaborator boundary.
//!
//! The hosted backend (auth + row storage) is treated as an opaque
//! collaborator behind the [`BackendClient`] trait. The flow only depends on
//! the operations listed here; everything else about the backend is out of
//! scope. Errors carry enough classification to drive the sequencer's retry
//! policy (foreign-key violations) and the duplicate-code signal.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    ContactMethod, NewSecuritySettings, NewTrustedContact, NewUserProfile, NewUserStats, Session,
    SignupMetadata, TrustedContactInvitation,
};

/// Postgres error code for a foreign-key violation.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
/// Postgres error code for a unique-constraint violation.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Errors returned by the backend collaborator.
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    /// Referenced record (the auth identity) not yet visible to the write target
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Unique-constraint conflict (duplicate invitation code)
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Email already has an account
    #[error("email already registered: {0}")]
    AlreadyRegistered(String),

    /// Auth operation failed
    #[error("auth error: {0}")]
    Auth(String),

    /// Backend unreachable or unavailable
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Postgres-style error code for this failure class, when one applies.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            BackendError::ForeignKeyViolation(_) => Some(FOREIGN_KEY_VIOLATION),
            BackendError::DuplicateKey(_) => Some(UNIQUE_VIOLATION),
            _ => None,
        }
    }

    /// Whether this is the retryable "identity not yet visible" class.
    #[must_use]
    pub const fn is_foreign_key_violation(&self) -> bool {
        matches!(self, BackendError::ForeignKeyViolation(_))
    }

    /// Whether this is a unique-constraint conflict.
    #[must_use]
    pub const fn is_duplicate_key(&self) -> bool {
        matches!(self, BackendError::DuplicateKey(_))
    }
}

/// Result alias for backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Operations the onboarding flow needs from the hosted backend.
///
/// All calls are asynchronous and uncancellable once started; the flow
/// serializes them per step with a busy flag.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Create an email/password identity with profile metadata attached.
    async fn sign_up_with_password(
        &self,
        email: &str,
        password: &str,
        metadata: SignupMetadata,
    ) -> BackendResult<Session>;

    /// Open an external OAuth flow for the given provider.
    ///
    /// The redirect lands back in the app via the registered URL scheme; the
    /// resulting session is picked up with [`Self::current_session`].
    async fn sign_in_with_oauth(&self, provider: &str, redirect_to: &str) -> BackendResult<()>;

    /// Create an anonymous identity (senior fallback, no verification).
    async fn sign_in_anonymously(&self) -> BackendResult<Session>;

    /// Fetch the current session, if any.
    async fn current_session(&self) -> BackendResult<Option<Session>>;

    /// Insert the user-profile row keyed by the auth identity.
    async fn insert_profile(&self, profile: NewUserProfile) -> BackendResult<()>;

    /// Insert the security-settings row (auxiliary).
    async fn insert_security_settings(&self, settings: NewSecuritySettings) -> BackendResult<()>;

    /// Insert the user-stats row (auxiliary).
    async fn insert_user_stats(&self, stats: NewUserStats) -> BackendResult<()>;

    /// Insert a trusted-contact invitation row.
    async fn insert_trusted_contact(
        &self,
        contact: NewTrustedContact,
    ) -> BackendResult<TrustedContactInvitation>;

    /// Look up an invitation by its code (uniqueness probe).
    async fn find_invitation_by_code(
        &self,
        code: &str,
    ) -> BackendResult<Option<TrustedContactInvitation>>;

    /// Record that the invitation was shared and how.
    async fn mark_invitation_sent(
        &self,
        code: &str,
        method: ContactMethod,
        at: DateTime<Utc>,
    ) -> BackendResult<()>;

    /// Record that the contact accepted the invitation.
    async fn mark_invitation_accepted(&self, code: &str, at: DateTime<Utc>) -> BackendResult<()>;

    /// Flag the profile as having completed onboarding.
    async fn mark_onboarding_complete(&self, user_id: &str, at: DateTime<Utc>) -> BackendResult<()>;
}
