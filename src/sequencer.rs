//! Backend write sequencer.
//!
//! Given a completed draft and an identity, persists the record group that
//! activates protection: profile, security settings, user stats, and the
//! optional trusted-contact invitation. Writes are issued in order; each
//! step's failure handling is evaluated before the next write goes out.
//!
//! Failure policy follows the error taxonomy: the profile insert is a
//! core-identity write (retried on foreign-key violations, fatal after
//! exhaustion), security settings and stats are auxiliary (logged and
//! swallowed), and invitation failures block only the invitation sub-flow.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::backend::{BackendClient, BackendError};
use crate::config::AppConfig;
use crate::error::{OnboardingError, Result};
use crate::invitation::CodeGenerator;
use crate::metrics::MetricsCollector;
use crate::models::{
    AuthMethod, NewSecuritySettings, NewTrustedContact, NewUserProfile, NewUserStats,
    OnboardingDraft, Session, SignupMetadata, TrustedContactRequest, TrustedContactInvitation,
};
use crate::store::LocalStore;

/// Orchestrates the ordered backend writes that finalize onboarding.
pub struct OnboardingSequencer {
    backend: Arc<dyn BackendClient>,
    store: Arc<LocalStore>,
    generator: CodeGenerator,
    settle_delay: Duration,
    retry_backoff: Duration,
    max_profile_attempts: u32,
    timezone: String,
}

impl OnboardingSequencer {
    /// Build a sequencer from the application configuration.
    pub fn new(backend: Arc<dyn BackendClient>, store: Arc<LocalStore>, config: &AppConfig) -> Self {
        Self {
            backend,
            store,
            generator: CodeGenerator {
                code_length: config.invitation.code_length,
                max_attempts: config.invitation.max_attempts,
                expiry_hours: config.invitation.expiry_hours,
            },
            settle_delay: Duration::from_millis(config.backend.settle_delay_ms),
            retry_backoff: Duration::from_millis(config.backend.retry_backoff_ms),
            max_profile_attempts: config.backend.max_profile_attempts,
            timezone: config.onboarding.timezone.clone(),
        }
    }

    /// Code generator currently in effect.
    #[must_use]
    pub const fn generator(&self) -> &CodeGenerator {
        &self.generator
    }

    /// Local flag store backing this sequencer.
    #[must_use]
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Use an existing session, or establish one for the user.
    ///
    /// Tries the current session first, then an anonymous sign-in. If the
    /// backend rejects both, falls back to a locally persisted
    /// pseudo-identity so the user is never blocked from proceeding; that
    /// path also marks onboarding complete locally, since no further backend
    /// write can succeed for it.
    pub async fn ensure_identity(&self) -> Result<Session> {
        if let Ok(Some(session)) = self.backend.current_session().await {
            debug!(user_id = %session.user_id, "reusing existing session");
            return Ok(session);
        }

        match self.backend.sign_in_anonymously().await {
            Ok(session) => {
                info!(user_id = %session.user_id, "anonymous session created");
                self.store.set_user_id(&session.user_id)?;
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, "anonymous sign-in failed, storing identity locally");
                MetricsCollector::record_error("auth");
                let user_id = format!("temp-user-{}", Utc::now().timestamp_millis());
                self.store.set_user_id(&user_id)?;
                self.store.set_onboarding_completed()?;
                Ok(Session {
                    user_id,
                    method: AuthMethod::Local,
                })
            }
        }
    }

    /// Create an email/password identity with the draft's metadata attached.
    pub async fn create_password_account(
        &self,
        email: &str,
        password: &str,
        draft: &OnboardingDraft,
    ) -> Result<Session> {
        let metadata = SignupMetadata {
            first_name: draft.name.clone(),
            phone: draft.phone.clone(),
            language: draft.language.clone(),
        };

        let session = self
            .backend
            .sign_up_with_password(email, password, metadata)
            .await
            .map_err(|e| match e {
                BackendError::AlreadyRegistered(_) => {
                    OnboardingError::Validation("Cet email est déjà utilisé".to_string())
                }
                other => OnboardingError::Auth(other.to_string()),
            })?;

        self.store.set_user_id(&session.user_id)?;
        Ok(session)
    }

    /// Persist the profile, security settings, and stats for a new identity.
    ///
    /// The profile insert waits a short settle delay for the auth row to
    /// become visible, then tries up to `max_profile_attempts` times,
    /// backing off between attempts on foreign-key violations only. Any
    /// other error, or retry exhaustion, is fatal and leaves the identity
    /// without a profile. The two auxiliary inserts are best-effort.
    pub async fn provision_account(
        &self,
        user_id: &str,
        draft: &OnboardingDraft,
        email: Option<&str>,
    ) -> Result<()> {
        let profile = NewUserProfile {
            id: user_id.to_string(),
            first_name: draft.name.clone(),
            phone: draft.phone.clone(),
            email: email.map(str::to_string),
            language: draft.language.clone(),
            timezone: self.timezone.clone(),
            onboarding_completed: false,
        };

        // Let the auth identity commit before the first referencing write
        tokio::time::sleep(self.settle_delay).await;

        self.insert_profile_with_retry(profile).await?;

        // Auxiliary writes: log and continue on failure
        let settings = NewSecuritySettings::from_grants(user_id, draft.permissions);
        if let Err(e) = self.backend.insert_security_settings(settings).await {
            warn!(error = %e, "security settings creation failed, continuing");
            MetricsCollector::record_error("auxiliary");
        }

        let stats = NewUserStats {
            user_id: user_id.to_string(),
            since: Utc::now(),
        };
        if let Err(e) = self.backend.insert_user_stats(stats).await {
            warn!(error = %e, "user stats creation failed, continuing");
            MetricsCollector::record_error("auxiliary");
        }

        info!(user_id, "account provisioned");
        Ok(())
    }

    async fn insert_profile_with_retry(&self, profile: NewUserProfile) -> Result<()> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            let started = std::time::Instant::now();

            match self.backend.insert_profile(profile.clone()).await {
                Ok(()) => {
                    MetricsCollector::record_backend_operation(
                        "insert_profile",
                        started.elapsed(),
                        true,
                    );
                    MetricsCollector::record_profile_attempts(attempt);
                    return Ok(());
                }
                Err(e) => {
                    MetricsCollector::record_backend_operation(
                        "insert_profile",
                        started.elapsed(),
                        false,
                    );

                    if e.is_foreign_key_violation() && attempt < self.max_profile_attempts {
                        debug!(attempt, "profile insert hit foreign-key violation, retrying");
                        tokio::time::sleep(self.retry_backoff).await;
                        continue;
                    }

                    MetricsCollector::record_error("profile_creation");
                    return Err(OnboardingError::ProfileCreation {
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    /// Generate a code and persist the trusted-contact invitation.
    ///
    /// A duplicate-key conflict on insert means another invitation claimed
    /// the code between the uniqueness probe and the write; one regeneration
    /// is attempted with the conflict as the signal.
    pub async fn create_invitation(
        &self,
        user_id: &str,
        request: &TrustedContactRequest,
    ) -> Result<TrustedContactInvitation> {
        let code = self.generator.generate_unique(self.backend.as_ref()).await?;

        let invitation = match self.insert_invitation(user_id, request, code).await {
            Ok(invitation) => invitation,
            Err(e) if e.is_duplicate_key() => {
                // Another invitation claimed the code between probe and insert
                warn!("invitation code collided at insert, regenerating");
                let code = self.generator.generate_unique(self.backend.as_ref()).await?;
                self.insert_invitation(user_id, request, code)
                    .await
                    .map_err(|e| {
                        MetricsCollector::record_error("invitation");
                        OnboardingError::Invitation(e.to_string())
                    })?
            }
            Err(e) => {
                MetricsCollector::record_error("invitation");
                return Err(OnboardingError::Invitation(e.to_string()));
            }
        };

        self.store.set_invitation_code(&invitation.invitation_code)?;
        info!(code = %invitation.invitation_code, "trusted-contact invitation created");
        Ok(invitation)
    }

    async fn insert_invitation(
        &self,
        user_id: &str,
        request: &TrustedContactRequest,
        code: String,
    ) -> std::result::Result<TrustedContactInvitation, BackendError> {
        let now = Utc::now();
        let contact = NewTrustedContact {
            senior_id: user_id.to_string(),
            name: request.name.trim().to_string(),
            relationship: request.relationship.clone(),
            phone: request.phone.clone(),
            email: request.email.clone(),
            preferred_method: request.preferred_method,
            invitation_code: code,
            invitation_expires_at: self.generator.expires_at(now),
            invited_at: now,
            permissions: crate::models::ContactPermissions::default(),
        };

        self.backend.insert_trusted_contact(contact).await
    }

    /// Record that the invitation was shared; best-effort.
    pub async fn mark_invitation_shared(
        &self,
        code: &str,
        method: crate::models::ContactMethod,
    ) -> Result<()> {
        if let Err(e) = self
            .backend
            .mark_invitation_sent(code, method, Utc::now())
            .await
        {
            warn!(error = %e, "failed to record invitation share method");
        }
        Ok(())
    }

    /// Mark onboarding complete, locally first, then on the profile.
    ///
    /// The local flag is authoritative for this device; the backend update
    /// is best-effort and its failure is logged only.
    pub async fn complete(&self, user_id: &str) -> Result<()> {
        self.store.set_onboarding_completed()?;

        if let Err(e) = self
            .backend
            .mark_onboarding_complete(user_id, Utc::now())
            .await
        {
            warn!(error = %e, "failed to flag onboarding complete on profile");
            MetricsCollector::record_error("auxiliary");
        }

        info!(user_id, "onboarding complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackendClient;
    use crate::models::ContactMethod;

    fn test_store() -> (Arc<LocalStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalStore::open(dir.path()).expect("store");
        (Arc::new(store), dir)
    }

    fn draft() -> OnboardingDraft {
        OnboardingDraft {
            name: "Marie".to_string(),
            phone: Some("+15145551234".to_string()),
            ..OnboardingDraft::default()
        }
    }

    fn sequencer(backend: MockBackendClient) -> (OnboardingSequencer, tempfile::TempDir) {
        let (store, dir) = test_store();
        let seq = OnboardingSequencer::new(Arc::new(backend), store, &AppConfig::default());
        (seq, dir)
    }

    #[tokio::test(start_paused = true)]
    async fn profile_insert_retries_on_foreign_key_then_succeeds() {
        let mut backend = MockBackendClient::new();
        let mut seq = mockall::Sequence::new();

        backend
            .expect_insert_profile()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(BackendError::ForeignKeyViolation("auth row missing".into())));
        backend
            .expect_insert_profile()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        backend
            .expect_insert_security_settings()
            .times(1)
            .returning(|_| Ok(()));
        backend
            .expect_insert_user_stats()
            .times(1)
            .returning(|_| Ok(()));

        let start = tokio::time::Instant::now();
        let (seq, _dir) = sequencer(backend);
        let result = seq.provision_account("user-1", &draft(), None).await;
        assert!(result.is_ok());

        // Settle delay plus one backoff per failed attempt, under the paused clock
        assert_eq!(start.elapsed(), Duration::from_millis(500 + 1000 + 1000));
    }

    #[tokio::test(start_paused = true)]
    async fn profile_insert_gives_up_after_three_foreign_key_failures() {
        let mut backend = MockBackendClient::new();
        backend
            .expect_insert_profile()
            .times(3)
            .returning(|_| Err(BackendError::ForeignKeyViolation("auth row missing".into())));

        let (seq, _dir) = sequencer(backend);
        let result = seq.provision_account("user-1", &draft(), None).await;
        match result {
            Err(OnboardingError::ProfileCreation { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected ProfileCreation error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn non_foreign_key_profile_error_is_not_retried() {
        let mut backend = MockBackendClient::new();
        backend
            .expect_insert_profile()
            .times(1)
            .returning(|_| Err(BackendError::Other("boom".into())));

        let (seq, _dir) = sequencer(backend);
        let result = seq.provision_account("user-1", &draft(), None).await;
        match result {
            Err(OnboardingError::ProfileCreation { attempts, .. }) => assert_eq!(attempts, 1),
            other => panic!("expected ProfileCreation error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn auxiliary_write_failures_are_swallowed() {
        let mut backend = MockBackendClient::new();
        backend.expect_insert_profile().times(1).returning(|_| Ok(()));
        backend
            .expect_insert_security_settings()
            .times(1)
            .returning(|_| Err(BackendError::Other("settings down".into())));
        backend
            .expect_insert_user_stats()
            .times(1)
            .returning(|_| Err(BackendError::Other("stats down".into())));

        let (seq, _dir) = sequencer(backend);
        let result = seq.provision_account("user-1", &draft(), None).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn anonymous_fallback_mints_local_identity() {
        let mut backend = MockBackendClient::new();
        backend.expect_current_session().returning(|| Ok(None));
        backend
            .expect_sign_in_anonymously()
            .returning(|| Err(BackendError::Unavailable("offline".into())));

        let (seq, _dir) = sequencer(backend);
        let session = seq.ensure_identity().await.expect("fallback session");
        assert_eq!(session.method, AuthMethod::Local);
        assert!(session.user_id.starts_with("temp-user-"));
        assert!(seq.store.onboarding_completed().expect("flag"));
    }

    #[tokio::test]
    async fn existing_session_is_reused() {
        let mut backend = MockBackendClient::new();
        backend.expect_current_session().returning(|| {
            Ok(Some(Session {
                user_id: "existing".to_string(),
                method: AuthMethod::Anonymous,
            }))
        });

        let (seq, _dir) = sequencer(backend);
        let session = seq.ensure_identity().await.expect("session");
        assert_eq!(session.user_id, "existing");
    }

    #[tokio::test]
    async fn invitation_insert_failure_is_surfaced() {
        let mut backend = MockBackendClient::new();
        backend
            .expect_find_invitation_by_code()
            .returning(|_| Ok(None));
        backend
            .expect_insert_trusted_contact()
            .times(1)
            .returning(|_| Err(BackendError::Other("insert failed".into())));

        let request = TrustedContactRequest {
            name: "Jean Dubois".to_string(),
            relationship: "fils".to_string(),
            phone: None,
            email: None,
            preferred_method: ContactMethod::Sms,
        };

        let (seq, _dir) = sequencer(backend);
        let result = seq.create_invitation("user-1", &request).await;
        assert!(matches!(result, Err(OnboardingError::Invitation(_))));
    }

    #[tokio::test]
    async fn complete_swallows_backend_update_failure() {
        let mut backend = MockBackendClient::new();
        backend
            .expect_mark_onboarding_complete()
            .times(1)
            .returning(|_, _| Err(BackendError::Unavailable("offline".into())));

        let (seq, _dir) = sequencer(backend);
        assert!(seq.complete("user-1").await.is_ok());
        assert!(seq.store.onboarding_completed().expect("flag"));
    }
}
