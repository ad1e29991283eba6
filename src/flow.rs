//! Onboarding state machine.
//!
//! Drives the user through the ordered screens, carrying accumulated data
//! forward as typed step variants rather than loosely-typed parameter bags:
//! a later step can only read fields an earlier step actually set. Events
//! validate their guards, perform the backend writes through the sequencer,
//! and then advance; applying an event at the wrong step is an error.
//!
//! Welcome → AccountCreation → Permissions → InvitePrompt →
//! {InviteContactInfo → ShareInvitation} | (skip) → Complete

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::auth_state::AuthStore;
use crate::backend::BackendClient;
use crate::config::AppConfig;
use crate::deeplink;
use crate::error::{OnboardingError, Result};
use crate::metrics::MetricsCollector;
use crate::models::{
    AuthMethod, ContactMethod, OnboardingDraft, PermissionGrants, TrustedContactRequest,
};
use crate::sequencer::OnboardingSequencer;
use crate::store::LocalStore;
use crate::validation::{InputValidator, PasswordStrength};

/// One variant per screen, carrying exactly the data that screen owns.
#[derive(Debug, Clone)]
pub enum OnboardingStep {
    /// Name and phone entry
    Welcome,
    /// Email/password or social account creation
    AccountCreation,
    /// Protection permission requests
    Permissions {
        /// Identity created in the previous step
        user_id: String,
    },
    /// "Add a trusted contact now?" branch point
    InvitePrompt {
        /// Identity being onboarded
        user_id: String,
    },
    /// Trusted-contact name and relationship entry
    InviteContactInfo {
        /// Identity being onboarded
        user_id: String,
    },
    /// Code sharing screen
    ShareInvitation {
        /// Identity being onboarded
        user_id: String,
        /// Generated invitation code
        invitation_code: String,
        /// Invited contact's name
        contact_name: String,
        /// When the invitation expires
        expires_at: DateTime<Utc>,
    },
    /// Terminal state; the root controller takes over
    Complete {
        /// Identity that finished onboarding
        user_id: String,
        /// Whether a trusted contact was invited
        has_trusted_contact: bool,
    },
}

impl OnboardingStep {
    /// Stable step name for logs and metrics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            OnboardingStep::Welcome => "welcome",
            OnboardingStep::AccountCreation => "account_creation",
            OnboardingStep::Permissions { .. } => "permissions",
            OnboardingStep::InvitePrompt { .. } => "invite_prompt",
            OnboardingStep::InviteContactInfo { .. } => "invite_contact_info",
            OnboardingStep::ShareInvitation { .. } => "share_invitation",
            OnboardingStep::Complete { .. } => "complete",
        }
    }
}

/// Warning shown before skipping the identity step.
pub const SKIP_IDENTITY_WARNING: &str =
    "Votre nom et numéro aident Walter à mieux vous protéger.";

/// The onboarding flow: current step, draft, and collaborators.
pub struct OnboardingFlow {
    step: OnboardingStep,
    draft: OnboardingDraft,
    sequencer: OnboardingSequencer,
    backend: Arc<dyn BackendClient>,
    auth: Arc<AuthStore>,
    default_name: String,
    busy: bool,
}

impl OnboardingFlow {
    /// Start a flow at the Welcome step.
    pub fn new(
        backend: Arc<dyn BackendClient>,
        store: Arc<LocalStore>,
        auth: Arc<AuthStore>,
        config: &AppConfig,
    ) -> Self {
        let sequencer = OnboardingSequencer::new(Arc::clone(&backend), store, config);
        let draft = OnboardingDraft {
            language: config.onboarding.language.clone(),
            ..OnboardingDraft::default()
        };
        Self {
            step: OnboardingStep::Welcome,
            draft,
            sequencer,
            backend,
            auth,
            default_name: config.onboarding.default_name.clone(),
            busy: false,
        }
    }

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> &OnboardingStep {
        &self.step
    }

    /// In-session draft accumulated so far.
    #[must_use]
    pub const fn draft(&self) -> &OnboardingDraft {
        &self.draft
    }

    /// Whether a submission is in flight for the current step.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    fn advance(&mut self, next: OnboardingStep) {
        info!(from = self.step.name(), to = next.name(), "step transition");
        MetricsCollector::record_step_transition(next.name());
        self.step = next;
    }

    fn begin_submission(&mut self) -> Result<()> {
        if self.busy {
            return Err(OnboardingError::Busy);
        }
        self.busy = true;
        Ok(())
    }

    fn invalid_step(&self, expected: &'static str) -> OnboardingError {
        OnboardingError::InvalidStep {
            expected,
            actual: self.step.name(),
        }
    }

    /// Welcome → AccountCreation with a validated name and phone.
    pub fn submit_identity(&mut self, name: &str, phone: &str) -> Result<()> {
        if !matches!(self.step, OnboardingStep::Welcome) {
            return Err(self.invalid_step("welcome"));
        }

        InputValidator::validate_name(name)
            .map_err(|e| OnboardingError::Validation(e.to_string()))?;
        let formatted = InputValidator::validate_phone(phone)
            .map_err(|e| OnboardingError::Validation(e.to_string()))?;

        self.draft.name = name.trim().to_string();
        self.draft.phone = Some(formatted);
        self.advance(OnboardingStep::AccountCreation);
        Ok(())
    }

    /// Welcome → AccountCreation with placeholder values.
    ///
    /// The caller is expected to have confirmed the skip; the warning text
    /// is [`SKIP_IDENTITY_WARNING`].
    pub fn skip_identity(&mut self) -> Result<()> {
        if !matches!(self.step, OnboardingStep::Welcome) {
            return Err(self.invalid_step("welcome"));
        }
        self.draft.name = self.default_name.clone();
        self.draft.phone = None;
        self.advance(OnboardingStep::AccountCreation);
        Ok(())
    }

    /// AccountCreation → Permissions via email/password signup.
    ///
    /// Guards: a well-formed email, a password meeting all four strength
    /// criteria, and a matching confirmation.
    pub async fn create_account(
        &mut self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<()> {
        if !matches!(self.step, OnboardingStep::AccountCreation) {
            return Err(self.invalid_step("account_creation"));
        }
        self.begin_submission()?;
        let result = self.create_account_inner(email, password, confirm_password).await;
        self.busy = false;
        result
    }

    async fn create_account_inner(
        &mut self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<()> {
        InputValidator::validate_email(email)
            .map_err(|e| OnboardingError::Validation(e.to_string()))?;

        if !PasswordStrength::assess(password).is_valid {
            return Err(OnboardingError::Validation(
                "Le mot de passe doit respecter tous les critères".to_string(),
            ));
        }

        if password != confirm_password {
            return Err(OnboardingError::Validation(
                "Les mots de passe ne correspondent pas".to_string(),
            ));
        }

        let session = self
            .sequencer
            .create_password_account(email, password, &self.draft)
            .await?;

        self.sequencer
            .provision_account(&session.user_id, &self.draft, Some(email))
            .await?;

        let user_id = session.user_id.clone();
        self.auth.set_user(session);
        self.advance(OnboardingStep::Permissions { user_id });
        Ok(())
    }

    /// AccountCreation → Permissions without phone or email verification.
    ///
    /// Seniors can start protection immediately on an anonymous backend
    /// identity; verification happens later, or a trusted contact does it on
    /// their behalf. If the backend cannot establish any session, the
    /// identity is kept locally and onboarding finishes on the spot, since
    /// no further backend write can succeed for it.
    pub async fn continue_without_account(&mut self) -> Result<()> {
        if !matches!(self.step, OnboardingStep::AccountCreation) {
            return Err(self.invalid_step("account_creation"));
        }
        self.begin_submission()?;
        let result = self.continue_without_account_inner().await;
        self.busy = false;
        result
    }

    async fn continue_without_account_inner(&mut self) -> Result<()> {
        let session = self.sequencer.ensure_identity().await?;
        let user_id = session.user_id.clone();
        let local_only = session.method == AuthMethod::Local;
        self.auth.set_user(session);

        if local_only {
            self.auth.set_onboarding_complete(true);
            MetricsCollector::record_completion(false);
            self.advance(OnboardingStep::Complete {
                user_id,
                has_trusted_contact: false,
            });
            return Ok(());
        }

        self.sequencer
            .provision_account(&user_id, &self.draft, None)
            .await?;
        self.advance(OnboardingStep::Permissions { user_id });
        Ok(())
    }

    /// Open the external OAuth flow for a provider.
    ///
    /// The redirect comes back through [`Self::handle_auth_callback`].
    pub async fn begin_oauth(&mut self, provider: &str) -> Result<()> {
        if !matches!(self.step, OnboardingStep::AccountCreation) {
            return Err(self.invalid_step("account_creation"));
        }
        self.backend
            .sign_in_with_oauth(provider, &deeplink::oauth_redirect_url())
            .await
            .map_err(|e| OnboardingError::Auth(e.to_string()))
    }

    /// Handle a deep-link redirect.
    ///
    /// Returns `Ok(false)` for URLs that are not auth callbacks. A matched
    /// callback with no backend session is an error with no automatic retry.
    pub async fn handle_auth_callback(&mut self, url: &str) -> Result<bool> {
        if !matches!(self.step, OnboardingStep::AccountCreation) {
            return Err(self.invalid_step("account_creation"));
        }
        if !deeplink::is_auth_callback(url) {
            return Ok(false);
        }

        self.begin_submission()?;
        let result = self.handle_auth_callback_inner().await;
        self.busy = false;
        result.map(|()| true)
    }

    async fn handle_auth_callback_inner(&mut self) -> Result<()> {
        let session = self
            .backend
            .current_session()
            .await
            .map_err(|e| OnboardingError::Callback(e.to_string()))?
            .ok_or_else(|| {
                MetricsCollector::record_error("callback");
                OnboardingError::Callback("No session found after OAuth callback".to_string())
            })?;

        self.sequencer
            .provision_account(&session.user_id, &self.draft, None)
            .await?;

        let user_id = session.user_id.clone();
        self.auth.set_user(session);
        self.advance(OnboardingStep::Permissions { user_id });
        Ok(())
    }

    /// Permissions → InvitePrompt with the user's grants snapshotted.
    pub fn grant_permissions(&mut self, grants: PermissionGrants) -> Result<()> {
        let OnboardingStep::Permissions { user_id } = &self.step else {
            return Err(self.invalid_step("permissions"));
        };
        let user_id = user_id.clone();

        self.draft.permissions = grants;
        if let Err(e) = self.sequencer.store().cache_permissions(grants) {
            warn!(error = %e, "failed to cache permission snapshot");
        }
        self.advance(OnboardingStep::InvitePrompt { user_id });
        Ok(())
    }

    /// Permissions → InvitePrompt without granting anything.
    pub fn skip_permissions(&mut self) -> Result<()> {
        self.grant_permissions(PermissionGrants::default())
    }

    /// InvitePrompt → InviteContactInfo.
    pub fn choose_invite(&mut self) -> Result<()> {
        let OnboardingStep::InvitePrompt { user_id } = &self.step else {
            return Err(self.invalid_step("invite_prompt"));
        };
        let user_id = user_id.clone();
        self.advance(OnboardingStep::InviteContactInfo { user_id });
        Ok(())
    }

    /// InvitePrompt → Complete without inviting anyone.
    pub async fn skip_invitation(&mut self) -> Result<()> {
        let OnboardingStep::InvitePrompt { user_id } = &self.step else {
            return Err(self.invalid_step("invite_prompt"));
        };
        let user_id = user_id.clone();
        self.finish(user_id, false).await
    }

    /// InviteContactInfo → ShareInvitation.
    ///
    /// Validates the contact's name and relationship, persists the
    /// invitation, and carries the generated code forward.
    pub async fn submit_contact(
        &mut self,
        name: &str,
        relationship: &str,
        phone: Option<&str>,
        email: Option<&str>,
        preferred_method: ContactMethod,
    ) -> Result<()> {
        let OnboardingStep::InviteContactInfo { user_id } = &self.step else {
            return Err(self.invalid_step("invite_contact_info"));
        };
        let user_id = user_id.clone();

        InputValidator::validate_contact_name(name)
            .map_err(|e| OnboardingError::Validation(e.to_string()))?;
        InputValidator::validate_relationship(relationship)
            .map_err(|e| OnboardingError::Validation(e.to_string()))?;

        self.begin_submission()?;
        let request = TrustedContactRequest {
            name: name.trim().to_string(),
            relationship: relationship.trim().to_string(),
            phone: phone.map(str::to_string),
            email: email.map(str::to_string),
            preferred_method,
        };
        self.draft.trusted_contact = Some(request.clone());

        let result = self.sequencer.create_invitation(&user_id, &request).await;
        self.busy = false;

        let invitation = result?;
        self.advance(OnboardingStep::ShareInvitation {
            user_id,
            invitation_code: invitation.invitation_code,
            contact_name: invitation.name,
            expires_at: invitation.invitation_expires_at,
        });
        Ok(())
    }

    /// ShareInvitation → Complete, recording how the code was shared.
    pub async fn mark_invitation_shared(&mut self, method: ContactMethod) -> Result<()> {
        let OnboardingStep::ShareInvitation {
            user_id,
            invitation_code,
            ..
        } = &self.step
        else {
            return Err(self.invalid_step("share_invitation"));
        };
        let user_id = user_id.clone();
        let code = invitation_code.clone();

        self.sequencer.mark_invitation_shared(&code, method).await?;
        self.finish(user_id, true).await
    }

    /// Step back to the previous screen, dropping downstream data.
    ///
    /// Only the steps with no committed backend writes behind them can be
    /// revisited: AccountCreation → Welcome and InviteContactInfo →
    /// InvitePrompt. Everything entered after the target step is stale and
    /// is discarded from the draft.
    pub fn go_back(&mut self) -> Result<()> {
        match &self.step {
            OnboardingStep::AccountCreation => {
                self.draft = OnboardingDraft {
                    language: self.draft.language.clone(),
                    ..OnboardingDraft::default()
                };
                self.advance(OnboardingStep::Welcome);
                Ok(())
            }
            OnboardingStep::InviteContactInfo { user_id } => {
                let user_id = user_id.clone();
                self.draft.trusted_contact = None;
                self.advance(OnboardingStep::InvitePrompt { user_id });
                Ok(())
            }
            _ => Err(OnboardingError::InvalidStep {
                expected: "account_creation or invite_contact_info",
                actual: self.step.name(),
            }),
        }
    }

    async fn finish(&mut self, user_id: String, has_trusted_contact: bool) -> Result<()> {
        self.begin_submission()?;
        let result = self.sequencer.complete(&user_id).await;
        self.busy = false;
        result?;

        self.auth.set_onboarding_complete(true);
        MetricsCollector::record_completion(has_trusted_contact);
        self.advance(OnboardingStep::Complete {
            user_id,
            has_trusted_contact,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth_state::{resolve_route, AppRoute};
    use crate::backend::{BackendError, MockBackendClient};

    fn flow_over(backend: MockBackendClient) -> (OnboardingFlow, Arc<AuthStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(LocalStore::open(dir.path()).expect("store"));
        let auth = Arc::new(AuthStore::new());
        auth.set_loading(false);
        let flow = OnboardingFlow::new(
            Arc::new(backend),
            store,
            Arc::clone(&auth),
            &AppConfig::default(),
        );
        (flow, auth, dir)
    }

    #[tokio::test]
    async fn unreachable_backend_finishes_onboarding_on_local_identity() {
        let mut backend = MockBackendClient::new();
        backend.expect_current_session().returning(|| Ok(None));
        backend
            .expect_sign_in_anonymously()
            .returning(|| Err(BackendError::Unavailable("offline".into())));

        let (mut flow, auth, _dir) = flow_over(backend);
        flow.skip_identity().unwrap();
        flow.continue_without_account().await.unwrap();

        match flow.step() {
            OnboardingStep::Complete {
                user_id,
                has_trusted_contact,
            } => {
                assert!(user_id.starts_with("temp-user-"));
                assert!(!has_trusted_contact);
            }
            other => panic!("expected Complete, got {}", other.name()),
        }
        let state = auth.state();
        assert!(state.has_completed_onboarding);
        assert_eq!(resolve_route(&state), AppRoute::Main);
    }

    #[tokio::test]
    async fn continue_without_account_rejected_off_account_creation() {
        let (mut flow, _auth, _dir) = flow_over(MockBackendClient::new());

        let result = flow.continue_without_account().await;
        assert!(matches!(result, Err(OnboardingError::InvalidStep { .. })));
    }
}
