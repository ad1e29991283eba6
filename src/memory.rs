//! In-process backend implementation.
//!
//! [`InMemoryBackend`] implements the full [`BackendClient`] surface over
//! in-memory maps. It backs the CLI simulation and the integration tests,
//! and enforces the invitation-code unique constraint at insert time so the
//! duplicate-key signal behaves like the hosted store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::{BackendClient, BackendError, BackendResult};
use crate::models::{
    AuthMethod, ContactMethod, InvitationStatus, NewSecuritySettings, NewTrustedContact,
    NewUserProfile, NewUserStats, Session, SignupMetadata, TrustedContactInvitation,
};

#[derive(Default)]
struct State {
    accounts: HashMap<String, String>, // email -> user id
    session: Option<Session>,
    profiles: HashMap<String, NewUserProfile>,
    settings: HashMap<String, NewSecuritySettings>,
    stats: HashMap<String, NewUserStats>,
    invitations: HashMap<String, TrustedContactInvitation>, // keyed by code
}

/// In-memory [`BackendClient`] for tests and local simulation.
#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    /// Create an empty backend with no session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> BackendResult<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|e| BackendError::Other(format!("state lock poisoned: {e}")))
    }

    /// Pre-register an invitation code so uniqueness probes collide on it.
    pub fn seed_invitation_code(&self, code: &str) -> BackendResult<()> {
        let now = Utc::now();
        let invitation = TrustedContactInvitation {
            id: Uuid::new_v4().to_string(),
            senior_id: "seed".to_string(),
            name: "seed".to_string(),
            relationship: "autre".to_string(),
            phone: None,
            email: None,
            preferred_method: ContactMethod::App,
            invitation_code: code.to_string(),
            status: InvitationStatus::Pending,
            permissions: crate::models::ContactPermissions::default(),
            invited_at: now,
            invitation_expires_at: now + chrono::Duration::hours(24),
            invitation_sent_at: None,
            accepted_at: None,
        };
        self.lock()?.invitations.insert(code.to_string(), invitation);
        Ok(())
    }

    /// Profile row for a user, if one was inserted.
    pub fn profile(&self, user_id: &str) -> BackendResult<Option<NewUserProfile>> {
        Ok(self.lock()?.profiles.get(user_id).cloned())
    }

    /// Security-settings row for a user, if one was inserted.
    pub fn security_settings(&self, user_id: &str) -> BackendResult<Option<NewSecuritySettings>> {
        Ok(self.lock()?.settings.get(user_id).cloned())
    }

    /// Number of invitation rows currently stored.
    pub fn invitation_count(&self) -> BackendResult<usize> {
        Ok(self.lock()?.invitations.len())
    }
}

#[async_trait]
impl BackendClient for InMemoryBackend {
    async fn sign_up_with_password(
        &self,
        email: &str,
        _password: &str,
        _metadata: SignupMetadata,
    ) -> BackendResult<Session> {
        let mut state = self.lock()?;
        if state.accounts.contains_key(email) {
            return Err(BackendError::AlreadyRegistered(email.to_string()));
        }
        let user_id = Uuid::new_v4().to_string();
        state.accounts.insert(email.to_string(), user_id.clone());
        let session = Session {
            user_id,
            method: AuthMethod::Password,
        };
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_in_with_oauth(&self, provider: &str, _redirect_to: &str) -> BackendResult<()> {
        // The external browser round-trip is simulated by establishing the
        // session immediately; the callback path then finds it.
        let method = match provider {
            "google" => AuthMethod::Google,
            "apple" => AuthMethod::Apple,
            other => return Err(BackendError::Auth(format!("unknown provider: {other}"))),
        };
        let session = Session {
            user_id: Uuid::new_v4().to_string(),
            method,
        };
        self.lock()?.session = Some(session);
        Ok(())
    }

    async fn sign_in_anonymously(&self) -> BackendResult<Session> {
        let session = Session {
            user_id: Uuid::new_v4().to_string(),
            method: AuthMethod::Anonymous,
        };
        self.lock()?.session = Some(session.clone());
        Ok(session)
    }

    async fn current_session(&self) -> BackendResult<Option<Session>> {
        Ok(self.lock()?.session.clone())
    }

    async fn insert_profile(&self, profile: NewUserProfile) -> BackendResult<()> {
        let mut state = self.lock()?;
        if state.profiles.contains_key(&profile.id) {
            return Err(BackendError::DuplicateKey(format!(
                "user_profiles.id {}",
                profile.id
            )));
        }
        state.profiles.insert(profile.id.clone(), profile);
        Ok(())
    }

    async fn insert_security_settings(&self, settings: NewSecuritySettings) -> BackendResult<()> {
        self.lock()?
            .settings
            .insert(settings.user_id.clone(), settings);
        Ok(())
    }

    async fn insert_user_stats(&self, stats: NewUserStats) -> BackendResult<()> {
        self.lock()?.stats.insert(stats.user_id.clone(), stats);
        Ok(())
    }

    async fn insert_trusted_contact(
        &self,
        contact: NewTrustedContact,
    ) -> BackendResult<TrustedContactInvitation> {
        let mut state = self.lock()?;
        // Unique constraint on invitation_code; duplicate insert is the
        // collision signal, mirroring the hosted store.
        if state.invitations.contains_key(&contact.invitation_code) {
            return Err(BackendError::DuplicateKey(format!(
                "trusted_contacts.invitation_code {}",
                contact.invitation_code
            )));
        }
        let invitation = TrustedContactInvitation {
            id: Uuid::new_v4().to_string(),
            senior_id: contact.senior_id,
            name: contact.name,
            relationship: contact.relationship,
            phone: contact.phone,
            email: contact.email,
            preferred_method: contact.preferred_method,
            invitation_code: contact.invitation_code.clone(),
            status: InvitationStatus::Pending,
            permissions: contact.permissions,
            invited_at: contact.invited_at,
            invitation_expires_at: contact.invitation_expires_at,
            invitation_sent_at: None,
            accepted_at: None,
        };
        state
            .invitations
            .insert(contact.invitation_code, invitation.clone());
        Ok(invitation)
    }

    async fn find_invitation_by_code(
        &self,
        code: &str,
    ) -> BackendResult<Option<TrustedContactInvitation>> {
        Ok(self.lock()?.invitations.get(code).cloned())
    }

    async fn mark_invitation_sent(
        &self,
        code: &str,
        _method: ContactMethod,
        at: DateTime<Utc>,
    ) -> BackendResult<()> {
        let mut state = self.lock()?;
        match state.invitations.get_mut(code) {
            Some(invitation) => {
                invitation.invitation_sent_at = Some(at);
                Ok(())
            }
            None => Err(BackendError::Other(format!("no invitation for code {code}"))),
        }
    }

    async fn mark_invitation_accepted(&self, code: &str, at: DateTime<Utc>) -> BackendResult<()> {
        let mut state = self.lock()?;
        match state.invitations.get_mut(code) {
            Some(invitation) => {
                invitation.status = InvitationStatus::Accepted;
                invitation.accepted_at = Some(at);
                Ok(())
            }
            None => Err(BackendError::Other(format!("no invitation for code {code}"))),
        }
    }

    async fn mark_onboarding_complete(
        &self,
        user_id: &str,
        _at: DateTime<Utc>,
    ) -> BackendResult<()> {
        let mut state = self.lock()?;
        match state.profiles.get_mut(user_id) {
            Some(profile) => {
                profile.onboarding_completed = true;
                Ok(())
            }
            None => Err(BackendError::Other(format!("no profile for user {user_id}"))),
        }
    }
}
