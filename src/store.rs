//! Local persisted flags.
//!
//! Small key-value state that survives app restarts and gates which flow the
//! root controller renders: the onboarding-completed flag, the current user
//! id, the cached invitation code, and the last permission-grant snapshot.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::PermissionGrants;

const KEY_ONBOARDING_COMPLETED: &str = "@parapluie/onboardingCompleted";
const KEY_USER_ID: &str = "@parapluie/userId";
const KEY_INVITATION_CODE: &str = "@parapluie/invitationCode";
const KEY_PERMISSIONS: &str = "@parapluie/permissions";

#[derive(Serialize, Deserialize)]
struct PermissionSnapshot {
    grants: PermissionGrants,
    captured_at: chrono::DateTime<chrono::Utc>,
}

/// Persistent local flag store backed by sled.
pub struct LocalStore {
    db: sled::Db,
}

impl LocalStore {
    /// Open (or create) the store at the given directory.
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path).context("Failed to open local store")?;
        Ok(Self { db })
    }

    /// Mark onboarding as completed. Stored as the string "true".
    pub fn set_onboarding_completed(&self) -> Result<()> {
        self.db.insert(KEY_ONBOARDING_COMPLETED, "true")?;
        self.db.flush()?;
        Ok(())
    }

    /// Whether onboarding has been completed on this device.
    pub fn onboarding_completed(&self) -> Result<bool> {
        Ok(self
            .db
            .get(KEY_ONBOARDING_COMPLETED)?
            .is_some_and(|v| v.as_ref() == b"true"))
    }

    /// Persist the current user id.
    pub fn set_user_id(&self, user_id: &str) -> Result<()> {
        self.db.insert(KEY_USER_ID, user_id)?;
        self.db.flush()?;
        Ok(())
    }

    /// Current user id, if one was stored.
    pub fn user_id(&self) -> Result<Option<String>> {
        Ok(self
            .db
            .get(KEY_USER_ID)?
            .map(|v| String::from_utf8_lossy(&v).into_owned()))
    }

    /// Cache the invitation code for the share screen.
    pub fn set_invitation_code(&self, code: &str) -> Result<()> {
        self.db.insert(KEY_INVITATION_CODE, code)?;
        self.db.flush()?;
        Ok(())
    }

    /// Cached invitation code, if one was stored.
    pub fn invitation_code(&self) -> Result<Option<String>> {
        Ok(self
            .db
            .get(KEY_INVITATION_CODE)?
            .map(|v| String::from_utf8_lossy(&v).into_owned()))
    }

    /// Snapshot the permission grants the user confirmed.
    pub fn cache_permissions(&self, grants: PermissionGrants) -> Result<()> {
        let snapshot = PermissionSnapshot {
            grants,
            captured_at: chrono::Utc::now(),
        };
        let data = bincode::serialize(&snapshot)?;
        self.db.insert(KEY_PERMISSIONS, data)?;
        self.db.flush()?;
        Ok(())
    }

    /// Last cached permission snapshot, if any.
    pub fn cached_permissions(&self) -> Result<Option<PermissionGrants>> {
        match self.db.get(KEY_PERMISSIONS)? {
            Some(data) => {
                let snapshot: PermissionSnapshot = bincode::deserialize(&data)?;
                Ok(Some(snapshot.grants))
            }
            None => Ok(None),
        }
    }

    /// Remove all local flags (sign-out).
    pub fn clear(&self) -> Result<()> {
        for key in [
            KEY_ONBOARDING_COMPLETED,
            KEY_USER_ID,
            KEY_INVITATION_CODE,
            KEY_PERMISSIONS,
        ] {
            self.db.remove(key)?;
        }
        self.db.flush()?;
        Ok(())
    }
}
