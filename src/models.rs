//! Data models for the onboarding flow
//!
//! This module contains all data structures used throughout the flow,
//! including the in-session draft, permission sets, and the records
//! persisted to the backend at finalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transient, in-session accumulation of user-entered onboarding data.
///
/// Owned exclusively by the flow for the duration of onboarding, transcribed
/// field-by-field into the persisted records at finalization, and discarded
/// afterwards. Never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingDraft {
    /// User's first name (trimmed)
    pub name: String,
    /// User's phone number in E.164 format, if provided
    pub phone: Option<String>,
    /// Interface language ("fr" or "en")
    pub language: String,
    /// Protection permissions granted during onboarding
    pub permissions: PermissionGrants,
    /// Trusted-contact invitation request, if the user added one
    pub trusted_contact: Option<TrustedContactRequest>,
}

impl Default for OnboardingDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            phone: None,
            language: "fr".to_string(),
            permissions: PermissionGrants::default(),
            trusted_contact: None,
        }
    }
}

/// Protection permissions requested from the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrants {
    /// Incoming-call screening
    pub call_protection: bool,
    /// SMS screening
    pub sms_protection: bool,
    /// Location-based alerts
    pub location_alerts: bool,
    /// Push notifications
    pub notifications: bool,
}

impl PermissionGrants {
    /// All permissions granted
    #[must_use]
    pub const fn all() -> Self {
        Self {
            call_protection: true,
            sms_protection: true,
            location_alerts: true,
            notifications: true,
        }
    }
}

/// How the invited contact prefers to be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactMethod {
    /// Text message
    Sms,
    /// Email
    Email,
    /// In-app notification
    App,
}

impl std::fmt::Display for ContactMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactMethod::Sms => write!(f, "sms"),
            ContactMethod::Email => write!(f, "email"),
            ContactMethod::App => write!(f, "app"),
        }
    }
}

/// Trusted-contact details gathered from the user before an invitation exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustedContactRequest {
    /// Contact's display name
    pub name: String,
    /// Relationship to the user ("fils", "fille", "conjoint", ...)
    pub relationship: String,
    /// Contact's phone number (optional)
    pub phone: Option<String>,
    /// Contact's email address (optional)
    pub email: Option<String>,
    /// Preferred way to deliver the invitation
    pub preferred_method: ContactMethod,
}

/// Permissions granted to a trusted contact.
///
/// Defaults are conservative: alerts and notifications only. Location,
/// calendar, and settings access must be granted explicitly later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPermissions {
    /// Alert severity the contact is notified about
    pub alert_level: String,
    /// Contact can view the user's safety alerts
    pub can_view_alerts: bool,
    /// Contact receives push notifications for those alerts
    pub can_receive_notifications: bool,
    /// Contact can view the user's location
    pub can_view_location: bool,
    /// Contact can read the user's calendar
    pub can_access_calendar: bool,
    /// Contact can change the user's protection settings
    pub can_modify_settings: bool,
}

impl Default for ContactPermissions {
    fn default() -> Self {
        Self {
            alert_level: "high".to_string(),
            can_view_alerts: true,
            can_receive_notifications: true,
            can_view_location: false,
            can_access_calendar: false,
            can_modify_settings: false,
        }
    }
}

/// Lifecycle status of a trusted-contact invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    /// Created, not yet accepted
    Pending,
    /// Contact linked their account
    Accepted,
    /// Expiry passed without acceptance
    Expired,
}

/// New trusted-contact row to insert at invitation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrustedContact {
    /// Inviting user's identity id
    pub senior_id: String,
    /// Contact's display name
    pub name: String,
    /// Relationship to the user
    pub relationship: String,
    /// Contact's phone number (optional)
    pub phone: Option<String>,
    /// Contact's email address (optional)
    pub email: Option<String>,
    /// Preferred invitation delivery method
    pub preferred_method: ContactMethod,
    /// Short shareable invitation code
    pub invitation_code: String,
    /// When the invitation stops being redeemable
    pub invitation_expires_at: DateTime<Utc>,
    /// When the invitation was created
    pub invited_at: DateTime<Utc>,
    /// Permissions granted to the contact
    pub permissions: ContactPermissions,
}

/// Persisted trusted-contact invitation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustedContactInvitation {
    /// Record id
    pub id: String,
    /// Inviting user's identity id
    pub senior_id: String,
    /// Contact's display name
    pub name: String,
    /// Relationship to the user
    pub relationship: String,
    /// Contact's phone number (optional)
    pub phone: Option<String>,
    /// Contact's email address (optional)
    pub email: Option<String>,
    /// Preferred invitation delivery method
    pub preferred_method: ContactMethod,
    /// Short shareable invitation code
    pub invitation_code: String,
    /// Lifecycle status
    pub status: InvitationStatus,
    /// Permissions granted to the contact
    pub permissions: ContactPermissions,
    /// When the invitation was created
    pub invited_at: DateTime<Utc>,
    /// When the invitation stops being redeemable
    pub invitation_expires_at: DateTime<Utc>,
    /// When the invitation was shared (SMS/email/manual), if it was
    pub invitation_sent_at: Option<DateTime<Utc>>,
    /// When the contact accepted, if they did
    pub accepted_at: Option<DateTime<Utc>>,
}

/// New user-profile row, keyed by the auth identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserProfile {
    /// Auth identity id (must match the auth user's id)
    pub id: String,
    /// User's first name
    pub first_name: String,
    /// User's phone number in E.164 format, if provided
    pub phone: Option<String>,
    /// User's email address, if provided
    pub email: Option<String>,
    /// Interface language
    pub language: String,
    /// IANA timezone name
    pub timezone: String,
    /// Whether onboarding has been completed
    pub onboarding_completed: bool,
}

/// New security-settings row (auxiliary write).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSecuritySettings {
    /// Auth identity id
    pub user_id: String,
    /// Protection level ("low", "medium", "high")
    pub protection_level: String,
    /// Incoming-call screening enabled
    pub call_protection_enabled: bool,
    /// SMS screening enabled
    pub sms_protection_enabled: bool,
    /// Location-based alerts enabled
    pub location_alerts_enabled: bool,
    /// Push notifications enabled
    pub notifications_enabled: bool,
    /// Automatically block unknown numbers
    pub auto_block_unknown: bool,
    /// Automatically block international numbers
    pub auto_block_international: bool,
    /// Quiet hours enabled
    pub quiet_hours_enabled: bool,
}

impl NewSecuritySettings {
    /// Build the initial settings row from the granted permissions.
    #[must_use]
    pub fn from_grants(user_id: &str, grants: PermissionGrants) -> Self {
        Self {
            user_id: user_id.to_string(),
            protection_level: "medium".to_string(),
            call_protection_enabled: grants.call_protection,
            sms_protection_enabled: grants.sms_protection,
            location_alerts_enabled: grants.location_alerts,
            notifications_enabled: grants.notifications,
            auto_block_unknown: false,
            auto_block_international: false,
            quiet_hours_enabled: false,
        }
    }
}

/// New user-stats row (auxiliary write).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserStats {
    /// Auth identity id
    pub user_id: String,
    /// Protection start timestamp
    pub since: DateTime<Utc>,
}

/// How the auth identity was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// Email and password signup
    Password,
    /// Google OAuth
    Google,
    /// Apple OAuth
    Apple,
    /// Anonymous backend session
    Anonymous,
    /// Locally persisted pseudo-identity (backend unreachable)
    Local,
}

/// Authenticated backend session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Identity id of the signed-in user
    pub user_id: String,
    /// How this session was established
    pub method: AuthMethod,
}

/// Profile metadata attached to an identity at signup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupMetadata {
    /// User's first name
    pub first_name: String,
    /// User's phone number, if provided
    pub phone: Option<String>,
    /// Interface language
    pub language: String,
}
