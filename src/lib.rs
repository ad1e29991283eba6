//! Parapluie Onboarding - Scam-Protection Enrollment Flow
//!
//! A Rust library implementing the onboarding and trusted-contact
//! invitation flow of the Parapluie scam-protection app for seniors.
//!
//! # Features
//!
//! - Typed onboarding state machine with per-screen step variants
//! - Input validation and phone formatting (Canadian numbers)
//! - Collision-checked invitation code generation
//! - Ordered backend write sequencing with foreign-key retry
//! - Process-wide auth state container for the root controller
//! - Persistent local flags (sled)

/// Process-wide auth/onboarding state container
pub mod auth_state;
/// Backend collaborator trait and error classification
pub mod backend;
/// Configuration management
pub mod config;
/// OAuth deep-link matching
pub mod deeplink;
/// Error types
pub mod error;
/// Onboarding state machine
pub mod flow;
/// Invitation code generation
pub mod invitation;
/// Logging setup and utilities
pub mod logging;
/// In-memory backend for tests and simulation
pub mod memory;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Backend write sequencer
pub mod sequencer;
/// Local persisted flags
pub mod store;
/// Input validation and password strength
pub mod validation;

// Re-export key components for easier access
pub use auth_state::{resolve_route, AppRoute, AuthStore};
pub use backend::BackendClient;
pub use error::{OnboardingError, Result};
pub use flow::{OnboardingFlow, OnboardingStep};
pub use models::{OnboardingDraft, PermissionGrants, TrustedContactInvitation};
pub use sequencer::OnboardingSequencer;
