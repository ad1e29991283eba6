//! Invitation code generation.
//!
//! Produces the short, human-shareable code a trusted contact types to link
//! their account. Codes are drawn from a restricted alphabet that excludes
//! visually ambiguous characters (I, O, 0, 1) and are collision-checked
//! against the backend before use. A successful return means "probably
//! unique at check-time", not a hard guarantee; the insert path treats a
//! duplicate-key conflict as the collision signal and regenerates.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::debug;

use crate::backend::BackendClient;
use crate::error::{OnboardingError, Result};

/// Code alphabet: uppercase letters and digits, excluding I, O, 0, 1.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generates collision-checked invitation codes.
#[derive(Debug, Clone, Copy)]
pub struct CodeGenerator {
    /// Number of characters per code
    pub code_length: usize,
    /// Maximum uniqueness probes before giving up
    pub max_attempts: u32,
    /// Hours until a generated invitation expires
    pub expiry_hours: i64,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self {
            code_length: 4,
            max_attempts: 10,
            expiry_hours: 24,
        }
    }
}

impl CodeGenerator {
    /// Draw one candidate code from the restricted alphabet.
    ///
    /// Non-cryptographic randomness is sufficient here; codes are short-lived
    /// and carry no authority on their own.
    #[must_use]
    pub fn draw_candidate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.code_length)
            .map(|_| {
                let idx = rng.gen_range(0..CODE_ALPHABET.len());
                char::from(CODE_ALPHABET[idx])
            })
            .collect()
    }

    /// Generate a code that no existing invitation currently uses.
    ///
    /// Probes the backend once per candidate, up to `max_attempts` times.
    /// Exhaustion fails with [`OnboardingError::CodeGenerationExhausted`]
    /// and performs no insert.
    pub async fn generate_unique(&self, backend: &dyn BackendClient) -> Result<String> {
        for attempt in 1..=self.max_attempts {
            let candidate = self.draw_candidate();

            let existing = backend
                .find_invitation_by_code(&candidate)
                .await
                .map_err(|e| OnboardingError::Invitation(e.to_string()))?;

            if existing.is_none() {
                debug!(attempt, "invitation code generated");
                metrics::histogram!("parapluie_invitation_code_attempts")
                    .record(f64::from(attempt));
                return Ok(candidate);
            }

            debug!(attempt, code = %candidate, "invitation code collision");
        }

        metrics::counter!("parapluie_invitation_code_exhausted_total").increment(1);
        Err(OnboardingError::CodeGenerationExhausted(self.max_attempts))
    }

    /// Expiry timestamp for an invitation created at `now`.
    #[must_use]
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::hours(self.expiry_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_use_restricted_alphabet() {
        let generator = CodeGenerator::default();
        for _ in 0..100 {
            let code = generator.draw_candidate();
            assert_eq!(code.len(), 4);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn alphabet_excludes_ambiguous_characters() {
        for banned in [b'I', b'O', b'0', b'1'] {
            assert!(!CODE_ALPHABET.contains(&banned));
        }
    }

    #[test]
    fn expiry_is_24_hours_ahead_by_default() {
        let generator = CodeGenerator::default();
        let now = Utc::now();
        assert_eq!(generator.expires_at(now) - now, Duration::hours(24));
    }
}
