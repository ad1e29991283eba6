use anyhow::{anyhow, Result};

/// Validation utilities for onboarding input fields
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate the user's name.
    ///
    /// Trims the input; valid if the trimmed length is between 2 and 50
    /// characters. No case or unicode normalization is performed.
    pub fn validate_name(name: &str) -> Result<()> {
        let trimmed = name.trim();

        if trimmed.chars().count() < 2 {
            return Err(anyhow!("Entrez au moins 2 caractères"));
        }

        if trimmed.chars().count() > 50 {
            return Err(anyhow!("Le nom est trop long (max 50 caractères)"));
        }

        Ok(())
    }

    /// Validate a phone number and normalize it to E.164.
    ///
    /// Strips all non-digit characters. Exactly 10 digits are assumed North
    /// American and prefixed with `+1`; 11 digits starting with `1` are
    /// prefixed with `+`. Any other digit count is invalid. No area-code or
    /// carrier validation.
    pub fn validate_phone(phone: &str) -> Result<String> {
        let digits: String = phone.chars().filter(char::is_ascii_digit).collect();

        if digits.len() == 10 {
            Ok(format!("+1{digits}"))
        } else if digits.len() == 11 && digits.starts_with('1') {
            Ok(format!("+{digits}"))
        } else {
            Err(anyhow!("Entrez un numéro de téléphone valide (10 chiffres)"))
        }
    }

    /// Validate an email address.
    ///
    /// Basic shape check only: one `@`, non-empty local part, domain with a dot.
    pub fn validate_email(email: &str) -> Result<()> {
        let trimmed = email.trim();

        if trimmed.is_empty() {
            return Err(anyhow!("Adresse courriel invalide"));
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(anyhow!("Adresse courriel invalide"));
        }

        let parts: Vec<&str> = trimmed.split('@').collect();
        if parts.len() != 2 {
            return Err(anyhow!("Adresse courriel invalide"));
        }

        let (local, domain) = (parts[0], parts[1]);
        if local.is_empty() || domain.is_empty() || !domain.contains('.') {
            return Err(anyhow!("Adresse courriel invalide"));
        }

        Ok(())
    }

    /// Validate a trusted contact's name (at least 2 characters).
    pub fn validate_contact_name(name: &str) -> Result<()> {
        if name.trim().chars().count() < 2 {
            return Err(anyhow!("Entrez au moins 2 caractères"));
        }
        Ok(())
    }

    /// Validate the trusted-contact relationship selection.
    pub fn validate_relationship(relationship: &str) -> Result<()> {
        if relationship.trim().is_empty() {
            return Err(anyhow!("Sélectionnez une relation"));
        }
        Ok(())
    }
}

/// Incremental display formatter for phone input.
///
/// Digits are grouped as `(ddd) ddd-dddd`; anything beyond 10 digits is
/// truncated. Pure function, recomputed on every keystroke.
#[must_use]
pub fn format_phone_input(input: &str) -> String {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();

    match digits.len() {
        0..=3 => digits,
        4..=6 => format!("({}) {}", &digits[0..3], &digits[3..]),
        7..=10 => format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..]),
        _ => format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..10]),
    }
}

/// Individual password criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordChecks {
    /// At least 8 characters
    pub length: bool,
    /// At least one uppercase letter
    pub uppercase: bool,
    /// At least one lowercase letter
    pub lowercase: bool,
    /// At least one digit
    pub number: bool,
}

/// Password strength assessment.
///
/// Four criteria: minimum 8 characters, an uppercase letter, a lowercase
/// letter, and a digit. No special-character requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordStrength {
    /// Number of criteria met (0-4)
    pub score: u8,
    /// French strength label for the score
    pub label: &'static str,
    /// Score as a percentage of all criteria
    pub percentage: u8,
    /// Whether all four criteria are met
    pub is_valid: bool,
    /// Which criteria passed
    pub checks: PasswordChecks,
}

const STRENGTH_LABELS: [&str; 5] = ["Très faible", "Faible", "Moyen", "Bon", "Fort"];

impl PasswordStrength {
    /// Assess a password against the four-criterion policy.
    #[must_use]
    pub fn assess(password: &str) -> Self {
        let checks = PasswordChecks {
            length: password.chars().count() >= 8,
            uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
            lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
            number: password.chars().any(|c| c.is_ascii_digit()),
        };

        let score = u8::from(checks.length)
            + u8::from(checks.uppercase)
            + u8::from(checks.lowercase)
            + u8::from(checks.number);

        Self {
            score,
            label: STRENGTH_LABELS[score as usize],
            percentage: score * 25,
            is_valid: score == 4,
            checks,
        }
    }
}
