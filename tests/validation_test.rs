//! Unit tests for the validation module

use parapluie_onboarding::validation::{format_phone_input, InputValidator, PasswordStrength};

#[test]
fn test_validate_name_valid() {
    assert!(InputValidator::validate_name("Marie").is_ok());
}

#[test]
fn test_validate_name_minimum_length() {
    assert!(InputValidator::validate_name("Jo").is_ok());
    assert!(InputValidator::validate_name("J").is_err());
}

#[test]
fn test_validate_name_trims_before_checking() {
    assert!(InputValidator::validate_name("  Jo  ").is_ok());
    assert!(InputValidator::validate_name("  J  ").is_err());
    assert!(InputValidator::validate_name("   ").is_err());
}

#[test]
fn test_validate_name_maximum_length() {
    let name = "a".repeat(50);
    assert!(InputValidator::validate_name(&name).is_ok());

    let long_name = "a".repeat(51);
    let err = InputValidator::validate_name(&long_name).unwrap_err();
    assert!(err.to_string().contains("trop long"));
}

#[test]
fn test_validate_name_short_error_message() {
    let err = InputValidator::validate_name("J").unwrap_err();
    assert_eq!(err.to_string(), "Entrez au moins 2 caractères");
}

#[test]
fn test_validate_name_accepts_accents() {
    assert!(InputValidator::validate_name("José García").is_ok());
}

#[test]
fn test_validate_phone_ten_digits() {
    let formatted = InputValidator::validate_phone("5145551234").unwrap();
    assert_eq!(formatted, "+15145551234");
}

#[test]
fn test_validate_phone_ten_digits_with_formatting() {
    let formatted = InputValidator::validate_phone("(514) 555-1234").unwrap();
    assert_eq!(formatted, "+15145551234");
}

#[test]
fn test_validate_phone_eleven_digits_with_country_code() {
    let formatted = InputValidator::validate_phone("15145551234").unwrap();
    assert_eq!(formatted, "+15145551234");
}

#[test]
fn test_validate_phone_eleven_digits_without_leading_one() {
    assert!(InputValidator::validate_phone("25145551234").is_err());
}

#[test]
fn test_validate_phone_wrong_lengths() {
    assert!(InputValidator::validate_phone("").is_err());
    assert!(InputValidator::validate_phone("514555123").is_err());
    assert!(InputValidator::validate_phone("514555123456").is_err());
}

#[test]
fn test_validate_phone_error_message() {
    let err = InputValidator::validate_phone("123").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Entrez un numéro de téléphone valide (10 chiffres)"
    );
}

#[test]
fn test_format_phone_input_full_number() {
    assert_eq!(format_phone_input("5145551234"), "(514) 555-1234");
}

#[test]
fn test_format_phone_input_partial() {
    assert_eq!(format_phone_input(""), "");
    assert_eq!(format_phone_input("514"), "514");
    assert_eq!(format_phone_input("5145"), "(514) 5");
    assert_eq!(format_phone_input("514555"), "(514) 555");
    assert_eq!(format_phone_input("5145551"), "(514) 555-1");
}

#[test]
fn test_format_phone_input_truncates_extra_digits() {
    assert_eq!(format_phone_input("51455512345678"), "(514) 555-1234");
}

#[test]
fn test_format_phone_input_ignores_non_digits() {
    assert_eq!(format_phone_input("(514) 555-1234"), "(514) 555-1234");
    assert_eq!(format_phone_input("514-555-1234"), "(514) 555-1234");
}

#[test]
fn test_validate_email_valid() {
    assert!(InputValidator::validate_email("marie@example.com").is_ok());
    assert!(InputValidator::validate_email("user@mail.example.com").is_ok());
}

#[test]
fn test_validate_email_invalid() {
    assert!(InputValidator::validate_email("").is_err());
    assert!(InputValidator::validate_email("marie").is_err());
    assert!(InputValidator::validate_email("marie@").is_err());
    assert!(InputValidator::validate_email("marie@example").is_err());
    assert!(InputValidator::validate_email("ma rie@example.com").is_err());
    assert!(InputValidator::validate_email("a@b@c.com").is_err());
}

#[test]
fn test_password_strength_all_criteria() {
    let strength = PasswordStrength::assess("Parapluie2024");
    assert_eq!(strength.score, 4);
    assert!(strength.is_valid);
    assert_eq!(strength.label, "Fort");
    assert_eq!(strength.percentage, 100);
}

#[test]
fn test_password_strength_no_special_characters_required() {
    assert!(PasswordStrength::assess("Abcdefg1").is_valid);
}

#[test]
fn test_password_strength_missing_criteria() {
    let strength = PasswordStrength::assess("abcdefgh");
    assert_eq!(strength.score, 2); // length + lowercase
    assert!(!strength.is_valid);
    assert!(strength.checks.length);
    assert!(strength.checks.lowercase);
    assert!(!strength.checks.uppercase);
    assert!(!strength.checks.number);
}

#[test]
fn test_password_strength_too_short() {
    let strength = PasswordStrength::assess("Ab1");
    assert!(!strength.checks.length);
    assert!(!strength.is_valid);
}

#[test]
fn test_password_strength_empty() {
    let strength = PasswordStrength::assess("");
    assert_eq!(strength.score, 0);
    assert_eq!(strength.label, "Très faible");
    assert_eq!(strength.percentage, 0);
}

#[test]
fn test_validate_contact_name() {
    assert!(InputValidator::validate_contact_name("Jean Dubois").is_ok());
    assert!(InputValidator::validate_contact_name("J").is_err());
}

#[test]
fn test_validate_relationship() {
    assert!(InputValidator::validate_relationship("fils").is_ok());
    let err = InputValidator::validate_relationship("").unwrap_err();
    assert_eq!(err.to_string(), "Sélectionnez une relation");
}
