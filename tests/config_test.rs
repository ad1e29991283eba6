//! Unit tests for the configuration module

use parapluie_onboarding::config::AppConfig;

#[test]
fn test_default_backend_config() {
    let config = AppConfig::default();

    assert_eq!(config.backend.settle_delay_ms, 500);
    assert_eq!(config.backend.retry_backoff_ms, 1000);
    assert_eq!(config.backend.max_profile_attempts, 3);
}

#[test]
fn test_default_invitation_config() {
    let config = AppConfig::default();

    assert_eq!(config.invitation.code_length, 4);
    assert_eq!(config.invitation.max_attempts, 10);
    assert_eq!(config.invitation.expiry_hours, 24);
}

#[test]
fn test_default_onboarding_config() {
    let config = AppConfig::default();

    assert_eq!(config.onboarding.default_name, "Utilisateur");
    assert_eq!(config.onboarding.language, "fr");
    assert_eq!(config.onboarding.timezone, "America/Montreal");
}

#[test]
fn test_default_logging_config() {
    let config = AppConfig::default();

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.file_path, None);
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_default_config_is_valid() {
    assert!(AppConfig::default().validate().is_ok());
}

#[test]
fn test_zero_code_length_is_invalid() {
    let mut config = AppConfig::default();
    config.invitation.code_length = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_zero_max_attempts_is_invalid() {
    let mut config = AppConfig::default();
    config.invitation.max_attempts = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_negative_expiry_is_invalid() {
    let mut config = AppConfig::default();
    config.invitation.expiry_hours = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_log_level_is_rejected() {
    let mut config = AppConfig::default();
    config.logging.level = "verbose".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_empty_default_name_is_rejected() {
    let mut config = AppConfig::default();
    config.onboarding.default_name = "  ".to_string();
    assert!(config.validate().is_err());
}
