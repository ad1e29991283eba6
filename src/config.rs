use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub invitation: InvitationConfig,
    pub onboarding: OnboardingConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Delay before the first profile insert, letting the auth row commit
    pub settle_delay_ms: u64,
    /// Backoff between profile-insert retries on foreign-key violations
    pub retry_backoff_ms: u64,
    /// Total profile-insert attempts (initial try included)
    pub max_profile_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationConfig {
    /// Characters per invitation code
    pub code_length: usize,
    /// Uniqueness probes before giving up
    pub max_attempts: u32,
    /// Hours until an invitation expires
    pub expiry_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingConfig {
    /// Name used when the user skips the identity step
    pub default_name: String,
    /// Interface language
    pub language: String,
    /// IANA timezone written to new profiles
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory for the sled-backed local flag store
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                settle_delay_ms: 500,
                retry_backoff_ms: 1000,
                max_profile_attempts: 3,
            },
            invitation: InvitationConfig {
                code_length: 4,
                max_attempts: 10,
                expiry_hours: 24,
            },
            onboarding: OnboardingConfig {
                default_name: "Utilisateur".to_string(),
                language: "fr".to_string(),
                timezone: "America/Montreal".to_string(),
            },
            store: StoreConfig {
                path: ".parapluie_store".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        // Start with default values
        for (key, value) in AppConfig::default() {
            builder = builder.set_default(key, value)?;
        }

        let config = builder
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("PARAPLUIE").separator("_"))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate backend config
        if self.backend.max_profile_attempts == 0 {
            return Err(anyhow::anyhow!("max_profile_attempts must be greater than 0"));
        }

        // Validate invitation config
        if self.invitation.code_length == 0 {
            return Err(anyhow::anyhow!("code_length must be greater than 0"));
        }
        if self.invitation.code_length > 12 {
            return Err(anyhow::anyhow!("code_length too large (max 12)"));
        }
        if self.invitation.max_attempts == 0 {
            return Err(anyhow::anyhow!("max_attempts must be greater than 0"));
        }
        if self.invitation.expiry_hours <= 0 {
            return Err(anyhow::anyhow!("expiry_hours must be greater than 0"));
        }

        // Validate onboarding config
        if self.onboarding.default_name.trim().is_empty() {
            return Err(anyhow::anyhow!("default_name must not be empty"));
        }
        let valid_languages = ["fr", "en"];
        if !valid_languages.contains(&self.onboarding.language.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid language: {}. Must be one of: {:?}",
                self.onboarding.language,
                valid_languages
            ));
        }

        // Validate store config
        if self.store.path.trim().is_empty() {
            return Err(anyhow::anyhow!("store path must not be empty"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        Ok(())
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Get local store path from environment or config
    pub fn get_store_path(&self) -> String {
        std::env::var("PARAPLUIE_STORE_PATH").unwrap_or_else(|_| self.store.path.clone())
    }
}

impl IntoIterator for AppConfig {
    type Item = (String, config::Value);
    type IntoIter = std::collections::hash_map::IntoIter<String, config::Value>;

    fn into_iter(self) -> Self::IntoIter {
        let mut map = std::collections::HashMap::new();

        // Flatten the configuration into key-value pairs
        map.insert(
            "backend.settle_delay_ms".to_string(),
            config::Value::from(self.backend.settle_delay_ms),
        );
        map.insert(
            "backend.retry_backoff_ms".to_string(),
            config::Value::from(self.backend.retry_backoff_ms),
        );
        map.insert(
            "backend.max_profile_attempts".to_string(),
            config::Value::from(self.backend.max_profile_attempts),
        );

        map.insert(
            "invitation.code_length".to_string(),
            config::Value::from(self.invitation.code_length as u64),
        );
        map.insert(
            "invitation.max_attempts".to_string(),
            config::Value::from(self.invitation.max_attempts),
        );
        map.insert(
            "invitation.expiry_hours".to_string(),
            config::Value::from(self.invitation.expiry_hours),
        );

        map.insert(
            "onboarding.default_name".to_string(),
            config::Value::from(self.onboarding.default_name),
        );
        map.insert(
            "onboarding.language".to_string(),
            config::Value::from(self.onboarding.language),
        );
        map.insert(
            "onboarding.timezone".to_string(),
            config::Value::from(self.onboarding.timezone),
        );

        map.insert("store.path".to_string(), config::Value::from(self.store.path));

        map.insert(
            "logging.level".to_string(),
            config::Value::from(self.logging.level),
        );
        if let Some(file_path) = self.logging.file_path {
            map.insert("logging.file_path".to_string(), config::Value::from(file_path));
        }
        map.insert(
            "logging.format".to_string(),
            config::Value::from(self.logging.format),
        );

        map.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.invitation.code_length, 4);
        assert_eq!(config.invitation.expiry_hours, 24);
        assert_eq!(config.backend.max_profile_attempts, 3);
        assert_eq!(config.onboarding.default_name, "Utilisateur");
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = AppConfig::default();
        config.backend.max_profile_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_language() {
        let mut config = AppConfig::default();
        config.onboarding.language = "de".to_string();
        assert!(config.validate().is_err());
    }
}
