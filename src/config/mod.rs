//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `PLAN_ACTIVATION`
//! prefix and `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use plan_activation::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod activation;
mod database;
mod error;
mod payment;
mod server;

pub use activation::ActivationConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Realtime Database connection; in-memory when absent
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Whop webhook secret, plan ids and admin key
    pub payment: PaymentConfig,

    /// Activation retry schedule
    #[serde(default)]
    pub activation: ActivationConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` if present (development)
    /// 2. Reads variables with the `PLAN_ACTIVATION` prefix
    /// 3. Splits nested keys on `__`
    ///
    /// - `PLAN_ACTIVATION__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PLAN_ACTIVATION__PAYMENT__WHOP_WEBHOOK_SECRET=...` -> `payment.whop_webhook_secret`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or cannot
    /// be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PLAN_ACTIVATION")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate(&self.server.environment)?;
        self.payment.validate()?;
        self.activation.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global; serialize tests touching them
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 7] = [
        "PLAN_ACTIVATION__PAYMENT__WHOP_WEBHOOK_SECRET",
        "PLAN_ACTIVATION__PAYMENT__WHOP_PRO_PLAN_ID",
        "PLAN_ACTIVATION__DATABASE__FIREBASE_URL",
        "PLAN_ACTIVATION__SERVER__PORT",
        "PLAN_ACTIVATION__SERVER__ENVIRONMENT",
        "PLAN_ACTIVATION__ACTIVATION__MAX_ATTEMPTS",
        "PLAN_ACTIVATION__ACTIVATION__BASE_DELAY_MS",
    ];

    fn set_minimal_env() {
        env::set_var(
            "PLAN_ACTIVATION__PAYMENT__WHOP_WEBHOOK_SECRET",
            "whsec_0123456789abcdef",
        );
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PLAN_ACTIVATION__PAYMENT__WHOP_PRO_PLAN_ID", "plan_PRO");
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("config should load");
        assert_eq!(config.payment.whop_webhook_secret, "whsec_0123456789abcdef");
        assert_eq!(config.payment.whop_pro_plan_id.as_deref(), Some("plan_PRO"));
        assert!(!config.database.uses_firebase());
    }

    #[test]
    fn test_defaults_validate_in_development() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.activation.max_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_requires_database() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PLAN_ACTIVATION__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_custom_retry_settings() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PLAN_ACTIVATION__ACTIVATION__MAX_ATTEMPTS", "3");
        env::set_var("PLAN_ACTIVATION__ACTIVATION__BASE_DELAY_MS", "250");
        env::set_var("PLAN_ACTIVATION__SERVER__PORT", "3000");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.activation.retry_policy().max_attempts, 3);
        assert_eq!(
            config.activation.retry_policy().delay_for(1),
            std::time::Duration::from_millis(500)
        );
    }

    #[test]
    fn test_missing_payment_section_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        assert!(AppConfig::load().is_err());
    }
}
