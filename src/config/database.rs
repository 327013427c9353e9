//! Database configuration (Firebase Realtime Database)

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;
use super::Environment;

/// Realtime Database connection settings.
///
/// Without a URL the service runs against the in-memory store, which is
/// only allowed outside production.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// e.g. `https://my-app-default-rtdb.firebaseio.com`
    pub firebase_url: Option<String>,

    /// Database secret or service token passed as `auth`
    pub firebase_secret: Option<String>,
}

impl DatabaseConfig {
    pub fn uses_firebase(&self) -> bool {
        self.firebase_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }

    pub fn firebase_secret(&self) -> Option<SecretString> {
        self.firebase_secret
            .as_ref()
            .filter(|s| !s.is_empty())
            .map(|s| SecretString::new(s.clone()))
    }

    /// Validate database configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let Some(url) = self.firebase_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            if *environment == Environment::Production {
                return Err(ValidationError::MissingRequired("DATABASE__FIREBASE_URL"));
            }
            return Ok(());
        };

        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if *environment == Environment::Production && !url.starts_with("https://") {
            return Err(ValidationError::DatabaseUrlMustBeHttps);
        }
        Ok(())
    }
}
