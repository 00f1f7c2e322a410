//! Registry credentials
//!
//! Resolved once, up front, and handed to the backend's login. Nothing else
//! reads the environment for them.

use crate::config::schema::RegistryConfig;
use crate::error::{MillError, MillResult};
use std::fmt;

/// Username and password (or access token) for the target registry
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
}

impl RegistryCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read both values from the process environment
    pub fn from_env(config: &RegistryConfig) -> MillResult<Self> {
        Self::from_lookup(config, |var| std::env::var(var).ok())
    }

    /// Resolve both values through `lookup`; missing or blank values fail
    pub fn from_lookup<F>(config: &RegistryConfig, lookup: F) -> MillResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |var: &str| {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| MillError::CredentialsMissing {
                    var: var.to_string(),
                })
        };

        let username = fetch(&config.username_env)?;
        let password = fetch(&config.password_env)?;
        Ok(Self { username, password })
    }
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
