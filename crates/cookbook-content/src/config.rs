//! Store connection settings.

use std::fmt;

use crate::error::ContentError;
use crate::timeout::TimeoutConfig;

/// Environment variable holding the space id.
pub const ENV_SPACE_ID: &str = "CONTENTFUL_SPACE_ID";
/// Environment variable holding the delivery access token.
pub const ENV_ACCESS_KEY: &str = "CONTENTFUL_ACCESS_KEY";
/// Accepted alias for [`ENV_ACCESS_KEY`].
pub const ENV_ACCESS_TOKEN: &str = "CONTENTFUL_ACCESS_TOKEN";
/// Environment variable selecting the space environment.
pub const ENV_ENVIRONMENT: &str = "CONTENTFUL_ENVIRONMENT";
/// Environment variable overriding the API host.
pub const ENV_HOST: &str = "CONTENTFUL_HOST";

pub const DEFAULT_HOST: &str = "https://cdn.contentful.com";
pub const DEFAULT_ENVIRONMENT: &str = "master";

/// Connection settings for the delivery API.
///
/// The space id and token are opaque; only their presence is checked.
#[derive(Clone)]
pub struct StoreConfig {
    pub space_id: String,
    pub access_token: String,
    pub environment: String,
    pub host: String,
    pub timeout: TimeoutConfig,
}

impl StoreConfig {
    /// Create a configuration with default host and environment.
    pub fn new(space_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            access_token: access_token.into(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            host: DEFAULT_HOST.to_string(),
            timeout: TimeoutConfig::default(),
        }
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ContentError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through a lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ContentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let space_id =
            present(ENV_SPACE_ID).ok_or_else(|| ContentError::MissingConfig(ENV_SPACE_ID.into()))?;
        let access_token = present(ENV_ACCESS_KEY)
            .or_else(|| present(ENV_ACCESS_TOKEN))
            .ok_or_else(|| ContentError::MissingConfig(ENV_ACCESS_KEY.into()))?;

        let mut config = Self::new(space_id, access_token);
        if let Some(environment) = present(ENV_ENVIRONMENT) {
            config.environment = environment;
        }
        if let Some(host) = present(ENV_HOST) {
            config.host = host;
        }
        Ok(config)
    }

    /// Set the space environment.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Set the API host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set request timeouts.
    pub fn with_timeout(mut self, timeout: TimeoutConfig) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL of the entries endpoint.
    pub fn entries_url(&self) -> String {
        format!(
            "{}/spaces/{}/environments/{}/entries",
            self.host.trim_end_matches('/'),
            self.space_id,
            self.environment
        )
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("space_id", &self.space_id)
            .field("access_token", &"<redacted>")
            .field("environment", &self.environment)
            .field("host", &self.host)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            (ENV_SPACE_ID, "space1"),
            (ENV_ACCESS_KEY, "token1"),
        ]))
        .unwrap();

        assert_eq!(config.space_id, "space1");
        assert_eq!(config.access_token, "token1");
        assert_eq!(config.environment, "master");
        assert_eq!(
            config.entries_url(),
            "https://cdn.contentful.com/spaces/space1/environments/master/entries"
        );
    }

    #[test]
    fn test_from_lookup_token_alias_and_overrides() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            (ENV_SPACE_ID, "space1"),
            (ENV_ACCESS_TOKEN, "token2"),
            (ENV_ENVIRONMENT, "staging"),
            (ENV_HOST, "https://preview.contentful.com/"),
        ]))
        .unwrap();

        assert_eq!(config.access_token, "token2");
        assert_eq!(
            config.entries_url(),
            "https://preview.contentful.com/spaces/space1/environments/staging/entries"
        );
    }

    #[test]
    fn test_from_lookup_missing_space() {
        let err = StoreConfig::from_lookup(lookup_from(&[(ENV_ACCESS_KEY, "token")])).unwrap_err();
        assert!(matches!(err, ContentError::MissingConfig(ref var) if var == ENV_SPACE_ID));
    }

    #[test]
    fn test_from_lookup_blank_token_is_missing() {
        let err = StoreConfig::from_lookup(lookup_from(&[
            (ENV_SPACE_ID, "space1"),
            (ENV_ACCESS_KEY, "  "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ContentError::MissingConfig(_)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = StoreConfig::new("space1", "secret-token");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }
}
