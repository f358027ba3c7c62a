//! Gate configuration.
//!
//! A [`GateConfig`] is built once at startup, either from code with the
//! `with_*` builder methods or from `USERBIN_*` environment variables, and is
//! shared read-only by every request afterwards.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use userbin::GateConfig;
//!
//! let config = GateConfig::new("app-123", "s3cr3t")
//!     .with_protected_path("/admin")
//!     .with_root_path("/")
//!     .with_refresh_timeout(Duration::from_secs(5));
//!
//! assert!(config.is_protected("/admin/users"));
//! assert!(!config.is_protected("/about"));
//! ```

use std::time::Duration;

use crate::{GateError, SecretString};

/// Userbin's public api endpoint.
pub const DEFAULT_API_ENDPOINT: &str = "https://api.userbin.com";

/// Where the client script is loaded from.
pub const DEFAULT_SCRIPT_URL: &str = "//js.userbin.com";

/// Upper bound for the refresh round trip and for each resolver hook.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub(crate) app_id: String,
    pub(crate) api_secret: SecretString,
    /// Path prefix that requires a resolved user.
    pub(crate) protected_path: Option<String>,
    /// Post-logout redirect handed to the client script.
    pub(crate) root_path: Option<String>,
    pub(crate) skip_script_injection: bool,
    pub(crate) api_endpoint: String,
    pub(crate) script_url: String,
    pub(crate) cookie_path: String,
    pub(crate) refresh_timeout: Duration,
    pub(crate) resolve_timeout: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            api_secret: SecretString::default(),
            protected_path: None,
            root_path: None,
            skip_script_injection: false,
            api_endpoint: DEFAULT_API_ENDPOINT.to_owned(),
            script_url: DEFAULT_SCRIPT_URL.to_owned(),
            cookie_path: "/".to_owned(),
            refresh_timeout: DEFAULT_TIMEOUT,
            resolve_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GateConfig {
    /// Creates a configuration with the given Userbin credentials.
    pub fn new(app_id: impl Into<String>, api_secret: impl Into<SecretString>) -> Self {
        Self {
            app_id: app_id.into(),
            api_secret: api_secret.into(),
            ..Default::default()
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// | variable                        | option                  |
    /// |---------------------------------|-------------------------|
    /// | `USERBIN_APP_ID`                | `app_id`                |
    /// | `USERBIN_API_SECRET`            | `api_secret`            |
    /// | `USERBIN_API_ENDPOINT`          | `api_endpoint`          |
    /// | `USERBIN_SCRIPT_URL`            | `script_url`            |
    /// | `USERBIN_PROTECTED_PATH`        | `protected_path`        |
    /// | `USERBIN_ROOT_PATH`             | `root_path`             |
    /// | `USERBIN_SKIP_SCRIPT_INJECTION` | `skip_script_injection` |
    ///
    /// Missing credentials are not an error here; see [`GateConfig::validate`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`GateConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let defaults = Self::default();

        Self {
            app_id: var("USERBIN_APP_ID").unwrap_or_default(),
            api_secret: var("USERBIN_API_SECRET").map(SecretString::from).unwrap_or_default(),
            protected_path: var("USERBIN_PROTECTED_PATH"),
            root_path: var("USERBIN_ROOT_PATH"),
            skip_script_injection: var("USERBIN_SKIP_SCRIPT_INJECTION")
                .is_some_and(|value| matches!(value.as_str(), "1" | "true" | "yes")),
            api_endpoint: var("USERBIN_API_ENDPOINT").unwrap_or(defaults.api_endpoint),
            script_url: var("USERBIN_SCRIPT_URL").unwrap_or(defaults.script_url),
            ..Self::default()
        }
    }

    /// Checks that both credentials are present.
    ///
    /// # Errors
    ///
    /// Returns `GateError::MissingCredentials` if `app_id` or `api_secret` is empty.
    pub fn validate(&self) -> Result<(), GateError> {
        if self.app_id.is_empty() || self.api_secret.is_empty() {
            return Err(GateError::MissingCredentials);
        }
        Ok(())
    }

    #[must_use]
    pub fn with_protected_path(mut self, path: impl Into<String>) -> Self {
        self.protected_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_root_path(mut self, path: impl Into<String>) -> Self {
        self.root_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_skip_script_injection(mut self, skip: bool) -> Self {
        self.skip_script_injection = skip;
        self
    }

    #[must_use]
    pub fn with_api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_script_url(mut self, url: impl Into<String>) -> Self {
        self.script_url = url.into();
        self
    }

    #[must_use]
    pub fn with_cookie_path(mut self, path: impl Into<String>) -> Self {
        self.cookie_path = path.into();
        self
    }

    #[must_use]
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn api_secret(&self) -> &SecretString {
        &self.api_secret
    }

    /// The protected prefix, if one is configured and non-empty.
    pub fn protected_path(&self) -> Option<&str> {
        self.protected_path.as_deref().filter(|p| !p.is_empty())
    }

    pub fn root_path(&self) -> Option<&str> {
        self.root_path.as_deref().filter(|p| !p.is_empty())
    }

    pub fn skip_script_injection(&self) -> bool {
        self.skip_script_injection
    }

    pub fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    pub fn script_url(&self) -> &str {
        &self.script_url
    }

    pub fn cookie_path(&self) -> &str {
        &self.cookie_path
    }

    pub fn refresh_timeout(&self) -> Duration {
        self.refresh_timeout
    }

    pub fn resolve_timeout(&self) -> Duration {
        self.resolve_timeout
    }

    /// Returns true if `path` falls under the protected prefix.
    ///
    /// This is a plain string prefix test, so `/admin` also guards
    /// `/administrator`.
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_path()
            .is_some_and(|prefix| path.starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = GateConfig::default();
        assert_eq!(config.api_endpoint(), DEFAULT_API_ENDPOINT);
        assert_eq!(config.script_url(), DEFAULT_SCRIPT_URL);
        assert_eq!(config.cookie_path(), "/");
        assert_eq!(config.refresh_timeout(), DEFAULT_TIMEOUT);
        assert!(!config.skip_script_injection());
        assert!(config.protected_path().is_none());
    }

    #[test]
    fn test_validate_missing_credentials() {
        assert_eq!(
            GateConfig::default().validate(),
            Err(GateError::MissingCredentials)
        );
        assert_eq!(
            GateConfig::new("app", "").validate(),
            Err(GateError::MissingCredentials)
        );
        assert!(GateConfig::new("app", "secret").validate().is_ok());
    }

    #[test]
    fn test_is_protected_prefix() {
        let config = GateConfig::new("app", "secret").with_protected_path("/admin");
        assert!(config.is_protected("/admin"));
        assert!(config.is_protected("/admin/x?tab=1"));
        assert!(config.is_protected("/administrator"));
        assert!(!config.is_protected("/"));
        assert!(!config.is_protected("/public/admin"));
    }

    #[test]
    fn test_empty_protected_path_protects_nothing() {
        let config = GateConfig::new("app", "secret").with_protected_path("");
        assert!(config.protected_path().is_none());
        assert!(!config.is_protected("/anything"));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("USERBIN_APP_ID", "app-1"),
            ("USERBIN_API_SECRET", "s3cr3t"),
            ("USERBIN_API_ENDPOINT", "http://localhost:9000"),
            ("USERBIN_PROTECTED_PATH", "/admin"),
            ("USERBIN_SKIP_SCRIPT_INJECTION", "true"),
            ("USERBIN_SCRIPT_URL", ""),
        ]);

        let config = GateConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_owned()));

        assert_eq!(config.app_id(), "app-1");
        assert_eq!(config.api_secret().expose_secret(), "s3cr3t");
        assert_eq!(config.api_endpoint(), "http://localhost:9000");
        assert_eq!(config.protected_path(), Some("/admin"));
        assert!(config.skip_script_injection());
        // empty values fall back to defaults
        assert_eq!(config.script_url(), DEFAULT_SCRIPT_URL);
        assert!(config.root_path().is_none());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = GateConfig::new("app", "s3cr3t");
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("[REDACTED]"));
    }
}
