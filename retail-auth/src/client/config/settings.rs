use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_login_path")]
    pub login_path: String,

    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,

    #[serde(default = "default_logout_path")]
    pub logout_path: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Upper bound on a single refresh call. Every queued request waits at
    /// most this long before the session is treated as expired.
    #[serde(default = "default_refresh_timeout")]
    pub refresh_timeout_secs: u64,

    /// Overrides the default session file under the user cache directory
    #[serde(default)]
    pub session_file: Option<PathBuf>,
}

fn default_api_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_login_path() -> String {
    "/auth/login".to_string()
}

fn default_refresh_path() -> String {
    "/auth/refresh-token".to_string()
}

fn default_logout_path() -> String {
    "/auth/logout".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_refresh_timeout() -> u64 {
    15
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            login_path: default_login_path(),
            refresh_path: default_refresh_path(),
            logout_path: default_logout_path(),
            request_timeout_secs: default_request_timeout(),
            refresh_timeout_secs: default_refresh_timeout(),
            session_file: None,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("RETAIL_POS_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

        let settings = Config::builder()
            .add_source(File::with_name(&config_path).required(false))
            .add_source(config::Environment::with_prefix("RETAIL_POS").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Settings pointing at `api_url` with every other field defaulted
    pub fn for_api(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_url.is_empty() {
            return Err("api_url is required".to_string());
        }
        if !self.api_url.starts_with("http") {
            return Err("api_url must be a valid HTTP(S) URL".to_string());
        }
        for (name, path) in [
            ("login_path", &self.login_path),
            ("refresh_path", &self.refresh_path),
            ("logout_path", &self.logout_path),
        ] {
            if !path.starts_with('/') {
                return Err(format!("{} must start with '/'", name));
            }
        }
        if self.request_timeout_secs == 0 || self.refresh_timeout_secs == 0 {
            return Err("timeouts must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }

    /// Paths whose 401 responses must never trigger a refresh
    pub fn auth_paths(&self) -> Vec<String> {
        vec![self.login_path.clone(), self.refresh_path.clone()]
    }
}
