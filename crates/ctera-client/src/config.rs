//! Runtime configuration
//!
//! Defaults for connection arguments and transport settings, layered from an
//! optional file and `CTERA_MODULE_*` environment variables. Arguments passed
//! to a module always take precedence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const ENV_PREFIX: &str = "CTERA_MODULE";

const STANDARD_PATHS: [&str; 2] = ["/etc/ctera/ctera-module.toml", "./ctera-module.toml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub ctera_host: Option<String>,
    #[serde(default)]
    pub ctera_port: Option<u16>,
    #[serde(default)]
    pub ctera_https: Option<bool>,
    #[serde(default)]
    pub ctera_user: Option<String>,
    #[serde(default)]
    pub ctera_password: Option<String>,
    #[serde(default)]
    pub ctera_trust_certificate: Option<bool>,
    /// Per-request timeout; unset leaves the transport default in place
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Load a configuration file plus environment overrides.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Environment only.
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Explicit file if given, else the first standard location that exists,
    /// else the environment alone.
    pub fn load_with_defaults(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        for path in STANDARD_PATHS {
            if Path::new(path).exists() {
                log::debug!("loading configuration from {}", path);
                return Self::load_from_file(path);
            }
        }
        Self::from_env()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Fill connection arguments the caller left out.
    pub fn apply_defaults(&self, args: &mut Map<String, Value>) {
        let defaults = [
            ("ctera_host", self.ctera_host.clone().map(Value::from)),
            ("ctera_port", self.ctera_port.map(Value::from)),
            ("ctera_https", self.ctera_https.map(Value::from)),
            ("ctera_user", self.ctera_user.clone().map(Value::from)),
            ("ctera_password", self.ctera_password.clone().map(Value::from)),
            (
                "ctera_trust_certificate",
                self.ctera_trust_certificate.map(Value::from),
            ),
        ];
        for (key, default) in defaults {
            let Some(default) = default else { continue };
            let missing = args.get(key).map_or(true, Value::is_null);
            if missing {
                args.insert(key.to_string(), default);
            }
        }
    }
}
