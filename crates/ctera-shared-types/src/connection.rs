//! Connection arguments common to every module

use serde::{Deserialize, Serialize};

use crate::error::{SharedResult, SharedTypeError};

/// Tenant name that selects the global administration context.
pub const GLOBAL_ADMIN_TENANT: &str = "$admin";

/// Kind of CTERA host a module talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostKind {
    /// Edge filer (gateway appliance)
    Gateway,
    /// Portal management plane
    Portal,
}

impl HostKind {
    /// API root under the host's base URL
    pub fn api_root(&self) -> &'static str {
        match self {
            HostKind::Gateway => "/ctera/api",
            HostKind::Portal => "/admin/api",
        }
    }
}

impl std::fmt::Display for HostKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostKind::Gateway => write!(f, "gateway"),
            HostKind::Portal => write!(f, "portal"),
        }
    }
}

fn default_https() -> bool {
    true
}

/// Host, port, credentials and TLS trust flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionArgs {
    pub ctera_host: String,
    #[serde(default = "default_https")]
    pub ctera_https: bool,
    #[serde(default)]
    pub ctera_port: Option<u16>,
    pub ctera_user: String,
    pub ctera_password: String,
    #[serde(default)]
    pub ctera_trust_certificate: bool,
}

impl ConnectionArgs {
    /// Names of the connection arguments; these never reach a module's parameters.
    pub const KEYS: [&'static str; 6] = [
        "ctera_host",
        "ctera_https",
        "ctera_port",
        "ctera_user",
        "ctera_password",
        "ctera_trust_certificate",
    ];

    pub fn validate(&self) -> SharedResult<()> {
        if self.ctera_host.trim().is_empty() {
            return Err(SharedTypeError::Missing("ctera_host"));
        }
        if self.ctera_user.is_empty() {
            return Err(SharedTypeError::Missing("ctera_user"));
        }
        if self.ctera_port == Some(0) {
            return Err(SharedTypeError::InvalidValue {
                field: "ctera_port",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// `http(s)://host[:port]`
    pub fn base_url(&self) -> String {
        let scheme = if self.ctera_https { "https" } else { "http" };
        let host = self.ctera_host.trim_end_matches('/');
        match self.ctera_port {
            Some(port) => format!("{}://{}:{}", scheme, host, port),
            None => format!("{}://{}", scheme, host),
        }
    }
}

/// Administrative context a portal session operates in
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TenantScope {
    /// Whatever context the login lands in
    #[default]
    Default,
    GlobalAdmin,
    Tenant(String),
}

impl TenantScope {
    pub fn from_argument(tenant: Option<&str>) -> Self {
        match tenant {
            None | Some("") => TenantScope::Default,
            Some(GLOBAL_ADMIN_TENANT) => TenantScope::GlobalAdmin,
            Some(name) => TenantScope::Tenant(name.to_string()),
        }
    }
}
