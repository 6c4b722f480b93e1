//! Authenticated session to a gateway or portal

use std::sync::Arc;

use ctera_shared_types::{ConnectionArgs, HostKind, TenantScope};
use serde_json::{json, Value};

use crate::config::ClientConfig;
use crate::http::HttpTransport;
use crate::transport::Transport;
use crate::ClientResult;

/// Session context handed to module handlers.
///
/// Wraps a [`Transport`] with the host kind it talks to and tracks whether a
/// login happened, so teardown only logs out sessions that logged in.
pub struct Session {
    transport: Arc<dyn Transport>,
    kind: HostKind,
    logged_in: bool,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>, kind: HostKind) -> Self {
        Self {
            transport,
            kind,
            logged_in: false,
        }
    }

    /// Build an HTTP session for the given connection arguments.
    pub fn connect(
        args: &ConnectionArgs,
        kind: HostKind,
        config: &ClientConfig,
    ) -> ClientResult<Self> {
        let transport = HttpTransport::new(args, kind, config.request_timeout())?;
        Ok(Self::new(Arc::new(transport), kind))
    }

    pub fn kind(&self) -> HostKind {
        self.kind
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<()> {
        log::debug!("logging in to {} as {}", self.kind, username);
        self.transport.login(username, password).await?;
        self.logged_in = true;
        Ok(())
    }

    /// Log out when a login happened; a no-op otherwise.
    pub async fn logout(&mut self) -> ClientResult<()> {
        if !self.logged_in {
            return Ok(());
        }
        self.logged_in = false;
        self.transport.logout().await
    }

    /// Switch the portal session into a tenant or the global admin context.
    pub async fn browse(&self, scope: &TenantScope) -> ClientResult<()> {
        match scope {
            TenantScope::Default => Ok(()),
            TenantScope::GlobalAdmin => {
                log::debug!("browsing global administration");
                self.transport.put("/currentPortal", json!("")).await.map(|_| ())
            }
            TenantScope::Tenant(name) => {
                log::debug!("browsing tenant {}", name);
                self.transport
                    .put("/currentPortal", json!(name))
                    .await
                    .map(|_| ())
            }
        }
    }

    pub async fn get(&self, path: &str) -> ClientResult<Value> {
        self.transport.get(path).await
    }

    /// Fetch an object, mapping the not-found signal to `None`.
    ///
    /// Any other failure propagates unchanged.
    pub async fn fetch(&self, path: &str) -> ClientResult<Option<Value>> {
        match self.transport.get(path).await {
            Ok(Value::Null) => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => {
                log::debug!("{} does not exist", path);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn put(&self, path: &str, value: Value) -> ClientResult<Value> {
        self.transport.put(path, value).await
    }

    pub async fn add(&self, path: &str, value: Value) -> ClientResult<Value> {
        self.transport.add(path, value).await
    }

    pub async fn delete(&self, path: &str) -> ClientResult<Value> {
        self.transport.delete(path).await
    }

    pub async fn execute(&self, path: &str, name: &str, param: Value) -> ClientResult<Value> {
        self.transport.execute(path, name, param).await
    }
}
