//! Module execution
//!
//! A [`Module`] is a stateless handler for one resource kind. The
//! [`ModuleRunner`] owns the invocation lifecycle around it.

use std::sync::Arc;

use async_trait::async_trait;
use ctera_client::{ClientConfig, ClientResult, Session, Transport};
use ctera_core::{ArgumentError, Parameters, ResourceKind, ReturnValue};
use ctera_shared_types::{ConnectionArgs, HostKind, TenantScope};
use serde_json::{Map, Value};

/// Arguments the automation runtime injects; never part of a module's parameters.
const RUNTIME_KEY_PREFIX: &str = "_ansible_";

/// Everything a handler gets to work with
pub struct ModuleContext<'a> {
    pub session: &'a Session,
    pub connection: &'a ConnectionArgs,
}

#[async_trait]
pub trait Module: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// Fixed message reported when execution fails
    fn failure_message(&self, params: &Parameters) -> String;

    /// Check arguments before any session is opened.
    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError>;

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()>;
}

/// Opens sessions for the runner
pub trait Connector: Send + Sync {
    fn connect(&self, args: &ConnectionArgs, kind: HostKind) -> ClientResult<Session>;
}

/// HTTP sessions built from connection arguments
pub struct HttpConnector {
    config: ClientConfig,
}

impl HttpConnector {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl Connector for HttpConnector {
    fn connect(&self, args: &ConnectionArgs, kind: HostKind) -> ClientResult<Session> {
        Session::connect(args, kind, &self.config)
    }
}

/// Every session goes through one shared transport
pub struct SharedConnector {
    transport: Arc<dyn Transport>,
}

impl SharedConnector {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

impl Connector for SharedConnector {
    fn connect(&self, _args: &ConnectionArgs, kind: HostKind) -> ClientResult<Session> {
        Ok(Session::new(self.transport.clone(), kind))
    }
}

pub struct ModuleRunner {
    connector: Arc<dyn Connector>,
    defaults: ClientConfig,
}

impl ModuleRunner {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            defaults: ClientConfig::default(),
        }
    }

    /// HTTP runner whose connection defaults come from `config`.
    pub fn http(config: ClientConfig) -> Self {
        Self {
            connector: Arc::new(HttpConnector::new(config.clone())),
            defaults: config,
        }
    }

    pub fn with_defaults(mut self, defaults: ClientConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// Run one invocation. Never fails; errors end up in the returned value.
    pub async fn run(&self, module: &dyn Module, raw: Map<String, Value>) -> ReturnValue {
        let mut rv = ReturnValue::new();
        let kind = module.kind();

        let mut raw: Map<String, Value> = raw
            .into_iter()
            .filter(|(key, _)| !key.starts_with(RUNTIME_KEY_PREFIX))
            .collect();
        self.defaults.apply_defaults(&mut raw);
        let raw = Parameters::from(raw);

        let connection = match parse_connection(&raw) {
            Ok(connection) => connection,
            Err(err) => {
                rv.failed().msg(err.to_string());
                return rv;
            }
        };

        let mut params = raw.without(&ConnectionArgs::KEYS);
        let scope = if kind.host_kind() == HostKind::Portal && kind.requires_login() {
            let tenant = params.pop("tenant");
            TenantScope::from_argument(tenant.as_ref().and_then(Value::as_str))
        } else {
            TenantScope::Default
        };

        if let Err(err) = module.validate(&params) {
            rv.failed().msg(err.to_string());
            return rv;
        }

        let failure = module.failure_message(&params);
        let mut session = match self.connector.connect(&connection, kind.host_kind()) {
            Ok(session) => session,
            Err(err) => {
                rv.failed()
                    .msg(format!("{} Exception: {}", failure, err))
                    .exception(format!("{:?}", err));
                return rv;
            }
        };

        if kind.requires_login() {
            if let Err(err) = session
                .login(&connection.ctera_user, &connection.ctera_password)
                .await
            {
                log::warn!("login to {} failed: {}", connection.ctera_host, err);
                rv.failed().msg(format!("Login failed. Exception: {}", err));
                return rv;
            }
        }

        log::info!("running {} against {}", kind, connection.ctera_host);
        let result = execute_in(module, &session, &connection, &scope, params, &mut rv).await;
        if let Err(err) = result {
            log::error!("{} failed: {}", kind, err);
            rv.failed()
                .msg(format!("{} Exception: {}", failure, err))
                .exception(format!("{:?}", err));
        }

        if let Err(err) = session.logout().await {
            log::warn!("logout from {} failed: {}", connection.ctera_host, err);
        }
        rv
    }
}

async fn execute_in(
    module: &dyn Module,
    session: &Session,
    connection: &ConnectionArgs,
    scope: &TenantScope,
    params: Parameters,
    rv: &mut ReturnValue,
) -> ctera_core::Result<()> {
    if session.is_logged_in() {
        session.browse(scope).await?;
    }
    let ctx = ModuleContext {
        session,
        connection,
    };
    module.execute(&ctx, params, rv).await
}

fn parse_connection(raw: &Parameters) -> Result<ConnectionArgs, ArgumentError> {
    let present: Vec<&str> = ConnectionArgs::KEYS
        .iter()
        .copied()
        .filter(|key| raw.get_present(key).is_some())
        .collect();
    let connection: ConnectionArgs =
        serde_json::from_value(raw.filter(&present).into_value()).map_err(|err| {
            let missing: Vec<&str> = ["ctera_host", "ctera_user", "ctera_password"]
                .into_iter()
                .filter(|key| !present.contains(key))
                .collect();
            if missing.is_empty() {
                ArgumentError::Invalid(err.to_string())
            } else {
                ArgumentError::Missing(missing.join(", "))
            }
        })?;
    connection
        .validate()
        .map_err(|err| ArgumentError::Invalid(err.to_string()))?;
    Ok(connection)
}
