//! Active Directory connection

use async_trait::async_trait;
use ctera_core::{ArgumentError, CteraError, Parameters, ResourceKind, ReturnValue};
use ctera_shared_types::ConnectState;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::args::{parse, required_if};
use crate::runner::{Module, ModuleContext};

pub(crate) const DIRECTORY_SERVICE: &str = "/directoryService";

#[derive(Debug, Serialize, Deserialize)]
pub struct DirectoryServicesArgs {
    #[serde(default)]
    pub state: ConnectState,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub ou: Option<String>,
    #[serde(default)]
    pub ssl: Option<bool>,
    #[serde(default)]
    pub krb: Option<bool>,
    #[serde(default)]
    pub domain_controllers: Option<Vec<String>>,
    #[serde(default)]
    pub force_reconnect: bool,
}

pub struct DirectoryServicesModule;

/// `{primary, secondary}` from up to two controllers
fn domain_controllers(controllers: Option<&[String]>) -> ctera_core::Result<Value> {
    match controllers {
        None | Some([]) => Ok(Value::Null),
        Some(controllers) if controllers.len() > 2 => Err(CteraError::precondition(
            "Cannot set more than two static domain controllers",
        )),
        Some(controllers) => Ok(json!({
            "primary": controllers.first(),
            "secondary": controllers.get(1),
        })),
    }
}

async fn connect(
    ctx: &ModuleContext<'_>,
    args: &DirectoryServicesArgs,
    rv: &mut ReturnValue,
) -> ctera_core::Result<()> {
    let controllers = domain_controllers(args.domain_controllers.as_deref())?;
    log::info!(
        "connecting to domain {}",
        args.domain.as_deref().unwrap_or_default()
    );
    let body = json!({
        "domain": args.domain,
        "username": args.username,
        "password": args.password,
        "ou": args.ou,
        "ssl": args.ssl.unwrap_or(false),
        "krb": args.krb.unwrap_or(false),
        "domainControllers": controllers,
    });
    ctx.session
        .execute(DIRECTORY_SERVICE, "connect", body)
        .await?;
    rv.changed()
        .msg("Connected to Active Directory")
        .put("domain", json!(args.domain))
        .put("username", json!(args.username))
        .put("ou", json!(args.ou))
        .put("domain_controllers", json!(args.domain_controllers));
    Ok(())
}

#[async_trait]
impl Module for DirectoryServicesModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PortalDirectoryServices
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Active Directory management failed.".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        let args: DirectoryServicesArgs = parse(params)?;
        required_if(
            args.state == ConnectState::Connected,
            "state",
            "connected",
            &[
                ("domain", args.domain.is_some()),
                ("username", args.username.is_some()),
                ("password", args.password.is_some()),
            ],
        )
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: DirectoryServicesArgs = parse(&params)?;
        let status = ctx
            .session
            .fetch(DIRECTORY_SERVICE)
            .await?
            .unwrap_or(Value::Null);
        let connected_domain = status
            .get("domain")
            .and_then(Value::as_str)
            .filter(|domain| !domain.is_empty())
            .map(str::to_string);
        let connected = status
            .get("connected")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        match (args.state, connected_domain) {
            (ConnectState::Connected, None) => connect(ctx, &args, rv).await?,
            (ConnectState::Connected, Some(domain)) => {
                if connected && args.domain.as_deref() == Some(domain.as_str()) && !args.force_reconnect
                {
                    rv.skipped()
                        .msg("The Portal is already connected to Active Directory")
                        .put("domain", domain);
                    return Ok(());
                }
                log::info!("disconnecting from domain {} before reconnecting", domain);
                ctx.session
                    .execute(DIRECTORY_SERVICE, "disconnect", Value::Null)
                    .await?;
                connect(ctx, &args, rv).await?;
            }
            (ConnectState::Disconnected, Some(domain)) => {
                log::info!("disconnecting from domain {}", domain);
                ctx.session
                    .execute(DIRECTORY_SERVICE, "disconnect", Value::Null)
                    .await?;
                rv.changed()
                    .msg("Successfully disconnected the Portal from Active Directory")
                    .put("domain", domain);
            }
            (ConnectState::Disconnected, None) => {
                rv.skipped()
                    .msg("The Portal is already not connected to Active Directory");
            }
        }
        Ok(())
    }
}
