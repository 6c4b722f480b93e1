//! Join an application server to an initialised portal

use async_trait::async_trait;
use ctera_core::{ArgumentError, Parameters, ResourceKind, ReturnValue};
use serde::Deserialize;
use serde_json::json;

use super::{run_setup, setup_finished};
use crate::args::parse;
use crate::runner::{Module, ModuleContext};

#[derive(Debug, Deserialize)]
pub struct InitApplicationServerArgs {
    pub ipaddr: String,
    #[serde(default)]
    pub secret: Option<String>,
}

pub struct InitApplicationServerModule;

#[async_trait]
impl Module for InitApplicationServerModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PortalInitApplicationServer
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Portal Initialization failed".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        parse::<InitApplicationServerArgs>(params).map(|_| ())
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: InitApplicationServerArgs = parse(&params)?;
        if setup_finished(ctx.session).await? {
            rv.skipped()
                .msg("The Portal Application Server is already configured");
            return Ok(());
        }
        run_setup(
            ctx.session,
            "initApplicationServer",
            json!({"ipaddr": args.ipaddr, "secret": args.secret}),
        )
        .await?;
        rv.changed()
            .msg("The Portal Application Server was configured")
            .put("ipaddr", args.ipaddr);
        Ok(())
    }
}
