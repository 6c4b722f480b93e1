//! Set up a replication server for an existing database server

use async_trait::async_trait;
use ctera_core::{ArgumentError, Parameters, ResourceKind, ReturnValue};
use serde::Deserialize;
use serde_json::json;

use super::{run_setup, setup_finished};
use crate::args::parse;
use crate::runner::{Module, ModuleContext};

#[derive(Debug, Deserialize)]
pub struct InitReplicationServerArgs {
    pub ipaddr: String,
    pub secret: String,
    pub replicate_from: String,
}

pub struct InitReplicationServerModule;

#[async_trait]
impl Module for InitReplicationServerModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PortalInitReplicationServer
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Portal Initialization failed".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        parse::<InitReplicationServerArgs>(params).map(|_| ())
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: InitReplicationServerArgs = parse(&params)?;
        if setup_finished(ctx.session).await? {
            rv.skipped()
                .msg("The Portal Replication Server is already configured");
            return Ok(());
        }
        let body = json!({
            "ipaddr": args.ipaddr,
            "secret": args.secret,
            "replicateFrom": args.replicate_from,
        });
        run_setup(ctx.session, "initReplicationServer", body).await?;
        rv.changed()
            .msg("The Portal Replication Server was configured")
            .put("replicate_from", args.replicate_from);
        Ok(())
    }
}
