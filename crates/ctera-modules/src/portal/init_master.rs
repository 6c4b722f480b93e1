//! First-time setup of the primary portal server

use async_trait::async_trait;
use ctera_core::{ArgumentError, Parameters, ResourceKind, ReturnValue};
use serde::Deserialize;
use serde_json::json;

use super::{run_setup, setup_finished};
use crate::args::parse;
use crate::runner::{Module, ModuleContext};

#[derive(Debug, Deserialize)]
pub struct InitMasterArgs {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub domain: String,
}

pub struct InitMasterModule;

#[async_trait]
impl Module for InitMasterModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PortalInitMaster
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Portal Initialization failed".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        parse::<InitMasterArgs>(params).map(|_| ())
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: InitMasterArgs = parse(&params)?;
        if setup_finished(ctx.session).await? {
            rv.skipped()
                .msg("The Portal Master Server is already configured");
            return Ok(());
        }
        // The first administrator logs in with the module's own credentials.
        let body = json!({
            "name": ctx.connection.ctera_user,
            "password": ctx.connection.ctera_password,
            "email": args.email,
            "firstName": args.first_name,
            "lastName": args.last_name,
            "domain": args.domain,
        });
        run_setup(ctx.session, "initMaster", body).await?;
        rv.changed()
            .msg("The Portal Master Server was configured")
            .put("domain", args.domain);
        Ok(())
    }
}
