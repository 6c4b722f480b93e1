//! Static domain controllers

use async_trait::async_trait;
use ctera_core::{ArgumentError, Parameters, ResourceKind, ReturnValue};
use ctera_shared_types::PresentState;
use serde::Deserialize;
use serde_json::Value;

use crate::args::{parse, required_if};
use crate::runner::{Module, ModuleContext};

const PASSWORD_SERVER: &str = "/config/fileservices/cifs/passwordServer";

#[derive(Debug, Deserialize)]
pub struct DomainControllersArgs {
    #[serde(default)]
    pub state: PresentState,
    #[serde(default)]
    pub domain_controllers: Option<Vec<String>>,
}

pub struct DomainControllersModule;

#[async_trait]
impl Module for DomainControllersModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::FilerDomainControllers
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Failed to update domain controllers".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        let args: DomainControllersArgs = parse(params)?;
        required_if(
            args.state == PresentState::Present,
            "state",
            "present",
            &[("domain_controllers", args.domain_controllers.is_some())],
        )
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: DomainControllersArgs = parse(&params)?;
        let current = ctx
            .session
            .fetch(PASSWORD_SERVER)
            .await?
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default();

        match args.state {
            PresentState::Present => {
                let wanted = args.domain_controllers.unwrap_or_default().join(" ");
                if wanted == current {
                    rv.skipped()
                        .msg("Static domain controllers configuration did not change")
                        .put("domain_controllers", current);
                } else {
                    log::info!("setting static domain controllers: {}", wanted);
                    ctx.session
                        .put(PASSWORD_SERVER, Value::from(wanted.clone()))
                        .await?;
                    rv.changed()
                        .msg("Static domain controllers set")
                        .put("domain_controllers", wanted);
                }
            }
            PresentState::Absent => {
                if current.is_empty() {
                    rv.skipped()
                        .msg("No static domain controllers configuration exists");
                } else {
                    log::info!("removing static domain controllers");
                    ctx.session.put(PASSWORD_SERVER, Value::from("")).await?;
                    rv.changed()
                        .msg("Static domain controllers removed")
                        .put("domain_controllers", current);
                }
            }
        }
        Ok(())
    }
}
