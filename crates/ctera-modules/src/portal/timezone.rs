//! Portal timezone

use async_trait::async_trait;
use ctera_core::{ArgumentError, Parameters, ResourceKind, ReturnValue};
use serde::Deserialize;
use serde_json::Value;

use crate::args::parse;
use crate::runner::{Module, ModuleContext};

const TIMEZONE: &str = "/settings/timezone";

#[derive(Debug, Deserialize)]
pub struct TimezoneArgs {
    pub timezone: String,
}

pub struct TimezoneModule;

#[async_trait]
impl Module for TimezoneModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PortalTimezone
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Failed to update timezone".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        parse::<TimezoneArgs>(params).map(|_| ())
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: TimezoneArgs = parse(&params)?;
        let current = ctx
            .session
            .fetch(TIMEZONE)
            .await?
            .and_then(|value| value.as_str().map(str::to_string));

        if current.as_deref() == Some(args.timezone.as_str()) {
            rv.skipped()
                .msg("No update required to the current timezone")
                .put("current_timezone", args.timezone);
            return Ok(());
        }
        log::info!("setting timezone to {}", args.timezone);
        ctx.session
            .put(TIMEZONE, Value::from(args.timezone.clone()))
            .await?;
        rv.changed()
            .msg("Changed timezone")
            .put("previous_timezone", current)
            .put("current_timezone", args.timezone);
        Ok(())
    }
}
