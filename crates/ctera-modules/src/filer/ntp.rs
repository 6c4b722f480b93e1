//! NTP client configuration

use async_trait::async_trait;
use ctera_core::{lists_differ, ArgumentError, Parameters, ResourceKind, ReturnValue};
use ctera_shared_types::ToggleState;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::args::{parse, required_if};
use crate::common::{as_list, merge_put};
use crate::runner::{Module, ModuleContext};

const TIME: &str = "/config/time";

#[derive(Debug, Deserialize)]
pub struct NtpArgs {
    #[serde(default)]
    pub state: ToggleState,
    #[serde(default)]
    pub servers: Option<Vec<String>>,
}

pub struct NtpModule;

fn is_enabled(config: &Value) -> bool {
    config.get("NTPMode").and_then(Value::as_str) == Some("enabled")
}

#[async_trait]
impl Module for NtpModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::FilerNtp
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Failed to update NTP configuration".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        let args: NtpArgs = parse(params)?;
        required_if(
            args.state == ToggleState::Enabled,
            "state",
            "enabled",
            &[("servers", args.servers.is_some())],
        )
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: NtpArgs = parse(&params)?;
        let config = ctx.session.fetch(TIME).await?.unwrap_or(Value::Null);

        match args.state {
            ToggleState::Enabled => {
                let servers: Vec<Value> = args
                    .servers
                    .unwrap_or_default()
                    .into_iter()
                    .map(Value::from)
                    .collect();
                let was_enabled = is_enabled(&config);
                if was_enabled && !lists_differ(&as_list(config.get("NTPServer")), &servers) {
                    rv.skipped()
                        .msg("NTP configuration did not change")
                        .put("servers", servers);
                    return Ok(());
                }
                log::info!("enabling NTP with {} server(s)", servers.len());
                let mut changes = Map::new();
                changes.insert("NTPMode".to_string(), Value::from("enabled"));
                changes.insert("NTPServer".to_string(), Value::Array(servers.clone()));
                merge_put(ctx.session, TIME, config, changes).await?;
                let msg = if was_enabled {
                    "Updated NTP configuration"
                } else {
                    "Enabled NTP"
                };
                rv.changed().msg(msg).put("servers", servers);
            }
            ToggleState::Disabled => {
                if !is_enabled(&config) {
                    rv.skipped().msg("NTP is already disabled");
                    return Ok(());
                }
                log::info!("disabling NTP");
                let mut changes = Map::new();
                changes.insert("NTPMode".to_string(), Value::from("disabled"));
                merge_put(ctx.session, TIME, config, changes).await?;
                rv.changed().msg("Disabled NTP");
            }
        }
        Ok(())
    }
}
