//! Remote syslog forwarding

use async_trait::async_trait;
use ctera_core::{modified_attributes, ArgumentError, Parameters, ResourceKind, ReturnValue};
use ctera_shared_types::ToggleState;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::args::{parse, required_if};
use crate::common::{from_vendor, merge_put, to_vendor};
use crate::runner::{Module, ModuleContext};

const SYSLOG: &str = "/settings/logsSettings/syslogConfig";
const DEFAULT_PORT: u16 = 514;

const FIELDS: [(&str, &str); 3] = [
    ("server", "server"),
    ("port", "port"),
    ("min_severity", "minSeverity"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
    Warning,
    Critical,
    Alert,
    Emergency,
    Debug,
    Notice,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyslogArgs {
    #[serde(default)]
    pub state: ToggleState,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub min_severity: Option<Severity>,
}

pub struct SyslogModule;

#[async_trait]
impl Module for SyslogModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PortalSyslog
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Syslog management failed".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        let args: SyslogArgs = parse(params)?;
        required_if(
            args.state == ToggleState::Enabled,
            "state",
            "enabled",
            &[("server", args.server.is_some())],
        )
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: SyslogArgs = parse(&params)?;
        let mut desired = Parameters::from_serializable(&args)?;
        desired.pop("state");

        let config = ctx.session.fetch(SYSLOG).await?.unwrap_or(Value::Null);
        let enabled = config.get("mode").and_then(Value::as_str) == Some("enabled");

        match args.state {
            ToggleState::Enabled if enabled => {
                let diff = modified_attributes(&from_vendor(&config, &FIELDS), &desired);
                if diff.is_empty() {
                    rv.skipped().msg("Syslog server config did not change");
                } else {
                    log::info!("modifying syslog: {:?}", diff.keys().collect::<Vec<_>>());
                    merge_put(ctx.session, SYSLOG, config, to_vendor(&diff, &FIELDS)).await?;
                    rv.changed().msg("Syslog server configuration was modified");
                }
            }
            ToggleState::Enabled => {
                let server = args.server.clone().unwrap_or_default();
                log::info!("enabling syslog forwarding to {}", server);
                let mut changes = to_vendor(&desired.drop_nulls(), &FIELDS);
                changes.insert("mode".to_string(), Value::from("enabled"));
                changes
                    .entry("port".to_string())
                    .or_insert_with(|| Value::from(DEFAULT_PORT));
                changes
                    .entry("minSeverity".to_string())
                    .or_insert_with(|| Value::from("info"));
                merge_put(ctx.session, SYSLOG, config, changes).await?;
                rv.changed().msg("Syslog server enabled").put("server", server);
            }
            ToggleState::Disabled if enabled => {
                log::info!("disabling syslog forwarding");
                let mut changes = Map::new();
                changes.insert("mode".to_string(), Value::from("disabled"));
                merge_put(ctx.session, SYSLOG, config, changes).await?;
                rv.changed().msg("Syslog server disabled");
            }
            ToggleState::Disabled => {
                rv.skipped().msg("Syslog server is already disabled");
            }
        }
        Ok(())
    }
}
