//! SNMP agent

use async_trait::async_trait;
use ctera_core::{modified_attributes, ArgumentError, Parameters, ResourceKind, ReturnValue};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::args::parse;
use crate::common::merge_put;
use crate::runner::{Module, ModuleContext};

const SNMP: &str = "/config/snmp";
const DEFAULT_PORT: u16 = 161;

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnmpArgs {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub community_str: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub update_password: bool,
}

pub struct SnmpModule;

fn snmp_params(config: &Value) -> Parameters {
    let v3 = config.get("snmpV3").filter(|v| !v.is_null());
    let mut current = Parameters::new();
    current.insert("port", config.get("port").cloned().unwrap_or(Value::Null));
    current.insert(
        "community_str",
        config.get("readCommunity").cloned().unwrap_or(Value::Null),
    );
    current.insert(
        "username",
        v3.and_then(|v3| v3.get("username")).cloned().unwrap_or(Value::Null),
    );
    current.insert(
        "password",
        v3.and_then(|v3| v3.get("password")).cloned().unwrap_or(Value::Null),
    );
    current
}

/// Vendor fields for a set of SNMP parameters, merged over the current `snmpV3` block.
fn snmp_changes(config: &Value, params: &Parameters) -> Map<String, Value> {
    let mut changes = Map::new();
    if let Some(port) = params.get_present("port") {
        changes.insert("port".to_string(), port.clone());
    }
    if let Some(community) = params.get_present("community_str") {
        changes.insert("readCommunity".to_string(), community.clone());
    }
    let username = params.get_present("username");
    let password = params.get_present("password");
    if username.is_some() || password.is_some() {
        let mut v3 = match config.get("snmpV3") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        v3.insert("mode".to_string(), Value::from("enabled"));
        if let Some(username) = username {
            v3.insert("username".to_string(), username.clone());
        }
        if let Some(password) = password {
            v3.insert("password".to_string(), password.clone());
        }
        changes.insert("snmpV3".to_string(), Value::Object(v3));
    }
    changes
}

#[async_trait]
impl Module for SnmpModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::FilerSnmp
    }

    fn failure_message(&self, params: &Parameters) -> String {
        let enabled = params
            .get("enabled")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        format!("Failed to {} SNMP.", if enabled { "enable" } else { "disable" })
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        parse::<SnmpArgs>(params).map(|_| ())
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: SnmpArgs = parse(&params)?;
        let mut desired = Parameters::from_serializable(&args)?;
        desired.pop("enabled");
        desired.pop("update_password");

        let config = ctx.session.fetch(SNMP).await?.unwrap_or(Value::Null);
        let snmp_enabled = config.get("mode").and_then(Value::as_str) == Some("enabled");

        if !args.enabled {
            if snmp_enabled {
                log::info!("disabling SNMP");
                let mut changes = Map::new();
                changes.insert("mode".to_string(), Value::from("disabled"));
                merge_put(ctx.session, SNMP, config, changes).await?;
                rv.changed().msg("Disabled SNMP");
            } else {
                rv.skipped().msg("SNMP is already disabled");
            }
            return Ok(());
        }

        if snmp_enabled {
            if !args.update_password {
                desired.pop("password");
            }
            let diff = modified_attributes(&snmp_params(&config), &desired);
            if diff.is_empty() {
                rv.skipped().msg("No change made to the SNMP configuration");
            } else {
                log::info!("modifying SNMP: {:?}", diff.keys().collect::<Vec<_>>());
                let changes = snmp_changes(&config, &diff);
                merge_put(ctx.session, SNMP, config, changes).await?;
                rv.changed().msg("Modified SNMP configuration");
            }
            return Ok(());
        }

        let enable = self.kind().capabilities().create_params(&desired);
        log::info!("enabling SNMP");
        let mut changes = snmp_changes(&config, &enable);
        changes.insert("mode".to_string(), Value::from("enabled"));
        changes
            .entry("port".to_string())
            .or_insert_with(|| json!(DEFAULT_PORT));
        if !changes.contains_key("snmpV3") {
            changes.insert("snmpV3".to_string(), Value::Null);
        }
        merge_put(ctx.session, SNMP, config, changes).await?;
        rv.changed().msg("Enabled SNMP");
        Ok(())
    }
}
