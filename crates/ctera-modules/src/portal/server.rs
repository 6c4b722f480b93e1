//! Portal servers (modify only)

use async_trait::async_trait;
use ctera_client::segment;
use ctera_core::{
    modified_attributes, ArgumentError, CteraError, Parameters, ResourceKind, ReturnValue,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::args::{parse, required_if};
use crate::common::merge_put;
use crate::runner::{Module, ModuleContext};

const SERVERS: &str = "/servers";

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerArgs {
    pub name: String,
    #[serde(default)]
    pub server_name: Option<String>,
    #[serde(default)]
    pub app: Option<bool>,
    #[serde(default)]
    pub preview: Option<bool>,
    #[serde(default)]
    pub enable_public_ip: Option<bool>,
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub allow_user_login: Option<bool>,
    #[serde(default)]
    pub enable_replication: Option<bool>,
    #[serde(default)]
    pub replica_of: Option<String>,
}

pub struct ServerModule;

fn to_server_params(object: &Value) -> Parameters {
    let field = |key: &str| object.get(key).cloned().unwrap_or(Value::Null);
    let public_ip = field("publicIpaddr");
    let replication = object.get("replicationSettings").filter(|v| !v.is_null());
    let enabled = |value: &Value| match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    };

    let mut server = Parameters::new();
    server.insert("server_name", field("name"));
    server.insert("app", field("isApplicationServer"));
    server.insert("preview", field("renderingServer"));
    server.insert("enable_public_ip", enabled(&public_ip));
    server.insert("public_ip", public_ip);
    server.insert("allow_user_login", field("allowUserLogin"));
    server.insert("enable_replication", replication.is_some());
    server.insert(
        "replica_of",
        replication
            .and_then(|r| r.get("replicationOf"))
            .cloned()
            .unwrap_or(Value::Null),
    );
    server
}

fn to_vendor_fields(diff: &Parameters) -> Map<String, Value> {
    let mut fields = Map::new();
    for (key, value) in diff.iter() {
        let vendor = match key.as_str() {
            "server_name" => "name",
            "app" => "isApplicationServer",
            "preview" => "renderingServer",
            "public_ip" => "publicIpaddr",
            "allow_user_login" => "allowUserLogin",
            _ => continue,
        };
        fields.insert(vendor.to_string(), value.clone());
    }
    if diff.get("enable_public_ip") == Some(&Value::Bool(false)) {
        fields.insert("publicIpaddr".to_string(), Value::Null);
    }
    match diff.get("enable_replication") {
        Some(Value::Bool(false)) => {
            fields.insert("replicationSettings".to_string(), Value::Null);
        }
        _ => {
            if let Some(replica_of) = diff.get_present("replica_of") {
                fields.insert(
                    "replicationSettings".to_string(),
                    json!({"replicationOf": replica_of}),
                );
            }
        }
    }
    fields
}

#[async_trait]
impl Module for ServerModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PortalServer
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Server management failed".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        let args: ServerArgs = parse(params)?;
        required_if(
            args.enable_replication == Some(true),
            "enable_replication",
            "True",
            &[("replica_of", args.replica_of.is_some())],
        )?;
        required_if(
            args.enable_public_ip == Some(true),
            "enable_public_ip",
            "True",
            &[("public_ip", args.public_ip.is_some())],
        )
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: ServerArgs = parse(&params)?;
        let mut desired = Parameters::from_serializable(&args)?;
        desired.pop("name");
        let name = args.name.as_str();
        let path = format!("{}/{}", SERVERS, segment(name));

        let Some(object) = ctx.session.fetch(&path).await? else {
            return Err(CteraError::precondition(format!(
                "Server does not exist: {}",
                name
            )));
        };
        let diff = modified_attributes(&to_server_params(&object), &desired);
        if diff.is_empty() {
            rv.skipped()
                .msg("Server configuration did not change")
                .put("name", name);
            return Ok(());
        }

        let (allowed, _) = self.kind().capabilities().split_modifications(&diff);
        log::info!(
            "modifying server {}: {:?}",
            name,
            allowed.keys().collect::<Vec<_>>()
        );
        merge_put(ctx.session, &path, object, to_vendor_fields(&allowed)).await?;
        rv.changed().msg("Server modified").put("name", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_reshape() {
        let server = to_server_params(&json!({
            "name": "server1",
            "isApplicationServer": true,
            "renderingServer": false,
            "publicIpaddr": null,
            "allowUserLogin": true,
            "replicationSettings": {"replicationOf": "server2"}
        }));
        assert_eq!(server.get("enable_public_ip"), Some(&json!(false)));
        assert_eq!(server.get("enable_replication"), Some(&json!(true)));
        assert_eq!(server.get("replica_of"), Some(&json!("server2")));
    }

    #[test]
    fn test_disabling_clears_vendor_settings() {
        let diff: Parameters = serde_json::from_value(json!({
            "enable_public_ip": false,
            "enable_replication": false,
            "app": false
        }))
        .unwrap();
        let fields = to_vendor_fields(&diff);
        assert_eq!(fields["publicIpaddr"], Value::Null);
        assert_eq!(fields["replicationSettings"], Value::Null);
        assert_eq!(fields["isApplicationServer"], json!(false));
    }
}
