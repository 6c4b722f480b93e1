//! SMB/NFS shares

use async_trait::async_trait;
use ctera_client::{public_fields, segment};
use ctera_core::{
    modified_attributes, ArgumentError, CteraError, Parameters, ResourceKind, ReturnValue,
};
use ctera_shared_types::PresentState;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::args::parse;
use crate::common::{merge_put, plan_action, Action};
use crate::runner::{Module, ModuleContext};

const SHARES: &str = "/config/fileservices/share";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrincipalType {
    LocalUser,
    LocalGroup,
    DomainUser,
    DomainGroup,
}

impl PrincipalType {
    fn is_local(&self) -> bool {
        matches!(self, PrincipalType::LocalUser | PrincipalType::LocalGroup)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileAccess {
    ReadWrite,
    ReadOnly,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    pub principal_type: PrincipalType,
    pub name: String,
    pub perm: FileAccess,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NfsClient {
    pub address: String,
    pub netmask: String,
    pub perm: FileAccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShareAccess {
    #[default]
    #[serde(rename = "winAclMode")]
    WinAclMode,
    #[serde(rename = "authenticated")]
    Authenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientSideCaching {
    #[default]
    Manual,
    Documents,
    Disable,
}

fn default_dir_permissions() -> u32 {
    777
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareArgs {
    #[serde(default)]
    pub state: PresentState,
    pub name: String,
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub acl: Option<Vec<AclEntry>>,
    #[serde(default)]
    pub access: ShareAccess,
    #[serde(default)]
    pub csc: ClientSideCaching,
    #[serde(default = "default_dir_permissions")]
    pub dir_permissions: u32,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub export_to_afp: bool,
    #[serde(default)]
    pub export_to_ftp: bool,
    #[serde(default)]
    pub export_to_nfs: bool,
    #[serde(default)]
    pub export_to_pc_agent: bool,
    #[serde(default)]
    pub export_to_rsync: bool,
    #[serde(default)]
    pub indexed: bool,
    #[serde(default)]
    pub trusted_nfs_clients: Option<Vec<NfsClient>>,
}

const FIELDS: [(&str, &str); 9] = [
    ("access", "access"),
    ("csc", "clientSideCaching"),
    ("dir_permissions", "dirPermissions"),
    ("comment", "comment"),
    ("export_to_afp", "exportToAFP"),
    ("export_to_ftp", "exportToFTP"),
    ("export_to_nfs", "exportToNFS"),
    ("export_to_pc_agent", "exportToPCAgent"),
    ("export_to_rsync", "exportToRSync"),
];

/// `main/public` style path without surrounding slashes
fn normalize_directory(directory: &str) -> String {
    directory.trim_matches('/').to_string()
}

/// Split `volume/some/dir` into the volume and the `/some/dir` below it.
fn split_directory(directory: &str) -> (String, String) {
    let directory = normalize_directory(directory);
    match directory.split_once('/') {
        Some((volume, rest)) => (volume.to_string(), format!("/{}", rest)),
        None => (directory, "/".to_string()),
    }
}

fn acl_from_vendor(entry: &Value) -> Value {
    let principal = &entry["principal2"];
    let principal_type = principal["_classname"].as_str().unwrap_or_default();
    let name = if matches!(principal_type, "LocalUser" | "LocalGroup") {
        let reference = principal["ref"].as_str().unwrap_or_default();
        reference.rsplit('#').next().unwrap_or(reference)
    } else {
        principal["name"].as_str().unwrap_or_default()
    };
    json!({
        "principal_type": principal_type,
        "name": name,
        "perm": entry["permissions"]["allowedFileAccess"],
    })
}

fn acl_to_vendor(entry: &AclEntry) -> Value {
    let principal = if entry.principal_type.is_local() {
        let collection = match entry.principal_type {
            PrincipalType::LocalUser => "users",
            _ => "groups",
        };
        json!({
            "_classname": entry.principal_type,
            "ref": format!("#config#auth#{}#{}", collection, entry.name),
        })
    } else {
        json!({"_classname": entry.principal_type, "name": entry.name})
    };
    json!({"principal2": principal, "permissions": {"allowedFileAccess": entry.perm}})
}

fn nfs_client_to_vendor(client: &NfsClient) -> Value {
    json!({"address": client.address, "netmask": client.netmask, "accessLevel": client.perm})
}

fn to_share_params(object: &Value) -> Parameters {
    let fields = public_fields(object);
    let mut share = Parameters::new();
    share.insert("name", fields.get("name").cloned().unwrap_or(Value::Null));
    let volume = fields.get_str("volume").unwrap_or_default();
    let directory = fields.get_str("directory").unwrap_or_default();
    share.insert(
        "directory",
        normalize_directory(&format!("{}/{}", volume, directory.trim_start_matches('/'))),
    );
    let acl: Vec<Value> = crate::common::as_list(fields.get("acl"))
        .iter()
        .map(acl_from_vendor)
        .collect();
    share.insert("acl", acl);
    for (param, vendor) in FIELDS {
        share.insert(param, fields.get(vendor).cloned().unwrap_or(Value::Null));
    }
    share.insert("indexed", fields.get("indexed").cloned().unwrap_or(Value::Null));
    let clients: Vec<Value> = crate::common::as_list(fields.get("trustedNFSClients"))
        .iter()
        .map(|client| {
            json!({
                "address": client["address"],
                "netmask": client["netmask"],
                "perm": client["accessLevel"],
            })
        })
        .collect();
    share.insert("trusted_nfs_clients", clients);
    share
}

/// Vendor body for the given (already typed-checked) parameters.
fn to_vendor_fields(params: &Parameters, args: &ShareArgs) -> Map<String, Value> {
    let mut body = Map::new();
    for (key, value) in params.iter() {
        match key.as_str() {
            "name" => {
                body.insert("name".to_string(), value.clone());
            }
            "directory" => {
                if let Some(directory) = &args.directory {
                    let (volume, directory) = split_directory(directory);
                    body.insert("volume".to_string(), Value::from(volume));
                    body.insert("directory".to_string(), Value::from(directory));
                }
            }
            "acl" => {
                let acl = args.acl.iter().flatten().map(acl_to_vendor).collect();
                body.insert("acl".to_string(), Value::Array(acl));
            }
            "trusted_nfs_clients" => {
                let clients = args
                    .trusted_nfs_clients
                    .iter()
                    .flatten()
                    .map(nfs_client_to_vendor)
                    .collect();
                body.insert("trustedNFSClients".to_string(), Value::Array(clients));
            }
            "indexed" => {
                body.insert("indexed".to_string(), value.clone());
            }
            other => {
                if let Some((_, vendor)) = FIELDS.iter().find(|(param, _)| *param == other) {
                    body.insert(vendor.to_string(), value.clone());
                }
            }
        }
    }
    body
}

pub struct ShareModule;

#[async_trait]
impl Module for ShareModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::FilerShare
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Share management failed".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        parse::<ShareArgs>(params).map(|_| ())
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: ShareArgs = parse(&params)?;
        let mut desired = Parameters::from_serializable(&args)?;
        desired.pop("state");
        if let Some(directory) = &args.directory {
            desired.insert("directory", normalize_directory(directory));
        }
        let name = args.name.as_str();
        let path = format!("{}/{}", SHARES, segment(name));

        let object = ctx.session.fetch(&path).await?;
        let current = object.as_ref().map(to_share_params);
        let action = plan_action(args.state, current.is_some(), || {
            current
                .as_ref()
                .map(|current| modified_attributes(current, &desired))
                .unwrap_or_default()
        });

        match action {
            Action::Create => {
                if args.directory.is_none() {
                    return Err(CteraError::precondition(
                        "Cannot create new share without a directory",
                    ));
                }
                let create = self.kind().capabilities().create_params(&desired).drop_nulls();
                log::info!("creating share {}", name);
                let body = to_vendor_fields(&create, &args);
                ctx.session.add(SHARES, Value::Object(body)).await?;
                rv.changed().msg("Share created").put("name", name);
            }
            Action::Modify(diff) => {
                log::info!(
                    "modifying share {}: {:?}",
                    name,
                    diff.keys().collect::<Vec<_>>()
                );
                let changes = to_vendor_fields(&diff, &args);
                let object = object.unwrap_or(Value::Null);
                merge_put(ctx.session, &path, object, changes).await?;
                rv.changed().msg("Share modified").put("name", name);
            }
            Action::Unchanged => {
                rv.skipped()
                    .msg("Share details did not change")
                    .put("name", name);
            }
            Action::Delete => {
                log::info!("deleting share {}", name);
                ctx.session.delete(&path).await?;
                rv.changed().msg("Share deleted").put("name", name);
            }
            Action::AlreadyAbsent => {
                rv.skipped().msg("Share does not exist").put("name", name);
            }
        }
        Ok(())
    }
}
