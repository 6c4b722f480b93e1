//! Storage nodes (object storage buckets)

use async_trait::async_trait;
use ctera_client::{last_segment, public_fields, segment};
use ctera_core::{modified_attributes, ArgumentError, Parameters, ResourceKind, ReturnValue};
use ctera_shared_types::PresentState;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::args::{parse, required_if};
use crate::common::{merge_put, plan_action, Action};
use crate::runner::{Module, ModuleContext};

const LOCATIONS: &str = "/locations";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketType {
    Azure,
    Scality,
    AWS,
    ICOS,
    GenericS3,
    Nutanix,
    Wasabi,
    Google,
    NetAppStorageGRID,
}

impl BucketType {
    const ALL: [BucketType; 9] = [
        BucketType::Azure,
        BucketType::Scality,
        BucketType::AWS,
        BucketType::ICOS,
        BucketType::GenericS3,
        BucketType::Nutanix,
        BucketType::Wasabi,
        BucketType::Google,
        BucketType::NetAppStorageGRID,
    ];

    /// Storage type as the portal names it
    pub fn vendor_name(&self) -> &'static str {
        match self {
            BucketType::Azure => "Azure",
            BucketType::Scality => "Scality",
            BucketType::AWS => "S3",
            BucketType::ICOS => "ICOS",
            BucketType::GenericS3 => "S3Compatible",
            BucketType::Nutanix => "Nutanix",
            BucketType::Wasabi => "Wasabi",
            BucketType::Google => "Google",
            BucketType::NetAppStorageGRID => "NetAppStorageGRID",
        }
    }

    pub fn from_vendor_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.vendor_name() == name)
    }

    fn access_key_field(&self) -> &'static str {
        match self {
            BucketType::Azure => "accountName",
            _ => "awsAccessKey",
        }
    }

    fn secret_key_field(&self) -> &'static str {
        match self {
            BucketType::Azure => "secretAccess",
            _ => "awsSecretKey",
        }
    }

    fn endpoint_field(&self) -> &'static str {
        match self {
            BucketType::AWS => "s3Endpoint",
            _ => "endPoint",
        }
    }

    fn https_field(&self) -> &'static str {
        match self {
            BucketType::AWS => "httpsOnly",
            _ => "useHttps",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketInfo {
    pub bucket_type: BucketType,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub https: Option<bool>,
    #[serde(default)]
    pub direct: Option<bool>,
}

impl BucketInfo {
    fn to_vendor(&self) -> Map<String, Value> {
        let kind = self.bucket_type;
        let mut fields = Map::new();
        fields.insert("storage".to_string(), Value::from(kind.vendor_name()));
        fields.insert("bucket".to_string(), Value::from(self.bucket.clone()));
        fields.insert(
            kind.access_key_field().to_string(),
            Value::from(self.access_key.clone()),
        );
        fields.insert(
            kind.secret_key_field().to_string(),
            Value::from(self.secret_key.clone()),
        );
        if let Some(endpoint) = &self.endpoint {
            fields.insert(kind.endpoint_field().to_string(), Value::from(endpoint.clone()));
        }
        if let Some(https) = self.https {
            fields.insert(kind.https_field().to_string(), Value::from(https));
        }
        if let Some(direct) = self.direct {
            fields.insert("directUpload".to_string(), Value::from(direct));
        }
        fields
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StorageNodeArgs {
    #[serde(default)]
    pub state: PresentState,
    pub name: String,
    #[serde(default)]
    pub bucket_info: Option<BucketInfo>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub dedicated_to: Option<String>,
}

pub struct StorageNodeModule;

fn bucket_info_of(fields: &Parameters) -> Value {
    let storage = fields.get_str("storage").unwrap_or_default();
    let Some(kind) = BucketType::from_vendor_name(storage) else {
        return json!({"bucket_type": storage, "bucket": fields.get("bucket")});
    };
    let field = |name: &str| fields.get(name).cloned().unwrap_or(Value::Null);
    json!({
        "bucket_type": kind,
        "bucket": field("bucket"),
        "access_key": field(kind.access_key_field()),
        "secret_key": field(kind.secret_key_field()),
        "endpoint": field(kind.endpoint_field()),
        "https": field(kind.https_field()),
        "direct": field("directUpload"),
    })
}

fn to_storage_node_params(object: &Value) -> Parameters {
    let fields = public_fields(object);
    let dedicated_to = fields
        .get_str("dedicatedPortal")
        .map_or(Value::Null, |portal| Value::from(last_segment(portal)));
    let mut node = Parameters::new();
    node.insert("name", fields.get("name").cloned().unwrap_or(Value::Null));
    node.insert("bucket_info", bucket_info_of(&fields));
    node.insert("read_only", fields.get("readOnly").cloned().unwrap_or(Value::Null));
    node.insert("dedicated_to", dedicated_to);
    node
}

fn dedicated_portal(tenant: Option<&str>) -> Value {
    tenant.map_or(Value::Null, |tenant| {
        Value::from(format!("/portals/{}", segment(tenant)))
    })
}

#[async_trait]
impl Module for StorageNodeModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PortalStorageNode
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Storage Node Management failed".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        let args: StorageNodeArgs = parse(params)?;
        required_if(
            args.state == PresentState::Present,
            "state",
            "present",
            &[("bucket_info", args.bucket_info.is_some())],
        )
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: StorageNodeArgs = parse(&params)?;
        let mut desired = Parameters::from_serializable(&args)?;
        desired.pop("state");
        let name = args.name.as_str();
        let path = format!("{}/{}", LOCATIONS, segment(name));

        let object = ctx.session.fetch(&path).await?;
        let current = object.as_ref().map(to_storage_node_params);
        let action = plan_action(args.state, current.is_some(), || {
            current
                .as_ref()
                .map(|current| modified_attributes(current, &desired))
                .unwrap_or_default()
        });

        match action {
            Action::Create => {
                let mut body = Map::new();
                body.insert("name".to_string(), Value::from(name));
                body.insert("readOnly".to_string(), Value::from(args.read_only));
                body.insert(
                    "dedicatedPortal".to_string(),
                    dedicated_portal(args.dedicated_to.as_deref()),
                );
                if let Some(bucket) = &args.bucket_info {
                    body.extend(bucket.to_vendor());
                }
                log::info!("creating storage node {}", name);
                ctx.session.add(LOCATIONS, Value::Object(body)).await?;
                rv.changed().msg("Storage Node was created");
            }
            Action::Modify(diff) => {
                let (allowed, rejected) = self.kind().capabilities().split_modifications(&diff);
                let mut messages = Vec::new();
                if rejected.contains_key("bucket_info") {
                    messages.push("Modifying the bucket info is currently not supported");
                }
                if allowed.is_empty() {
                    rv.skipped();
                    messages.push("Storage Node details did not change");
                } else {
                    log::info!(
                        "modifying storage node {}: {:?}",
                        name,
                        allowed.keys().collect::<Vec<_>>()
                    );
                    let mut changes = Map::new();
                    if let Some(read_only) = allowed.get("read_only") {
                        changes.insert("readOnly".to_string(), read_only.clone());
                    }
                    if allowed.contains_key("dedicated_to") {
                        changes.insert(
                            "dedicatedPortal".to_string(),
                            dedicated_portal(args.dedicated_to.as_deref()),
                        );
                    }
                    merge_put(ctx.session, &path, object.unwrap_or(Value::Null), changes).await?;
                    rv.changed();
                    messages.push("Storage Node was modified");
                }
                rv.put("name", name).msg(messages.join(" "));
            }
            Action::Unchanged => {
                rv.skipped()
                    .msg("Storage Node details did not change")
                    .put("name", name);
            }
            Action::Delete => {
                log::info!("deleting storage node {}", name);
                ctx.session.delete(&path).await?;
                rv.changed().msg("Storage Node deleted").put("name", name);
            }
            Action::AlreadyAbsent => {
                rv.skipped()
                    .msg("Storage Node already does not exist")
                    .put("name", name);
            }
        }
        Ok(())
    }
}
