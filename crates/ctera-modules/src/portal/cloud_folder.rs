//! Cloud drive folders

use async_trait::async_trait;
use ctera_client::{last_segment, segment};
use ctera_core::{modified_attributes, ArgumentError, Parameters, ResourceKind, ReturnValue};
use ctera_shared_types::PresentState;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::UserAccount;
use crate::args::{parse, required_if};
use crate::common::{plan_action, Action};
use crate::runner::{Module, ModuleContext};

#[derive(Debug, Serialize, Deserialize)]
pub struct CloudFolderArgs {
    #[serde(default)]
    pub state: PresentState,
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    pub owner: UserAccount,
    #[serde(default)]
    pub winacls: Option<bool>,
}

pub struct CloudFolderModule;

/// Folders are keyed by owner and name.
fn folders_of(owner: &UserAccount) -> String {
    format!("{}/cloudDrives", owner.reference())
}

fn to_cloud_folder_params(object: &Value) -> Parameters {
    let reference = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .map(|r| Value::from(last_segment(r)))
            .unwrap_or(Value::Null)
    };
    let mut folder = Parameters::new();
    folder.insert("name", object.get("name").cloned().unwrap_or(Value::Null));
    folder.insert("group", reference("group"));
    folder.insert("owner", json!({"name": reference("owner")}));
    folder
}

#[async_trait]
impl Module for CloudFolderModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PortalCloudFolder
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Cloud Folder management failed".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        let args: CloudFolderArgs = parse(params)?;
        required_if(
            args.state == PresentState::Present,
            "state",
            "present",
            &[("group", args.group.is_some())],
        )
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: CloudFolderArgs = parse(&params)?;
        let name = args.name.as_str();
        let collection = folders_of(&args.owner);
        let path = format!("{}/{}", collection, segment(name));

        let current = ctx
            .session
            .fetch(&path)
            .await?
            .map(|object| to_cloud_folder_params(&object));
        let action = plan_action(args.state, current.is_some(), || {
            let desired = Parameters::from_iter([
                ("name".to_string(), Value::from(name)),
                ("group".to_string(), json!(args.group)),
            ]);
            current
                .as_ref()
                .map(|current| modified_attributes(current, &desired))
                .unwrap_or_default()
        });

        match action {
            Action::Create => {
                let group = args.group.as_deref().unwrap_or_default();
                log::info!("creating cloud folder {} for {}", name, args.owner.account());
                let body = json!({
                    "name": name,
                    "group": format!("/foldersGroups/{}", segment(group)),
                    "owner": args.owner.reference(),
                    "winAcls": args.winacls.unwrap_or(true),
                });
                ctx.session.add(&collection, body).await?;
                rv.changed().msg("Cloud Folder created").put("name", name);
            }
            Action::Modify(diff) => {
                log::warn!(
                    "cloud folder {} differs in {:?}; folders cannot be modified",
                    name,
                    diff.keys().collect::<Vec<_>>()
                );
                rv.skipped().msg("Cloud Folder already exists").put("name", name);
            }
            Action::Unchanged => {
                rv.skipped().msg("Cloud Folder already exists").put("name", name);
            }
            Action::Delete => {
                log::info!("deleting cloud folder {}", name);
                ctx.session.delete(&path).await?;
                rv.changed().msg("Cloud Folder deleted").put("name", name);
            }
            Action::AlreadyAbsent => {
                rv.skipped()
                    .msg("Cloud Folder already does not exist")
                    .put("name", name);
            }
        }
        Ok(())
    }
}
