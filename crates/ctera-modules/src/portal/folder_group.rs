//! Folder groups

use async_trait::async_trait;
use ctera_client::segment;
use ctera_core::{ArgumentError, Parameters, ResourceKind, ReturnValue};
use ctera_shared_types::PresentState;
use serde::Deserialize;
use serde_json::{json, Value};

use super::UserAccount;
use crate::args::parse;
use crate::runner::{Module, ModuleContext};

const FOLDER_GROUPS: &str = "/foldersGroups";

#[derive(Debug, Deserialize)]
pub struct FolderGroupArgs {
    #[serde(default)]
    pub state: PresentState,
    pub name: String,
    #[serde(default)]
    pub owner: Option<UserAccount>,
}

pub struct FolderGroupModule;

#[async_trait]
impl Module for FolderGroupModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PortalFolderGroup
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Folder Group management failed".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        parse::<FolderGroupArgs>(params).map(|_| ())
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: FolderGroupArgs = parse(&params)?;
        let name = args.name.as_str();
        let path = format!("{}/{}", FOLDER_GROUPS, segment(name));
        let exists = ctx.session.fetch(&path).await?.is_some();

        match (args.state, exists) {
            (PresentState::Present, true) => {
                rv.skipped().msg("Folder Group already exists").put("name", name);
            }
            (PresentState::Present, false) => {
                let owner = args
                    .owner
                    .as_ref()
                    .map_or(Value::Null, |owner| Value::from(owner.reference()));
                log::info!("creating folder group {}", name);
                ctx.session
                    .add(FOLDER_GROUPS, json!({"name": name, "owner": owner}))
                    .await?;
                rv.changed().msg("Folder Group created").put("name", name);
            }
            (PresentState::Absent, true) => {
                log::info!("deleting folder group {}", name);
                ctx.session.delete(&path).await?;
                rv.changed().msg("Folder Group deleted").put("name", name);
            }
            (PresentState::Absent, false) => {
                rv.skipped()
                    .msg("Folder Group already does not exist")
                    .put("name", name);
            }
        }
        Ok(())
    }
}
