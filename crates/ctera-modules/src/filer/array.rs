//! Storage arrays

use async_trait::async_trait;
use ctera_client::{public_fields, segment};
use ctera_core::{modified_attributes, ArgumentError, Parameters, ResourceKind, ReturnValue};
use ctera_shared_types::PresentState;
use serde::{Deserialize, Serialize};

use crate::args::{parse, required_if};
use crate::common::{plan_action, Action};
use crate::runner::{Module, ModuleContext};

const ARRAYS: &str = "/config/storage/arrays";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrayLevel {
    #[serde(rename = "lvm")]
    Lvm,
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "0")]
    Raid0,
    #[serde(rename = "1")]
    Raid1,
    #[serde(rename = "5")]
    Raid5,
    #[serde(rename = "6")]
    Raid6,
}

#[derive(Debug, Deserialize)]
pub struct ArrayArgs {
    #[serde(default)]
    pub state: PresentState,
    pub array_name: String,
    #[serde(default)]
    pub level: Option<ArrayLevel>,
    #[serde(default)]
    pub members: Option<Vec<String>>,
}

pub struct ArrayModule;

impl ArrayModule {
    async fn get_array(
        ctx: &ModuleContext<'_>,
        name: &str,
    ) -> ctera_core::Result<Option<Parameters>> {
        let path = format!("{}/{}", ARRAYS, segment(name));
        let Some(object) = ctx.session.fetch(&path).await? else {
            return Ok(None);
        };
        let mut current = public_fields(&object);
        if let Some(name) = current.pop("name") {
            current.insert("array_name", name);
        }
        Ok(Some(current))
    }
}

#[async_trait]
impl Module for ArrayModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::FilerArray
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Array management failed".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        let args: ArrayArgs = parse(params)?;
        required_if(
            args.state == PresentState::Present,
            "state",
            "present",
            &[("level", args.level.is_some())],
        )
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        mut params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: ArrayArgs = parse(&params)?;
        params.pop("state");
        let name = args.array_name.as_str();
        let path = format!("{}/{}", ARRAYS, segment(name));

        let current = Self::get_array(ctx, name).await?;
        let action = plan_action(args.state, current.is_some(), || {
            current
                .as_ref()
                .map(|current| modified_attributes(current, &params))
                .unwrap_or_default()
        });

        match action {
            Action::Create => {
                let create = self.kind().capabilities().create_params(&params).drop_nulls();
                let mut body = create.clone();
                if let Some(name) = body.pop("array_name") {
                    body.insert("name", name);
                }
                log::info!("creating array {}", name);
                ctx.session.add(ARRAYS, body.into_value()).await?;
                rv.changed()
                    .msg("Array created")
                    .put_all(create);
            }
            Action::Modify(diff) => {
                log::debug!("array {} differs in {:?}", name, diff.keys().collect::<Vec<_>>());
                rv.skipped()
                    .msg("Array modification is not supported")
                    .put("array_name", name);
            }
            Action::Unchanged => {
                rv.skipped()
                    .msg("Array already exists")
                    .put("array_name", name);
            }
            Action::Delete => {
                log::info!("deleting array {}", name);
                ctx.session.delete(&path).await?;
                rv.changed()
                    .msg("Array deleted")
                    .put("array_name", name);
            }
            Action::AlreadyAbsent => {
                rv.skipped()
                    .msg("Array already does not exist")
                    .put("array_name", name);
            }
        }
        Ok(())
    }
}
