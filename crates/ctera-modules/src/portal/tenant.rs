//! Tenants (team portals)

use async_trait::async_trait;
use ctera_client::{public_fields, segment, Session};
use ctera_core::{modified_attributes, ArgumentError, Parameters, ResourceKind, ReturnValue};
use ctera_shared_types::PresentState;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::args::parse;
use crate::common::{from_vendor, to_vendor};
use crate::runner::{Module, ModuleContext};

const PORTALS: &str = "/portals";
const DISABLED: &str = "Disabled";

const FIELDS: [(&str, &str); 5] = [
    ("name", "name"),
    ("display_name", "displayName"),
    ("billing_id", "externalPortalId"),
    ("company", "companyName"),
    ("comment", "comment"),
];

#[derive(Debug, Serialize, Deserialize)]
pub struct TenantArgs {
    #[serde(default)]
    pub state: PresentState,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub billing_id: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

struct Tenant {
    params: Parameters,
    disabled: bool,
}

pub struct TenantModule;

fn plan_reference(plan: &str) -> String {
    format!("/plans/{}", segment(plan))
}

/// Name of the plan a reference points to
async fn plan_name(session: &Session, reference: Option<&str>) -> ctera_core::Result<Value> {
    let Some(reference) = reference.filter(|r| !r.is_empty()) else {
        return Ok(Value::Null);
    };
    let path = if reference.starts_with('/') {
        reference.to_string()
    } else {
        format!("/{}", reference)
    };
    Ok(session
        .fetch(&path)
        .await?
        .and_then(|plan| plan.get("name").cloned())
        .unwrap_or(Value::Null))
}

async fn get_tenant(session: &Session, path: &str) -> ctera_core::Result<Option<Tenant>> {
    let Some(object) = session.fetch(path).await? else {
        return Ok(None);
    };
    let fields = public_fields(&object).into_value();
    let mut params = from_vendor(&fields, &FIELDS);
    let plan = plan_name(session, fields.get("plan").and_then(Value::as_str)).await?;
    params.insert("plan", plan);
    let disabled = fields.get("activationStatus").and_then(Value::as_str) == Some(DISABLED);
    Ok(Some(Tenant { params, disabled }))
}

#[async_trait]
impl Module for TenantModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PortalTenant
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Tenant Management failed".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        parse::<TenantArgs>(params).map(|_| ())
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: TenantArgs = parse(&params)?;
        let mut desired = Parameters::from_serializable(&args)?;
        desired.pop("state");
        let name = args.name.as_str();
        let path = format!("{}/{}", PORTALS, segment(name));
        let tenant = get_tenant(ctx.session, &path).await?;

        match (args.state, tenant) {
            (PresentState::Present, None) => {
                let create = self.kind().capabilities().create_params(&desired).drop_nulls();
                let mut body = to_vendor(&create.without(&["plan"]), &FIELDS);
                if let Some(plan) = &args.plan {
                    body.insert("plan".to_string(), Value::from(plan_reference(plan)));
                }
                log::info!("creating tenant {}", name);
                ctx.session.add(PORTALS, Value::Object(body)).await?;
                rv.changed().msg("Tenant was created").put_all(create);
            }
            (PresentState::Present, Some(tenant)) => {
                let mut messages = Vec::new();
                let mut changed = false;
                if tenant.disabled {
                    log::info!("undeleting tenant {}", name);
                    ctx.session.execute(&path, "undelete", Value::Null).await?;
                    changed = true;
                    messages.push("Tenant was undeleted");
                }
                let diff = modified_attributes(&tenant.params, &desired);
                if diff.is_empty() {
                    messages.push("Tenant details did not change");
                } else {
                    let (allowed, rejected) =
                        self.kind().capabilities().split_modifications(&diff);
                    if let Some(plan) = allowed.get_str("plan") {
                        log::info!("subscribing tenant {} to plan {}", name, plan);
                        ctx.session
                            .execute(&path, "subscribe", json!({"plan": plan_reference(plan)}))
                            .await?;
                        changed = true;
                        messages.push("Plan was changed");
                        rv.put("plan", plan);
                    }
                    if !rejected.is_empty() {
                        messages.push("Modifying tenant details is not supported");
                    }
                }
                if changed {
                    rv.changed();
                } else {
                    rv.skipped();
                }
                rv.put("name", name).msg(messages.join(" "));
            }
            (PresentState::Absent, Some(tenant)) if !tenant.disabled => {
                log::info!("deleting tenant {}", name);
                ctx.session.delete(&path).await?;
                rv.changed().msg("Tenant deleted").put("name", name);
            }
            (PresentState::Absent, _) => {
                rv.skipped()
                    .msg("Tenant already does not exist")
                    .put("name", name);
            }
        }
        Ok(())
    }
}
