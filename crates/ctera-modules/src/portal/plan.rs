//! Subscription plans

use async_trait::async_trait;
use ctera_client::segment;
use ctera_core::{modified_attributes, ArgumentError, Parameters, ResourceKind, ReturnValue};
use ctera_shared_types::PresentState;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::args::parse;
use crate::common::{merge_put, plan_action, Action};
use crate::runner::{Module, ModuleContext};

const PLANS: &str = "/plans";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RetentionPolicy {
    RetainAll,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    RetainDeleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuotaItem {
    EV4,
    EV8,
    EV16,
    EV32,
    EV64,
    EV128,
    WA,
    SA,
    Share,
    Connect,
    Storage,
}

impl QuotaItem {
    const ALL: [QuotaItem; 11] = [
        QuotaItem::EV4,
        QuotaItem::EV8,
        QuotaItem::EV16,
        QuotaItem::EV32,
        QuotaItem::EV64,
        QuotaItem::EV128,
        QuotaItem::WA,
        QuotaItem::SA,
        QuotaItem::Share,
        QuotaItem::Connect,
        QuotaItem::Storage,
    ];

    /// Plan field holding the item's quota
    pub fn vendor_field(&self) -> &'static str {
        match self {
            QuotaItem::EV4 => "vGateways4",
            QuotaItem::EV8 => "vGateways8",
            QuotaItem::EV16 => "appliances",
            QuotaItem::EV32 => "vGateways32",
            QuotaItem::EV64 => "vGateways64",
            QuotaItem::EV128 => "vGateways128",
            QuotaItem::WA => "workstationAgents",
            QuotaItem::SA => "serverAgents",
            QuotaItem::Share => "cloudDrives",
            QuotaItem::Connect => "cloudDrivesLite",
            QuotaItem::Storage => "storage",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retention {
    pub policy_name: RetentionPolicy,
    pub duration: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quota {
    pub item_name: QuotaItem,
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanArgs {
    #[serde(default)]
    pub state: PresentState,
    pub name: String,
    #[serde(default)]
    pub retention: Option<Vec<Retention>>,
    #[serde(default)]
    pub quotas: Option<Vec<Quota>>,
}

pub struct PlanModule;

fn name_of<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Reshape a plan into `retention` / `quotas` lists.
///
/// Only policies and items the caller mentions are read back, so a partial
/// list converges instead of differing from the plan's full set forever.
fn to_plan_params(object: &Value, args: &PlanArgs) -> Parameters {
    let mut plan = Parameters::new();
    plan.insert("name", object.get("name").cloned().unwrap_or(Value::Null));

    let policies = object.get("retentionPolicy").and_then(Value::as_object);
    let retention: Vec<Value> = match &args.retention {
        Some(wanted) => wanted
            .iter()
            .map(|entry| {
                let name = name_of(&entry.policy_name);
                let duration = policies.and_then(|p| p.get(&name)).cloned();
                json!({"policy_name": name, "duration": duration})
            })
            .collect(),
        None => policies
            .into_iter()
            .flatten()
            .filter(|(key, _)| !key.starts_with('_'))
            .map(|(key, duration)| json!({"policy_name": key, "duration": duration}))
            .collect(),
    };
    plan.insert("retention", retention);

    let items: Vec<QuotaItem> = match &args.quotas {
        Some(wanted) => wanted.iter().map(|quota| quota.item_name).collect(),
        None => QuotaItem::ALL.to_vec(),
    };
    let quotas: Vec<Value> = items
        .iter()
        .map(|item| {
            let amount = object
                .get(item.vendor_field())
                .and_then(|quota| quota.get("amount"))
                .cloned();
            json!({"item_name": item, "amount": amount})
        })
        .collect();
    plan.insert("quotas", quotas);
    plan
}

/// Vendor fields for the retention and quota lists present in `params`.
fn to_vendor_fields(current: &Value, args: &PlanArgs, params: &Parameters) -> Map<String, Value> {
    let mut fields = Map::new();
    if params.get_present("retention").is_some() {
        let mut policies = current
            .get("retentionPolicy")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        for entry in args.retention.iter().flatten() {
            policies.insert(name_of(&entry.policy_name), Value::from(entry.duration));
        }
        fields.insert("retentionPolicy".to_string(), Value::Object(policies));
    }
    if params.get_present("quotas").is_some() {
        for quota in args.quotas.iter().flatten() {
            let field = quota.item_name.vendor_field();
            let mut item = current
                .get(field)
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            item.insert("amount".to_string(), Value::from(quota.amount));
            fields.insert(field.to_string(), Value::Object(item));
        }
    }
    fields
}

#[async_trait]
impl Module for PlanModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PortalPlan
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Plan management failed".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        parse::<PlanArgs>(params).map(|_| ())
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: PlanArgs = parse(&params)?;
        let mut desired = Parameters::from_serializable(&args)?;
        desired.pop("state");
        let name = args.name.as_str();
        let path = format!("{}/{}", PLANS, segment(name));

        let object = ctx.session.fetch(&path).await?;
        let current = object.as_ref().map(|object| to_plan_params(object, &args));
        let action = plan_action(args.state, current.is_some(), || {
            current
                .as_ref()
                .map(|current| modified_attributes(current, &desired))
                .unwrap_or_default()
        });

        match action {
            Action::Create => {
                let create = self.kind().capabilities().create_params(&desired);
                let mut body = to_vendor_fields(&Value::Null, &args, &create);
                body.insert("name".to_string(), Value::from(name));
                log::info!("creating plan {}", name);
                ctx.session.add(PLANS, Value::Object(body)).await?;
                rv.changed().msg("Plan created").put("name", name);
            }
            Action::Modify(diff) => {
                let (allowed, _) = self.kind().capabilities().split_modifications(&diff);
                log::info!(
                    "modifying plan {}: {:?}",
                    name,
                    allowed.keys().collect::<Vec<_>>()
                );
                let object = object.unwrap_or(Value::Null);
                let changes = to_vendor_fields(&object, &args, &allowed);
                merge_put(ctx.session, &path, object, changes).await?;
                rv.changed().msg("Plan modified").put("name", name);
            }
            Action::Unchanged => {
                rv.skipped()
                    .msg("Plan details did not change")
                    .put("name", name);
            }
            Action::Delete => {
                log::info!("deleting plan {}", name);
                ctx.session.delete(&path).await?;
                rv.changed().msg("Plan deleted").put("name", name);
            }
            Action::AlreadyAbsent => {
                rv.skipped()
                    .msg("Plan already does not exist")
                    .put("name", name);
            }
        }
        Ok(())
    }
}
