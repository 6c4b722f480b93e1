//! Access control rules for directory accounts
//!
//! Rules are indexed by `"<domain>\<name>#<role>"` and compared as a set of
//! those keys rather than through the attribute differ. Repeated rules count
//! once.

use async_trait::async_trait;
use ctera_core::{lists_differ, ArgumentError, Parameters, ResourceKind, ReturnValue};
use ctera_shared_types::PresentState;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::directory_services::DIRECTORY_SERVICE;
use crate::args::{parse, required_if};
use crate::common::{account_name, as_list};
use crate::runner::{Module, ModuleContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    User,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    ReadWriteAdmin,
    ReadOnlyAdmin,
    Support,
    EndUser,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessControlEntry {
    pub principal_type: AccountType,
    pub domain: String,
    pub name: String,
    pub role: Role,
}

impl AccessControlEntry {
    fn key(&self) -> String {
        let role = serde_json::to_value(self.role)
            .ok()
            .and_then(|role| role.as_str().map(str::to_string))
            .unwrap_or_default();
        format!("{}#{}", account_name(&self.name, Some(&self.domain)), role)
    }

    fn to_vendor(&self) -> Value {
        json!({
            "account": {"type": self.principal_type, "domain": self.domain, "name": self.name},
            "role": self.role,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AccessControlArgs {
    #[serde(default)]
    pub state: PresentState,
    #[serde(default)]
    pub acl: Option<Vec<AccessControlEntry>>,
}

fn rules_path() -> String {
    format!("{}/accessControlRules", DIRECTORY_SERVICE)
}

/// Keeps the first entry for each key.
fn unique_by_key<T>(items: Vec<T>, key: impl Fn(&T) -> Value) -> (Vec<T>, Vec<Value>) {
    let mut keys = Vec::new();
    let mut unique = Vec::new();
    for item in items {
        let item_key = key(&item);
        if !keys.contains(&item_key) {
            keys.push(item_key);
            unique.push(item);
        }
    }
    (unique, keys)
}

/// Index key of a rule as stored on the portal
fn vendor_key(rule: &Value) -> Value {
    let account = &rule["account"];
    let name = account["name"].as_str().unwrap_or_default();
    let domain = account["domain"].as_str();
    let role = rule["role"].as_str().unwrap_or_default();
    Value::from(format!("{}#{}", account_name(name, domain), role))
}

pub struct AccessControlModule;

#[async_trait]
impl Module for AccessControlModule {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PortalDirectoryServicesAccessControl
    }

    fn failure_message(&self, _params: &Parameters) -> String {
        "Active Directory access control management failed".to_string()
    }

    fn validate(&self, params: &Parameters) -> Result<(), ArgumentError> {
        let args: AccessControlArgs = parse(params)?;
        required_if(
            args.state == PresentState::Present,
            "state",
            "present",
            &[("acl", args.acl.is_some())],
        )
    }

    async fn execute(
        &self,
        ctx: &ModuleContext<'_>,
        params: Parameters,
        rv: &mut ReturnValue,
    ) -> ctera_core::Result<()> {
        let args: AccessControlArgs = parse(&params)?;
        let path = rules_path();
        let current = as_list(ctx.session.fetch(&path).await?.as_ref());
        let (current, current_keys) = unique_by_key(current, vendor_key);

        match args.state {
            PresentState::Present => {
                let (acl, wanted_keys) = unique_by_key(args.acl.unwrap_or_default(), |entry| {
                    Value::from(entry.key())
                });
                if !lists_differ(&current_keys, &wanted_keys) {
                    rv.skipped().msg("Access control details did not change");
                    return Ok(());
                }
                log::info!("setting {} access control rule(s)", acl.len());
                let rules: Vec<Value> = acl.iter().map(AccessControlEntry::to_vendor).collect();
                ctx.session.put(&path, Value::Array(rules)).await?;
                rv.changed().msg("Configured access control rules");
            }
            PresentState::Absent => {
                if current.is_empty() {
                    rv.skipped().msg("No access control rules exist");
                    return Ok(());
                }
                log::info!("removing access control rules");
                ctx.session.put(&path, Value::Array(Vec::new())).await?;
                rv.changed().msg("Removed access control entries");
            }
        }
        Ok(())
    }
}
