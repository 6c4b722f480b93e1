//! Building blocks shared by the resource handlers

use ctera_client::Session;
use ctera_core::{Parameters, Result};
use ctera_shared_types::PresentState;
use serde_json::{Map, Value};

/// What an ensure-present / ensure-absent invocation has to do
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Create,
    /// Existing object differs in these attributes
    Modify(Parameters),
    /// Existing object already matches
    Unchanged,
    Delete,
    /// Nothing to delete
    AlreadyAbsent,
}

/// Transition table of the ensure state machine.
///
/// `diff` is only consulted when the object exists and should be present.
pub fn plan_action(state: PresentState, exists: bool, diff: impl FnOnce() -> Parameters) -> Action {
    match (state, exists) {
        (PresentState::Present, false) => Action::Create,
        (PresentState::Present, true) => {
            let diff = diff();
            if diff.is_empty() {
                Action::Unchanged
            } else {
                Action::Modify(diff)
            }
        }
        (PresentState::Absent, true) => Action::Delete,
        (PresentState::Absent, false) => Action::AlreadyAbsent,
    }
}

/// Rename parameter keys to vendor field names; unmapped keys pass through.
pub fn to_vendor(params: &Parameters, mapping: &[(&str, &str)]) -> Map<String, Value> {
    params
        .iter()
        .map(|(key, value)| {
            let vendor = mapping
                .iter()
                .find(|(param, _)| param == key)
                .map_or(key.as_str(), |(_, vendor)| vendor);
            (vendor.to_string(), value.clone())
        })
        .collect()
}

/// Read back selected vendor fields under their parameter names.
pub fn from_vendor(object: &Value, mapping: &[(&str, &str)]) -> Parameters {
    mapping
        .iter()
        .map(|(param, vendor)| {
            let value = object.get(*vendor).cloned().unwrap_or(Value::Null);
            (param.to_string(), value)
        })
        .collect()
}

/// Apply changes to a fetched object and store it back whole.
pub async fn merge_put(
    session: &Session,
    path: &str,
    current: Value,
    changes: Map<String, Value>,
) -> Result<Value> {
    let mut object = match current {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    object.extend(changes);
    Ok(session.put(path, Value::Object(object)).await?)
}

/// `domain\name` for directory accounts, the bare name for local ones.
pub fn account_name(name: &str, directory: Option<&str>) -> String {
    match directory {
        Some(domain) if !domain.is_empty() => format!("{}\\{}", domain, name),
        _ => name.to_string(),
    }
}

/// Value as a list, treating anything else as empty.
pub fn as_list(value: Option<&Value>) -> Vec<Value> {
    value
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Parameters {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_plan_action_table() {
        let empty = Parameters::new;
        assert_eq!(plan_action(PresentState::Present, false, empty), Action::Create);
        assert_eq!(plan_action(PresentState::Present, true, empty), Action::Unchanged);
        assert_eq!(plan_action(PresentState::Absent, true, empty), Action::Delete);
        assert_eq!(
            plan_action(PresentState::Absent, false, empty),
            Action::AlreadyAbsent
        );

        let diff = params(json!({"level": "1"}));
        let expected = diff.clone();
        assert_eq!(
            plan_action(PresentState::Present, true, move || diff),
            Action::Modify(expected)
        );
    }

    #[test]
    fn test_vendor_renames() {
        let mapping = [("community_str", "readCommunity")];
        let vendor = to_vendor(&params(json!({"community_str": "pub", "port": 161})), &mapping);
        assert_eq!(vendor["readCommunity"], json!("pub"));
        assert_eq!(vendor["port"], json!(161));

        let back = from_vendor(&json!({"readCommunity": "pub"}), &mapping);
        assert_eq!(back.get("community_str"), Some(&json!("pub")));
    }

    #[test]
    fn test_account_name() {
        assert_eq!(account_name("alice", None), "alice");
        assert_eq!(account_name("alice", Some("demo.local")), "demo.local\\alice");
    }
}
