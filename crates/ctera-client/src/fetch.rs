//! Helpers shared by the remote-state fetchers

use ctera_core::Parameters;
use serde_json::Value;

/// Percent-encode a name for use as a path segment.
pub fn segment(name: &str) -> String {
    urlencoding::encode(name).into_owned()
}

/// Copy an object's fields, dropping internal ones (leading `_`).
pub fn public_fields(object: &Value) -> Parameters {
    match object {
        Value::Object(map) => map
            .iter()
            .filter(|(k, _)| !k.starts_with('_'))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        _ => Parameters::new(),
    }
}

/// Last component of an object reference such as `objs/11/portal/PlanService/gold`.
pub fn last_segment(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}
