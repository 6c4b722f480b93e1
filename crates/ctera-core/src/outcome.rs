//! Result reporting
//!
//! [`ReturnValue`] accumulates the single terminal status of an invocation,
//! its message and the facts returned to the caller. It never fails; the
//! runtime queries it once execution has finished.

use serde_json::{Map, Value};

/// Terminal status of an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// Nothing was changed and the module did not declare a skip
    #[default]
    Unchanged,
    Changed,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReturnValue {
    status: Status,
    failed: bool,
    msg: Option<String>,
    exception: Option<String>,
    facts: Map<String, Value>,
}

impl ReturnValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changed(&mut self) -> &mut Self {
        self.status = Status::Changed;
        self
    }

    pub fn skipped(&mut self) -> &mut Self {
        self.status = Status::Skipped;
        self
    }

    pub fn failed(&mut self) -> &mut Self {
        self.failed = true;
        self
    }

    /// Replace the message.
    pub fn msg(&mut self, msg: impl Into<String>) -> &mut Self {
        self.msg = Some(msg.into());
        self
    }

    /// Append to the message, space separated.
    pub fn append_msg(&mut self, msg: impl AsRef<str>) -> &mut Self {
        let msg = msg.as_ref();
        self.msg = Some(match self.msg.take() {
            Some(existing) if !existing.is_empty() => format!("{} {}", existing, msg),
            _ => msg.to_string(),
        });
        self
    }

    pub fn exception(&mut self, exception: impl Into<String>) -> &mut Self {
        self.exception = Some(exception.into());
        self
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.facts.insert(key.into(), value.into());
        self
    }

    pub fn put_all<I>(&mut self, facts: I) -> &mut Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.facts.extend(facts);
        self
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    pub fn status(&self) -> Status {
        if self.failed {
            Status::Failed
        } else {
            self.status
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.msg.as_deref()
    }

    pub fn fact(&self, key: &str) -> Option<&Value> {
        self.facts.get(key)
    }

    /// Payload handed to the runtime: `{changed, skipped, msg, ...facts}` or
    /// `{failed: true, changed: false, msg, exception?, ...facts}`.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for (key, value) in &self.facts {
            out.insert(key.clone(), value.clone());
        }
        let status = self.status();
        if status == Status::Failed {
            out.insert("failed".to_string(), Value::Bool(true));
            out.insert("changed".to_string(), Value::Bool(false));
            if let Some(exception) = &self.exception {
                out.insert("exception".to_string(), Value::String(exception.clone()));
            }
        } else {
            out.insert(
                "changed".to_string(),
                Value::Bool(status == Status::Changed),
            );
            out.insert(
                "skipped".to_string(),
                Value::Bool(status == Status::Skipped),
            );
        }
        out.insert(
            "msg".to_string(),
            Value::String(self.msg.clone().unwrap_or_default()),
        );
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_changed_payload() {
        let mut rv = ReturnValue::new();
        rv.changed().msg("Array created").put("name", "array");
        assert_eq!(rv.status(), Status::Changed);
        assert_eq!(
            rv.to_json(),
            json!({"name": "array", "changed": true, "skipped": false, "msg": "Array created"})
        );
    }

    #[test]
    fn test_failed_wins() {
        let mut rv = ReturnValue::new();
        rv.changed().msg("Tenant was undeleted");
        rv.failed().msg("Tenant Management failed");
        assert!(rv.has_failed());
        assert_eq!(rv.status(), Status::Failed);
        let payload = rv.to_json();
        assert_eq!(payload["failed"], json!(true));
        assert_eq!(payload["changed"], json!(false));
        assert!(payload.get("skipped").is_none());
    }

    #[test]
    fn test_append_msg() {
        let mut rv = ReturnValue::new();
        rv.append_msg("Tenant was undeleted").append_msg("Plan was changed");
        assert_eq!(rv.message(), Some("Tenant was undeleted Plan was changed"));
    }

    #[test]
    fn test_default_is_unchanged() {
        let rv = ReturnValue::new();
        assert_eq!(
            rv.to_json(),
            json!({"changed": false, "skipped": false, "msg": ""})
        );
    }
}
