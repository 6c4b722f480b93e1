//! In-memory transport
//!
//! Holds remote objects keyed by path and records every call, so module
//! behaviour can be checked without a host ("no remote call was issued").

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use ctera_core::ClientError;
use serde_json::Value;

use crate::fetch::segment;
use crate::transport::Transport;
use crate::ClientResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Login,
    Logout,
    Get,
    Put,
    Add,
    Delete,
    Execute,
}

impl Method {
    /// Whether the call can change remote state
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Method::Put | Method::Add | Method::Delete | Method::Execute
        )
    }
}

/// A recorded transport call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    /// Method name for [`Method::Execute`]
    pub name: Option<String>,
    pub body: Option<Value>,
}

/// Locks `mutex`, recovering the data if a test thread panicked while holding it.
fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type ExecuteHandler =
    Box<dyn Fn(&mut BTreeMap<String, Value>, &Value) -> ClientResult<Value> + Send + Sync>;

#[derive(Default)]
pub struct MemoryTransport {
    objects: Mutex<BTreeMap<String, Value>>,
    handlers: Mutex<HashMap<(String, String), ExecuteHandler>>,
    failures: Mutex<Vec<(Method, String, u16)>>,
    credentials: Option<(String, String)>,
    calls: Mutex<Vec<Call>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept this username and password on login.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some((username.to_string(), password.to_string()));
        self
    }

    pub fn with_object(self, path: &str, value: Value) -> Self {
        self.insert(path, value);
        self
    }

    /// Handle `execute(path, name, param)` by mutating the object tree.
    pub fn on_execute<F>(self, path: &str, name: &str, handler: F) -> Self
    where
        F: Fn(&mut BTreeMap<String, Value>, &Value) -> ClientResult<Value> + Send + Sync + 'static,
    {
        guard(&self.handlers).insert((path.to_string(), name.to_string()), Box::new(handler));
        self
    }

    /// Answer `method` on `path` with the given HTTP status.
    pub fn fail(self, method: Method, path: &str, status: u16) -> Self {
        guard(&self.failures).push((method, path.to_string(), status));
        self
    }

    pub fn insert(&self, path: &str, value: Value) {
        guard(&self.objects).insert(path.to_string(), value);
    }

    pub fn object(&self, path: &str) -> Option<Value> {
        guard(&self.objects).get(path).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        guard(&self.calls).clone()
    }

    /// Recorded calls that could change remote state
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.method.is_mutation())
            .collect()
    }

    pub fn clear_calls(&self) {
        guard(&self.calls).clear();
    }

    fn record(
        &self,
        method: Method,
        path: &str,
        name: Option<&str>,
        body: Option<&Value>,
    ) -> ClientResult<()> {
        guard(&self.calls).push(Call {
            method,
            path: path.to_string(),
            name: name.map(str::to_string),
            body: body.cloned(),
        });
        let failures = guard(&self.failures);
        match failures.iter().find(|(m, p, _)| *m == method && p == path) {
            Some((_, _, status)) => Err(ClientError::from_status(
                *status,
                path,
                format!("injected failure on {}", path),
            )),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn login(&self, username: &str, password: &str) -> ClientResult<()> {
        self.record(Method::Login, "/login", None, None)?;
        match &self.credentials {
            Some((user, pass)) if user != username || pass != password => {
                Err(ClientError::Authentication {
                    message: "invalid credentials".to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    async fn logout(&self) -> ClientResult<()> {
        self.record(Method::Logout, "/logout", None, None)
    }

    async fn get(&self, path: &str) -> ClientResult<Value> {
        self.record(Method::Get, path, None, None)?;
        self.object(path).ok_or_else(|| ClientError::NotFound {
            path: path.to_string(),
        })
    }

    async fn put(&self, path: &str, value: Value) -> ClientResult<Value> {
        self.record(Method::Put, path, None, Some(&value))?;
        self.insert(path, value.clone());
        Ok(value)
    }

    async fn add(&self, path: &str, value: Value) -> ClientResult<Value> {
        self.record(Method::Add, path, None, Some(&value))?;
        let target = match value.get("name").and_then(Value::as_str) {
            Some(name) => format!("{}/{}", path, segment(name)),
            None => path.to_string(),
        };
        self.insert(&target, value.clone());
        Ok(value)
    }

    async fn delete(&self, path: &str) -> ClientResult<Value> {
        self.record(Method::Delete, path, None, None)?;
        let mut objects = guard(&self.objects);
        let removed = objects.remove(path).ok_or_else(|| ClientError::NotFound {
            path: path.to_string(),
        })?;
        let prefix = format!("{}/", path);
        objects.retain(|key, _| !key.starts_with(&prefix));
        Ok(removed)
    }

    async fn execute(&self, path: &str, name: &str, param: Value) -> ClientResult<Value> {
        self.record(Method::Execute, path, Some(name), Some(&param))?;
        let handlers = guard(&self.handlers);
        match handlers.get(&(path.to_string(), name.to_string())) {
            Some(handler) => {
                let mut objects = guard(&self.objects);
                handler(&mut objects, &param)
            }
            None => Ok(Value::Null),
        }
    }
}
