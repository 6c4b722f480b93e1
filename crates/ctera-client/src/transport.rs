//! Transport abstraction

use async_trait::async_trait;
use serde_json::Value;

use crate::ClientResult;

/// Object-level operations against a CTERA host.
///
/// Paths are relative to the host kind's API root. A missing object is
/// reported as [`ctera_core::ClientError::NotFound`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> ClientResult<()>;
    async fn logout(&self) -> ClientResult<()>;
    async fn get(&self, path: &str) -> ClientResult<Value>;
    async fn put(&self, path: &str, value: Value) -> ClientResult<Value>;
    async fn add(&self, path: &str, value: Value) -> ClientResult<Value>;
    async fn delete(&self, path: &str) -> ClientResult<Value>;
    /// Invoke a named method on the object at `path`.
    async fn execute(&self, path: &str, name: &str, param: Value) -> ClientResult<Value>;
}
