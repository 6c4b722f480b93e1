//! HTTP transport

use std::time::Duration;

use async_trait::async_trait;
use ctera_core::ClientError;
use ctera_shared_types::{ConnectionArgs, HostKind};
use reqwest::{Client, Method, Response};
use serde_json::{json, Value};

use crate::transport::Transport;
use crate::ClientResult;

/// Transport speaking the CTERA object API over HTTP(S).
///
/// The session cookie issued on login is kept in the client's cookie store.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_root: &'static str,
}

fn transport_error(err: reqwest::Error) -> ClientError {
    ClientError::Transport(err.to_string())
}

impl HttpTransport {
    pub fn new(
        args: &ConnectionArgs,
        kind: HostKind,
        timeout: Option<Duration>,
    ) -> ClientResult<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(args.ctera_trust_certificate);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(transport_error)?;

        let base_url = args.base_url();
        reqwest::Url::parse(&base_url).map_err(|_| ClientError::InvalidUrl(base_url.clone()))?;

        Ok(Self {
            client,
            base_url,
            api_root: kind.api_root(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_root, path)
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> ClientResult<Value> {
        log::debug!("{} {}", method, path);
        let mut request = self
            .client
            .request(method, self.url(path))
            .header("Accept", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(transport_error)?;
        Self::parse(path, response).await
    }

    async fn parse(path: &str, response: Response) -> ClientResult<Value> {
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            let message = if text.is_empty() {
                status.canonical_reason().unwrap_or("Unknown error").to_string()
            } else {
                text
            };
            return Err(ClientError::from_status(status.as_u16(), path, message));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn login(&self, username: &str, password: &str) -> ClientResult<()> {
        let response = self
            .client
            .post(self.url("/login"))
            .form(&[("j_username", username), ("j_password", password)])
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Authentication {
                message: format!("login as '{}' returned HTTP {}", username, status.as_u16()),
            });
        }
        Ok(())
    }

    async fn logout(&self) -> ClientResult<()> {
        self.send(Method::POST, "/logout", None).await.map(|_| ())
    }

    async fn get(&self, path: &str) -> ClientResult<Value> {
        self.send(Method::GET, path, None).await
    }

    async fn put(&self, path: &str, value: Value) -> ClientResult<Value> {
        self.send(Method::PUT, path, Some(&value)).await
    }

    async fn add(&self, path: &str, value: Value) -> ClientResult<Value> {
        self.send(Method::POST, path, Some(&value)).await
    }

    async fn delete(&self, path: &str) -> ClientResult<Value> {
        self.send(Method::DELETE, path, None).await
    }

    async fn execute(&self, path: &str, name: &str, param: Value) -> ClientResult<Value> {
        let body = json!({ "name": name, "param": param });
        self.send(Method::POST, path, Some(&body)).await
    }
}
