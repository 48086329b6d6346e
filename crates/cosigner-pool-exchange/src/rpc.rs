//! JSON-RPC exchange client.
//!
//! Talks JSON-RPC 2.0 over HTTP POST to a pool server exposing `get`, `put`
//! and `delete`. Identifiers and envelopes travel as lowercase hex strings.
//!
//! ```text
//! -> {"jsonrpc":"2.0","id":7,"method":"put","params":["<id hex>","<envelope hex>"]}
//! <- {"jsonrpc":"2.0","id":7,"result":null}
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cosigner_pool_core::{Envelope, Identifier};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::ExchangeClient;
use crate::error::{ExchangeError, Result};

/// Configuration for [`RpcExchange`].
///
/// There is no default endpoint: the server must speak the JSON-RPC
/// protocol above.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Pool server URL.
    pub endpoint: String,
    /// Per-request timeout. `None` leaves pacing entirely to the caller.
    pub request_timeout: Option<Duration>,
}

impl RpcConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// Exchange backed by a remote JSON-RPC pool server.
pub struct RpcExchange {
    endpoint: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl RpcExchange {
    pub fn new(config: RpcConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().use_rustls_tls();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ExchangeError::Unreachable(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = encode_request(id, method, params);

        let resp = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ExchangeError::Unreachable(e.to_string()))?;

        let status = resp.status();
        tracing::trace!(method, id, status = %status, "pool rpc call");
        if !status.is_success() {
            return Err(status_error(status));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ExchangeError::Unreachable(e.to_string()))?;
        decode_response(&bytes)
    }
}

#[async_trait]
impl ExchangeClient for RpcExchange {
    async fn get(&self, id: &Identifier) -> Result<Option<Envelope>> {
        let result = self.call("get", vec![json!(id.to_hex())]).await?;
        parse_envelope(result)
    }

    async fn put(&self, id: &Identifier, envelope: &Envelope) -> Result<()> {
        self.call(
            "put",
            vec![json!(id.to_hex()), json!(hex::encode(envelope.as_bytes()))],
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, id: &Identifier) -> Result<()> {
        self.call("delete", vec![json!(id.to_hex())]).await?;
        Ok(())
    }
}

fn encode_request(id: u64, method: &str, params: Vec<Value>) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
    .to_string()
}

/// Gateway failures mean the pool itself is down; anything else is a rejection.
fn status_error(status: StatusCode) -> ExchangeError {
    match status {
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            ExchangeError::Unreachable(format!("status={}", status))
        }
        other => ExchangeError::Remote(format!("status={}", other)),
    }
}

fn decode_response(bytes: &[u8]) -> Result<Value> {
    let response: RpcResponse = serde_json::from_slice(bytes)
        .map_err(|e| ExchangeError::Remote(format!("malformed response: {}", e)))?;

    if let Some(err) = response.error {
        return Err(ExchangeError::Remote(format!(
            "rpc error {}: {}",
            err.code, err.message
        )));
    }
    Ok(response.result.unwrap_or(Value::Null))
}

fn parse_envelope(result: Value) -> Result<Option<Envelope>> {
    match result {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => hex::decode(&s)
            .map(|bytes| Some(Envelope::from_bytes(bytes)))
            .map_err(|e| ExchangeError::Remote(format!("envelope is not hex: {}", e))),
        other => Err(ExchangeError::Remote(format!(
            "unexpected get result: {}",
            other
        ))),
    }
}
