//! JSON-RPC log source backed by `reqwest`.
//!
//! Two calls are all the indexer needs: `eth_blockNumber` for the chain
//! head and `eth_getLogs` for one chunk of contract logs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use hypermap_core::error::FetchError;
use hypermap_core::event::RawLog;
use hypermap_core::serde_hex::parse_quantity;
use hypermap_core::source::LogSource;

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: Vec<Value>,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// The result value, or the RPC error mapped to [`FetchError`].
    pub fn into_result(self) -> Result<Value, FetchError> {
        if let Some(err) = self.error {
            return Err(FetchError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        self.result.ok_or_else(|| FetchError::InvalidResponse {
            reason: "response has neither result nor error".into(),
        })
    }
}

/// Reads Hypermap logs from an Ethereum-compatible JSON-RPC endpoint.
pub struct HttpLogSource {
    url: String,
    contract: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpLogSource {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a source for `contract` logs served by `url`.
    pub fn new(url: impl Into<String>, contract: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_timeout(url, contract, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        url: impl Into<String>,
        contract: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            contract: contract.into(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, FetchError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(id, method, params);
        tracing::trace!(id, method, url = %self.url, "JSON-RPC request");

        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Http(format!("HTTP {status}: {body}")));
        }

        resp.json::<JsonRpcResponse>()
            .await
            .map_err(|e| FetchError::InvalidResponse {
                reason: e.to_string(),
            })?
            .into_result()
    }
}

#[async_trait]
impl LogSource for HttpLogSource {
    async fn latest_block(&self) -> Result<u64, FetchError> {
        let value = self.call("eth_blockNumber", vec![]).await?;
        value
            .as_str()
            .and_then(parse_quantity)
            .ok_or_else(|| FetchError::InvalidResponse {
                reason: format!("eth_blockNumber returned {value}"),
            })
    }

    async fn fetch_range(&self, from: u64, to: u64) -> Result<Vec<RawLog>, FetchError> {
        let filter = json!({
            "address": self.contract,
            "fromBlock": format!("{from:#x}"),
            "toBlock": format!("{to:#x}"),
        });
        let value = self.call("eth_getLogs", vec![filter]).await?;
        serde_json::from_value(value).map_err(|e| FetchError::InvalidResponse {
            reason: format!("eth_getLogs: {e}"),
        })
    }
}
