//! HTTP transport for the workflow server's JSON-RPC endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::{json, Value};

use crate::error::{comm_err, ClientError};
use crate::protocol;

/// One remote procedure call. Implementations return the *unwrapped*
/// `result` value; envelope and transport failures are theirs to report.
///
/// This is the seam tests script against; production uses [`HttpTransport`].
pub trait Transport {
    fn call(&self, method: &str, params: Value) -> Result<Value, ClientError>;
}

/// Blocking JSON-RPC 2.0 client over HTTP POST.
pub struct HttpTransport {
    agent: ureq::Agent,
    url: String,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("shapesync/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Transport for HttpTransport {
    fn call(&self, method: &str, params: Value) -> Result<Value, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": [params],
        });

        tracing::debug!("rpc {method} (id {id}) -> {}", self.url);
        let response = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .send_json(body)
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => comm_err(format!("{method}: HTTP {code}")),
                ureq::Error::Transport(t) => comm_err(format!("{method}: {t}")),
            })?;

        let envelope: Value = response
            .into_json()
            .map_err(|e| comm_err(format!("{method}: non-JSON response: {e}")))?;
        protocol::decode_envelope(envelope, method)
    }
}
