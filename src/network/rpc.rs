//! JSON-RPC client - the daemon queries the poller depends on

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::constants::UNLOCK_PROBE_DATA;
use crate::error::RpcError;
use crate::models::Block;
use crate::units::{parse_quantity, parse_u64};

/// Queries the poller issues against the daemon
#[async_trait]
pub trait EthRpc: Send + Sync {
    /// Endpoint currently targeted
    fn endpoint(&self) -> &str;

    /// Point subsequent calls at another endpoint
    fn use_endpoint(&mut self, url: &str);

    /// Liveness. Any failure counts as not listening.
    async fn listening(&self) -> bool;

    async fn network_id(&self) -> Result<String, RpcError>;

    async fn client_version(&self) -> Result<String, RpcError>;

    async fn coinbase(&self) -> Result<String, RpcError>;

    /// Whether the node will sign for `address`
    async fn unlocked(&self, address: &str) -> Result<bool, RpcError>;

    /// Gas price in wei
    async fn gas_price(&self) -> Result<u128, RpcError>;

    async fn block_number(&self) -> Result<u64, RpcError>;

    async fn get_block(&self, number: u64, full_tx: bool) -> Result<Block, RpcError>;

    async fn peer_count(&self) -> Result<u64, RpcError>;

    async fn mining(&self) -> Result<bool, RpcError>;

    async fn hashrate(&self) -> Result<u64, RpcError>;
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

/// Response envelope: exactly one of `result` or `error` is meaningful
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

impl Envelope {
    fn into_result<T: DeserializeOwned>(self) -> Result<T, RpcError> {
        if let Some(err) = self.error {
            return Err(RpcError::Node {
                code: err.code,
                message: err.message,
            });
        }
        let result = self.result.unwrap_or(Value::Null);
        serde_json::from_value(result).map_err(|e| RpcError::Malformed(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    number: String,
    timestamp: String,
}

impl RawBlock {
    fn decode(self) -> Result<Block, RpcError> {
        let timestamp = parse_u64(&self.timestamp)?;
        Ok(Block {
            number: parse_u64(&self.number)?,
            timestamp: i64::try_from(timestamp)
                .map_err(|_| RpcError::Malformed(format!("timestamp out of range: {}", self.timestamp)))?,
        })
    }
}

fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, RpcError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| RpcError::Malformed(e.to_string()))?;
    envelope.into_result()
}

/// JSON-RPC over HTTP
pub struct HttpRpc {
    client: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl HttpRpc {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self::with_client(create_client(timeout), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        HttpRpc {
            client,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::trace!(id, method, endpoint = %self.endpoint, "JSON-RPC call");
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(RpcError::from_reqwest)?;
        let body = resp.text().await.map_err(RpcError::from_reqwest)?;
        decode_envelope(&body)
    }

    async fn quantity(&self, method: &str) -> Result<u128, RpcError> {
        let raw: String = self.call(method, json!([])).await?;
        parse_quantity(&raw)
    }

    async fn quantity_u64(&self, method: &str) -> Result<u64, RpcError> {
        let raw: String = self.call(method, json!([])).await?;
        parse_u64(&raw)
    }
}

#[async_trait]
impl EthRpc for HttpRpc {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn use_endpoint(&mut self, url: &str) {
        self.endpoint = url.to_string();
    }

    async fn listening(&self) -> bool {
        match self.call::<bool>("net_listening", json!([])).await {
            Ok(listening) => listening,
            Err(e) => {
                tracing::debug!(error = %e, endpoint = %self.endpoint, "net_listening failed");
                false
            }
        }
    }

    async fn network_id(&self) -> Result<String, RpcError> {
        self.call("net_version", json!([])).await
    }

    async fn client_version(&self) -> Result<String, RpcError> {
        self.call("web3_clientVersion", json!([])).await
    }

    async fn coinbase(&self) -> Result<String, RpcError> {
        self.call("eth_coinbase", json!([])).await
    }

    async fn unlocked(&self, address: &str) -> Result<bool, RpcError> {
        // A locked account makes the node refuse to sign.
        match self
            .call::<Value>("eth_sign", json!([address, UNLOCK_PROBE_DATA]))
            .await
        {
            Ok(_) => Ok(true),
            Err(RpcError::Node { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn gas_price(&self) -> Result<u128, RpcError> {
        self.quantity("eth_gasPrice").await
    }

    async fn block_number(&self) -> Result<u64, RpcError> {
        self.quantity_u64("eth_blockNumber").await
    }

    async fn get_block(&self, number: u64, full_tx: bool) -> Result<Block, RpcError> {
        let raw: Option<RawBlock> = self
            .call(
                "eth_getBlockByNumber",
                json!([format!("0x{:x}", number), full_tx]),
            )
            .await?;
        raw.ok_or_else(|| RpcError::Malformed(format!("block {} not found", number)))?
            .decode()
    }

    async fn peer_count(&self) -> Result<u64, RpcError> {
        self.quantity_u64("net_peerCount").await
    }

    async fn mining(&self) -> Result<bool, RpcError> {
        self.call("eth_mining", json!([])).await
    }

    async fn hashrate(&self) -> Result<u64, RpcError> {
        self.quantity_u64("eth_hashrate").await
    }
}

/// Create an HTTP client with the given request timeout
pub fn create_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::mpsc;

    const ADDRESS: &str = "0x05ae1d0ca6206c6168b42efcd1fbe0ed144e821b";

    /// Read one HTTP request and return its body
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).into_owned();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let length = text[..head_end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + length {
                    return text[head_end + 4..].to_string();
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Answer a single HTTP request with `body`, forwarding the request body
    async fn serve_once(body: &'static str) -> (String, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (seen_tx, seen_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let _ = seen_tx.send(request);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        (format!("http://{}", addr), seen_rx)
    }

    /// Endpoint on a port nothing listens on
    async fn closed_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    fn client(endpoint: &str) -> HttpRpc {
        let http = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        HttpRpc::with_client(http, endpoint)
    }

    #[test]
    fn test_decode_result() {
        let listening: bool = decode_envelope(r#"{"jsonrpc":"2.0","id":1,"result":true}"#).unwrap();
        assert!(listening);

        let version: String =
            decode_envelope(r#"{"jsonrpc":"2.0","id":2,"result":"Geth/v1.3.5"}"#).unwrap();
        assert_eq!(version, "Geth/v1.3.5");
    }

    #[test]
    fn test_decode_node_error() {
        let err = decode_envelope::<String>(
            r#"{"jsonrpc":"2.0","id":3,"error":{"code":-32000,"message":"account is locked"}}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RpcError::Node {
                code: -32000,
                message: "account is locked".into()
            }
        );
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            decode_envelope::<bool>("<html>bad gateway</html>"),
            Err(RpcError::Malformed(_))
        ));
        assert!(matches!(
            decode_envelope::<bool>(r#"{"jsonrpc":"2.0","id":4,"result":"0x1"}"#),
            Err(RpcError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_block() {
        let raw: Option<RawBlock> = decode_envelope(
            r#"{"jsonrpc":"2.0","id":5,"result":{"number":"0x10","timestamp":"0x56c3f2a0","transactions":[]}}"#,
        )
        .unwrap();
        let block = raw.unwrap().decode().unwrap();
        assert_eq!(block.number, 16);
        assert_eq!(block.timestamp, 0x56c3f2a0);
    }

    #[test]
    fn test_decode_missing_block() {
        let raw: Option<RawBlock> =
            decode_envelope(r#"{"jsonrpc":"2.0","id":6,"result":null}"#).unwrap();
        assert!(raw.is_none());
    }

    #[tokio::test]
    async fn test_listening_true() {
        let (url, mut seen) = serve_once(r#"{"jsonrpc":"2.0","id":1,"result":true}"#).await;
        assert!(client(&url).listening().await);
        assert!(seen.recv().await.unwrap().contains("net_listening"));
    }

    #[tokio::test]
    async fn test_listening_node_error_is_down() {
        let (url, _seen) = serve_once(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#,
        )
        .await;
        assert!(!client(&url).listening().await);
    }

    #[tokio::test]
    async fn test_listening_closed_port_is_down() {
        let url = closed_endpoint().await;
        assert!(!client(&url).listening().await);
    }

    #[tokio::test]
    async fn test_unlocked_when_node_signs() {
        let (url, mut seen) = serve_once(r#"{"jsonrpc":"2.0","id":1,"result":"0x1234"}"#).await;
        assert_eq!(client(&url).unlocked(ADDRESS).await, Ok(true));

        let request = seen.recv().await.unwrap();
        assert!(request.contains("eth_sign"));
        assert!(request.contains(ADDRESS));
        assert!(request.contains(UNLOCK_PROBE_DATA));
    }

    #[tokio::test]
    async fn test_locked_when_node_refuses() {
        let (url, _seen) = serve_once(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"account is locked"}}"#,
        )
        .await;
        assert_eq!(client(&url).unlocked(ADDRESS).await, Ok(false));
    }

    #[tokio::test]
    async fn test_unlocked_transport_error_propagates() {
        let url = closed_endpoint().await;
        assert!(matches!(
            client(&url).unlocked(ADDRESS).await,
            Err(RpcError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn test_get_block_over_http() {
        let (url, mut seen) = serve_once(
            r#"{"jsonrpc":"2.0","id":1,"result":{"number":"0x3e8","timestamp":"0x56c3f2a0"}}"#,
        )
        .await;
        let block = client(&url).get_block(1_000, true).await.unwrap();
        assert_eq!(block.number, 1_000);
        assert_eq!(block.timestamp, 0x56c3f2a0);

        let request = seen.recv().await.unwrap();
        assert!(request.contains("eth_getBlockByNumber"));
        assert!(request.contains("0x3e8"));
    }

    #[test]
    fn test_use_endpoint() {
        let mut rpc = HttpRpc::new("http://localhost:8545", Duration::from_secs(1));
        assert_eq!(rpc.endpoint(), "http://localhost:8545");
        rpc.use_endpoint("https://hosted.example");
        assert_eq!(rpc.endpoint(), "https://hosted.example");
    }
}
