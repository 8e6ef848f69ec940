//! JSON-RPC over HTTP.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chainetl_rpc_types::{JsonRpcRequest, JsonRpcResponse, RpcBlock, RpcReceipt};
use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{NodeClientError, NodeClientResult};
use crate::NodeClient;

/// Default number of requests per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Pick one endpoint out of a comma separated list.
///
/// Spreads load when several equivalent nodes are configured. Returns `None`
/// when the list holds no non-empty entry.
pub fn pick_provider_uri(provider_uri: &str) -> Option<String> {
    let uris: Vec<&str> = provider_uri
        .split(',')
        .map(str::trim)
        .filter(|uri| !uri.is_empty())
        .collect();
    uris.choose(&mut rand::thread_rng())
        .map(|uri| uri.to_string())
}

/// Convert a single response into its result value.
///
/// A response without `result` and without `error` is what a node returns
/// while it is still catching up.
pub fn response_to_result(response: JsonRpcResponse) -> NodeClientResult<Value> {
    match (response.result, response.error) {
        (_, Some(error)) => Err(NodeClientError::Rpc {
            code: error.code,
            message: error.message,
        }),
        (Some(result), None) => Ok(result),
        (None, None) => Err(NodeClientError::NotSynced),
    }
}

/// Split a batch response body into its entries.
///
/// A node that rejects the batch as a whole answers with a single error
/// object instead of an array; that error is returned as is so its code
/// drives the retry decision.
pub fn batch_responses(body: Value) -> NodeClientResult<Vec<JsonRpcResponse>> {
    if body.is_array() {
        return Ok(serde_json::from_value(body)?);
    }
    let response: JsonRpcResponse = serde_json::from_value(body)?;
    response_to_result(response)?;
    Err(NodeClientError::Decode(
        "batch request answered with a single result".to_string(),
    ))
}

/// [`NodeClient`] backed by a node's HTTP JSON-RPC endpoint.
pub struct JsonRpcNodeClient {
    client: reqwest::Client,
    url: String,
    batch_size: usize,
    next_id: AtomicU64,
}

impl JsonRpcNodeClient {
    /// Create a client for `url`. A `batch_size` of zero is treated as one.
    pub fn new(url: impl Into<String>, timeout: Duration, batch_size: usize) -> NodeClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NodeClientError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            batch_size: batch_size.max(1),
            next_id: AtomicU64::new(1),
        })
    }

    /// Create a client for one endpoint picked from a comma separated list.
    pub fn from_provider_uri(
        provider_uri: &str,
        timeout: Duration,
        batch_size: usize,
    ) -> NodeClientResult<Self> {
        let url = pick_provider_uri(provider_uri)
            .ok_or_else(|| NodeClientError::Transport("no provider uri configured".to_string()))?;
        tracing::debug!(url = %url, "selected node endpoint");
        Self::new(url, timeout, batch_size)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// POST a payload and parse the body as JSON.
    ///
    /// The node reports JSON-RPC errors with non-2xx statuses, so the body is
    /// parsed regardless of status and only an unparseable body is a
    /// transport failure.
    async fn post<T: DeserializeOwned>(&self, payload: &impl serde::Serialize) -> NodeClientResult<T> {
        let response = self.client.post(&self.url).json(payload).send().await?;
        let status = response.status();
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                NodeClientError::Decode(format!("invalid JSON-RPC response: {e}"))
            } else {
                NodeClientError::Transport(format!("HTTP {status}: {body}"))
            }
        })
    }

    async fn call<T: DeserializeOwned>(&self, request: JsonRpcRequest) -> NodeClientResult<T> {
        let method = request.method.clone();
        let response: JsonRpcResponse = self.post(&request).await?;
        let result = response_to_result(response)?;
        serde_json::from_value(result)
            .map_err(|e| NodeClientError::Decode(format!("{method}: {e}")))
    }

    /// Send requests as JSON-RPC batches of at most `batch_size` entries.
    ///
    /// Results are returned in request order whatever order the node answers
    /// in.
    async fn call_batch<T: DeserializeOwned>(
        &self,
        requests: Vec<JsonRpcRequest>,
    ) -> NodeClientResult<Vec<T>> {
        let mut results = Vec::with_capacity(requests.len());
        for chunk in requests.chunks(self.batch_size) {
            let body: Value = self.post(&chunk).await?;
            let mut by_id: HashMap<u64, JsonRpcResponse> = batch_responses(body)?
                .into_iter()
                .filter_map(|response| response.id.map(|id| (id, response)))
                .collect();

            for request in chunk {
                let response = by_id
                    .remove(&request.id)
                    .ok_or(NodeClientError::MissingResult(request.id))?;
                let result = response_to_result(response)?;
                results.push(
                    serde_json::from_value(result)
                        .map_err(|e| NodeClientError::Decode(format!("{}: {e}", request.method)))?,
                );
            }
            tracing::trace!(size = chunk.len(), "batch completed");
        }
        Ok(results)
    }
}

#[async_trait]
impl NodeClient for JsonRpcNodeClient {
    async fn get_block(&self, height: u64) -> NodeClientResult<RpcBlock> {
        self.call(JsonRpcRequest::get_block_by_height(height, self.next_id()))
            .await
    }

    async fn get_latest_block(&self) -> NodeClientResult<RpcBlock> {
        self.call(JsonRpcRequest::get_last_block(self.next_id())).await
    }

    async fn get_transaction_receipt(&self, tx_hash: &str) -> NodeClientResult<RpcReceipt> {
        self.call(JsonRpcRequest::get_transaction_result(tx_hash, self.next_id()))
            .await
    }

    async fn get_blocks(&self, heights: &[u64]) -> NodeClientResult<Vec<RpcBlock>> {
        let requests = heights
            .iter()
            .map(|height| JsonRpcRequest::get_block_by_height(*height, self.next_id()))
            .collect();
        self.call_batch(requests).await
    }

    async fn get_transaction_receipts(
        &self,
        tx_hashes: &[String],
    ) -> NodeClientResult<Vec<RpcReceipt>> {
        let requests = tx_hashes
            .iter()
            .map(|hash| JsonRpcRequest::get_transaction_result(hash, self.next_id()))
            .collect();
        self.call_batch(requests).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn parse(body: &str) -> JsonRpcResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_result_is_returned() {
        let value =
            response_to_result(parse(r#"{"jsonrpc":"2.0","id":1,"result":{"height":5}}"#)).unwrap();
        assert_eq!(value["height"], 5);
    }

    #[test]
    fn test_error_object_becomes_rpc_error() {
        let err = response_to_result(parse(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"fail wrong block height"}}"#,
        ))
        .unwrap_err();
        match err {
            NodeClientError::Rpc { code, message } => {
                assert_eq!(code, -32602);
                assert_eq!(message, "fail wrong block height");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_response_is_not_synced() {
        let err = response_to_result(parse(r#"{"jsonrpc":"2.0","id":1}"#)).unwrap_err();
        assert!(matches!(err, NodeClientError::NotSynced));
        assert!(err.is_retriable());
    }

    #[test]
    fn test_pick_provider_uri() {
        assert_eq!(
            pick_provider_uri("https://a.example/api/v3").as_deref(),
            Some("https://a.example/api/v3")
        );

        let picked = pick_provider_uri("https://a.example, https://b.example").unwrap();
        assert!(picked == "https://a.example" || picked == "https://b.example");

        assert!(pick_provider_uri(" , ").is_none());
        assert!(pick_provider_uri("").is_none());
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let client = JsonRpcNodeClient::new("http://localhost:9000", Duration::from_secs(1), 0).unwrap();
        assert_eq!(client.batch_size, 1);
        assert_eq!(client.url(), "http://localhost:9000");
        assert_eq!(client.next_id(), 1);
        assert_eq!(client.next_id(), 2);
    }

    #[test]
    fn test_single_error_object_for_batch() {
        let err = batch_responses(json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": {"code": -32000, "message": "server busy"}
        }))
        .unwrap_err();
        assert!(matches!(err, NodeClientError::Rpc { code: -32000, .. }));
        assert!(err.is_retriable());

        let err = batch_responses(json!({"jsonrpc": "2.0", "id": 1, "result": {}})).unwrap_err();
        assert!(matches!(err, NodeClientError::Decode(_)));
    }

    /// Answer every batch entry with a block echoing the requested height,
    /// in reverse order, leaving out the ids in `missing`.
    fn reversed_blocks(missing: Vec<u64>) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync {
        move |request: &Request| {
            let entries: Vec<Value> = request.body_json().unwrap();
            let replies: Vec<Value> = entries
                .iter()
                .rev()
                .filter(|entry| !missing.contains(&entry["id"].as_u64().unwrap()))
                .map(|entry| {
                    json!({
                        "jsonrpc": "2.0",
                        "id": entry["id"],
                        "result": {"height": entry["params"]["height"], "time_stamp": 1_000}
                    })
                })
                .collect();
            ResponseTemplate::new(200).set_body_json(replies)
        }
    }

    fn client_for(server: &MockServer, batch_size: usize) -> JsonRpcNodeClient {
        JsonRpcNodeClient::new(server.uri(), Duration::from_secs(5), batch_size).unwrap()
    }

    #[tokio::test]
    async fn test_batches_are_chunked_and_reordered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(reversed_blocks(Vec::new()))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server, 2);
        let blocks = client.get_blocks(&[5, 6, 7]).await.unwrap();
        let heights: Vec<u64> = blocks.iter().map(|b| b.height).collect();
        assert_eq!(heights, vec![5, 6, 7]);

        let requests = server.received_requests().await.unwrap();
        let sizes: Vec<usize> = requests
            .iter()
            .map(|r| r.body_json::<Vec<Value>>().unwrap().len())
            .collect();
        assert_eq!(sizes, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_batch_entry_without_answer() {
        let server = MockServer::start().await;
        // Ids start at 1, so the second height gets id 2.
        Mock::given(method("POST"))
            .respond_with(reversed_blocks(vec![2]))
            .mount(&server)
            .await;

        let client = client_for(&server, 10);
        let err = client.get_blocks(&[5, 6, 7]).await.unwrap_err();
        assert!(matches!(err, NodeClientError::MissingResult(2)));
        assert!(!err.is_retriable());
    }

    #[tokio::test]
    async fn test_batch_entry_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"jsonrpc": "2.0", "id": 1, "result": {"height": "0x5"}},
                {"jsonrpc": "2.0", "id": 2, "error": {"code": -32602, "message": "fail wrong block height"}}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server, 10);
        let err = client.get_blocks(&[5, 6]).await.unwrap_err();
        assert!(matches!(err, NodeClientError::Rpc { code: -32602, .. }));
    }

    #[tokio::test]
    async fn test_batch_rejected_as_a_whole() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {"code": -32603, "message": "internal error"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, 10);
        let err = client.get_blocks(&[5, 6]).await.unwrap_err();
        assert!(matches!(err, NodeClientError::Rpc { code: -32603, .. }));
        assert!(err.is_retriable());
    }

    #[tokio::test]
    async fn test_single_call_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {"height": 42, "time_stamp": "0x563a6cf330136"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, 10);
        let block = client.get_latest_block().await.unwrap();
        assert_eq!(block.height, 42);
        assert_eq!(block.time_stamp, Some(0x563a6cf330136));
    }
}
