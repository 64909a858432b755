//! Gateway client: one JSON POST per operation

use super::types::{GatewayResponse, Operation, SubmitOutcome};
use crate::config::GatewayConfig;
use crate::error::{ClientError, ClientResult};

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Raw HTTP answer from the gateway
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced an HTTP response
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// HTTP transport used by [`GatewayClient`]
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    /// POST `body` as `application/json` to `url`
    async fn post_json(&self, url: &str, body: String) -> Result<RawResponse, TransportError>;
}

/// `reqwest` transport with a per-request timeout
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl GatewayTransport for HttpTransport {
    async fn post_json(&self, url: &str, body: String) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError("Request timed out".to_string())
                } else {
                    TransportError(format!("Request error: {}", e))
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(format!("Failed to read response body: {}", e)))?;

        Ok(RawResponse { status, body })
    }
}

/// Client for one gateway; cheap to clone
#[derive(Clone)]
pub struct GatewayClient {
    config: GatewayConfig,
    transport: Arc<dyn GatewayTransport>,
}

impl GatewayClient {
    /// Create a client backed by an HTTP transport
    pub fn new(config: GatewayConfig) -> ClientResult<Self> {
        let transport = HttpTransport::new(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over a caller-supplied transport
    pub fn with_transport(config: GatewayConfig, transport: Arc<dyn GatewayTransport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Protocol version sent with requests
    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn app_key(&self) -> Option<&str> {
        self.config.app_key.as_deref()
    }

    /// Full URL for an operation
    pub fn endpoint(&self, operation: Operation) -> String {
        format!("{}{}", self.config.url, operation.endpoint())
    }

    /// Generic gateway query
    ///
    /// Any JSON answer is returned as-is, whatever its `Result` code; transport
    /// failures, non-2xx statuses and non-JSON bodies are errors.
    pub async fn query(&self, operation: Operation, body: Value) -> ClientResult<GatewayResponse> {
        let url = self.endpoint(operation);
        debug!("Gateway query {} -> {}", operation, url);

        let raw = match self.transport.post_json(&url, body.to_string()).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Gateway {} unreachable: {}", operation, e);
                crate::metrics::record_gateway_request(operation.endpoint(), "network_error");
                return Err(ClientError::Network {
                    operation: operation.to_string(),
                    message: e.to_string(),
                });
            }
        };

        if !raw.is_ok() {
            warn!("Gateway {} returned HTTP {}", operation, raw.status);
            crate::metrics::record_gateway_request(operation.endpoint(), "http_error");
            return Err(ClientError::Network {
                operation: operation.to_string(),
                message: format!("Network response was not ok (HTTP {})", raw.status),
            });
        }

        let parsed: Value = serde_json::from_str(&raw.body).map_err(|e| {
            crate::metrics::record_gateway_request(operation.endpoint(), "parse_error");
            ClientError::Parse {
                operation: operation.to_string(),
                message: e.to_string(),
            }
        })?;

        let response = GatewayResponse::from_value(parsed);
        crate::metrics::record_gateway_request(
            operation.endpoint(),
            if response.is_success() { "ok" } else { "rejected" },
        );
        debug!("Gateway {} answered with result {}", operation, response.result);

        Ok(response)
    }

    /// Post a write operation; never fails
    ///
    /// The HTTP status is not checked: whatever body comes back is parsed as an
    /// envelope when possible, and returned verbatim otherwise.
    pub async fn submit(&self, operation: Operation, body: Value) -> SubmitOutcome {
        let url = self.endpoint(operation);
        debug!("Gateway submit {} -> {}", operation, url);

        match self.transport.post_json(&url, body.to_string()).await {
            Ok(raw) => match serde_json::from_str::<Value>(&raw.body) {
                Ok(parsed) => {
                    let response = GatewayResponse::from_value(parsed);
                    crate::metrics::record_gateway_request(
                        operation.endpoint(),
                        if response.is_success() { "ok" } else { "rejected" },
                    );
                    SubmitOutcome::Response(response)
                }
                Err(_) => {
                    warn!(
                        "Gateway {} answered HTTP {} with a non-JSON body",
                        operation, raw.status
                    );
                    crate::metrics::record_gateway_request(operation.endpoint(), "parse_error");
                    SubmitOutcome::Unparsed {
                        status: raw.status,
                        message: raw.body,
                    }
                }
            },
            Err(e) => {
                warn!("Gateway {} unreachable: {}", operation, e);
                crate::metrics::record_gateway_request(operation.endpoint(), "network_error");
                SubmitOutcome::unreachable(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use mockall::predicate::eq;
    use serde_json::json;

    pub(crate) fn json_reply(body: Value) -> Result<RawResponse, TransportError> {
        Ok(RawResponse {
            status: 200,
            body: body.to_string(),
        })
    }

    fn client(transport: MockGatewayTransport) -> GatewayClient {
        GatewayClient::with_transport(
            GatewayConfig::default().with_url("http://gateway.test/NAG.php?cep="),
            Arc::new(transport),
        )
    }

    #[tokio::test]
    async fn test_query_posts_to_operation_endpoint() {
        let mut transport = MockGatewayTransport::new();
        transport
            .expect_post_json()
            .with(
                eq("http://gateway.test/NAG.php?cep=Circular_GetBlockchains_"),
                eq("{}".to_string()),
            )
            .times(1)
            .returning(|_, _| json_reply(json!({"Result": 200, "Response": {"Blockchains": []}})));

        let response = client(transport)
            .query(Operation::GetBlockchains, json!({}))
            .await
            .unwrap();
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_query_keeps_non_200_results() {
        let mut transport = MockGatewayTransport::new();
        transport
            .expect_post_json()
            .returning(|_, _| json_reply(json!({"Result": 102, "Response": "Wrong Blockchain"})));

        let response = client(transport)
            .query(Operation::GetBlock, json!({}))
            .await
            .unwrap();
        assert_eq!(response.result, 102);
    }

    #[tokio::test]
    async fn test_query_errors() {
        let mut transport = MockGatewayTransport::new();
        transport
            .expect_post_json()
            .times(1)
            .returning(|_, _| Err(TransportError("connection refused".to_string())));
        let err = client(transport)
            .query(Operation::GetBlock, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Network { .. }));

        let mut transport = MockGatewayTransport::new();
        transport.expect_post_json().returning(|_, _| {
            Ok(RawResponse {
                status: 200,
                body: "<html>maintenance</html>".to_string(),
            })
        });
        let err = client(transport)
            .query(Operation::GetBlock, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Parse { .. }));

        let mut transport = MockGatewayTransport::new();
        transport.expect_post_json().returning(|_, _| {
            Ok(RawResponse {
                status: 503,
                body: "{}".to_string(),
            })
        });
        let err = client(transport)
            .query(Operation::GetBlock, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Network { .. }));
    }

    #[tokio::test]
    async fn test_submit_never_errors() {
        let mut transport = MockGatewayTransport::new();
        transport
            .expect_post_json()
            .returning(|_, _| Err(TransportError("connection refused".to_string())));
        let outcome = client(transport)
            .submit(Operation::AddTransaction, json!({}))
            .await;
        assert_eq!(
            outcome,
            SubmitOutcome::Unreachable {
                message: "Server unreachable".to_string(),
                error: "connection refused".to_string(),
            }
        );

        let mut transport = MockGatewayTransport::new();
        transport.expect_post_json().returning(|_, _| {
            Ok(RawResponse {
                status: 502,
                body: "Bad Gateway".to_string(),
            })
        });
        let outcome = client(transport)
            .submit(Operation::AddTransaction, json!({}))
            .await;
        assert_eq!(
            outcome,
            SubmitOutcome::Unparsed {
                status: 502,
                message: "Bad Gateway".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_submit_labels_rejected_envelopes() {
        let labels = |outcome: &str| {
            crate::metrics::GATEWAY_REQUESTS
                .with_label_values(&["Circular_GetVoucher_", outcome])
                .get()
        };
        let ok_before = labels("ok");
        let rejected_before = labels("rejected");

        let mut transport = MockGatewayTransport::new();
        transport
            .expect_post_json()
            .returning(|_, _| json_reply(json!({"Result": 102, "Response": "Invalid Signature"})));
        let outcome = client(transport)
            .submit(Operation::GetVoucher, json!({}))
            .await;

        assert!(!outcome.is_success());
        assert_eq!(labels("rejected"), rejected_before + 1.0);
        assert_eq!(labels("ok"), ok_before);
    }
}
