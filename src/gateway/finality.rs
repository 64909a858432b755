//! Transaction finality polling
//!
//! A poll waits one interval, checks, and repeats until it settles as
//! [`PollStatus::Confirmed`], `TimedOut`, `Failed` or `Cancelled`. The
//! deadline is tested before every query, so a poll may run up to one
//! interval past its timeout. A transport or parse error ends the poll at once.

use super::client::GatewayClient;
use super::types::GatewayResponse;
use crate::config::FinalityConfig;
use crate::encoding::hex_fix;
use crate::error::{ClientError, ClientResult};

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Sentinel the gateway returns while a transaction is unknown
pub const NOT_FOUND: &str = "Transaction Not Found";

/// Status the gateway reports for transactions not yet executed
pub const PENDING_STATUS: &str = "Pending";

/// Block window handed to the transaction-by-ID search
const SEARCH_START: u64 = 0;
const SEARCH_END: u64 = 10;

/// How a poll settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    Confirmed,
    TimedOut,
    Failed,
    Cancelled,
}

impl PollStatus {
    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            PollStatus::Confirmed => "confirmed",
            PollStatus::TimedOut => "timed_out",
            PollStatus::Failed => "failed",
            PollStatus::Cancelled => "cancelled",
        }
    }
}

/// What one check learned about the transaction
#[derive(Debug, Clone, PartialEq)]
pub enum CheckResult {
    /// Found with a terminal status
    Final(Value),
    /// Unknown, pending, or the gateway declined the query
    NotYet,
}

/// Classify a transaction-by-ID response
pub fn classify(response: &GatewayResponse) -> CheckResult {
    if !response.is_success() {
        return CheckResult::NotYet;
    }
    if response.response.as_str() == Some(NOT_FOUND) {
        return CheckResult::NotYet;
    }
    if response.response.get("Status").and_then(Value::as_str) == Some(PENDING_STATUS) {
        return CheckResult::NotYet;
    }
    CheckResult::Final(response.response.clone())
}

/// Cancels a background poll; clones share the same poll
#[derive(Clone)]
pub struct PollCanceller(Arc<watch::Sender<bool>>);

impl PollCanceller {
    /// Stop polling; the outcome becomes [`ClientError::Cancelled`] unless it already settled
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

/// Handle to a poll running in the background
pub struct PollHandle {
    cancel: PollCanceller,
    task: JoinHandle<ClientResult<Value>>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Canceller that outlives the handle, for use from another task
    pub fn canceller(&self) -> PollCanceller {
        self.cancel.clone()
    }

    /// Wait for the poll to settle
    pub async fn outcome(self) -> ClientResult<Value> {
        self.task
            .await
            .map_err(|e| ClientError::Internal(format!("Poll task failed: {}", e)))?
    }
}

/// Waits for transactions to reach a terminal status
#[derive(Clone)]
pub struct FinalityPoller {
    client: GatewayClient,
    interval: Duration,
}

impl FinalityPoller {
    /// Create a poller checking every `interval_secs`
    pub fn new(client: GatewayClient, interval_secs: u64) -> Self {
        Self {
            client,
            interval: Duration::from_secs(interval_secs),
        }
    }

    pub fn from_config(client: GatewayClient, config: &FinalityConfig) -> Self {
        Self::new(client, config.interval_secs)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll until the transaction is final or `timeout_secs` elapse
    pub async fn wait(
        &self,
        blockchain: &str,
        tx_id: &str,
        timeout_secs: u64,
    ) -> ClientResult<Value> {
        // Sender stays alive for the whole poll, so the cancel branch never fires
        let (_cancel, cancel_rx) = watch::channel(false);
        self.run(blockchain, tx_id, timeout_secs, cancel_rx).await
    }

    /// Start polling in the background and return a cancellable handle
    pub fn spawn(&self, blockchain: &str, tx_id: &str, timeout_secs: u64) -> PollHandle {
        let (cancel, cancel_rx) = watch::channel(false);
        let poller = self.clone();
        let blockchain = blockchain.to_string();
        let tx_id = tx_id.to_string();

        let task = tokio::spawn(async move {
            poller
                .run(&blockchain, &tx_id, timeout_secs, cancel_rx)
                .await
        });

        PollHandle {
            cancel: PollCanceller(Arc::new(cancel)),
            task,
        }
    }

    async fn run(
        &self,
        blockchain: &str,
        tx_id: &str,
        timeout_secs: u64,
        mut cancel: watch::Receiver<bool>,
    ) -> ClientResult<Value> {
        let tx_id = hex_fix(tx_id);
        let start = Instant::now();
        let timeout = Duration::from_secs(timeout_secs);

        debug!(
            "Waiting for transaction {} (timeout {}s, interval {:?})",
            tx_id, timeout_secs, self.interval
        );

        let (status, result) = loop {
            let cancelled = tokio::select! {
                _ = tokio::time::sleep(self.interval) => false,
                _ = cancel_requested(&mut cancel) => true,
            };
            if cancelled {
                break (
                    PollStatus::Cancelled,
                    Err(ClientError::Cancelled { tx_id: tx_id.to_string() }),
                );
            }

            let elapsed = start.elapsed();
            if elapsed > timeout {
                warn!(
                    "Timeout exceeded for transaction {} after {:?}",
                    tx_id, elapsed
                );
                break (
                    PollStatus::TimedOut,
                    Err(ClientError::Timeout {
                        tx_id: tx_id.to_string(),
                        timeout_secs,
                    }),
                );
            }

            let response = match self
                .client
                .get_transaction_by_id(blockchain, tx_id, SEARCH_START, SEARCH_END)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!("Error fetching transaction {}: {}", tx_id, e);
                    break (PollStatus::Failed, Err(e));
                }
            };

            match classify(&response) {
                CheckResult::Final(outcome) => {
                    info!(
                        "Transaction {} final after {:?}",
                        tx_id,
                        start.elapsed()
                    );
                    break (PollStatus::Confirmed, Ok(outcome));
                }
                CheckResult::NotYet => {
                    debug!(
                        "Transaction {} not yet confirmed or not found ({:?} elapsed)",
                        tx_id, elapsed
                    );
                }
            }
        };

        crate::metrics::record_poll_outcome(status.label(), start.elapsed().as_secs_f64());

        result
    }
}

/// Resolves once cancellation is requested; pends forever if the handle is gone
async fn cancel_requested(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::gateway::client::tests::json_reply;
    use crate::gateway::client::{MockGatewayTransport, TransportError};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn poller(transport: MockGatewayTransport, interval_secs: u64) -> FinalityPoller {
        let client = GatewayClient::with_transport(
            GatewayConfig::default().with_url("http://gateway.test/?cep="),
            Arc::new(transport),
        );
        FinalityPoller::new(client, interval_secs)
    }

    fn status(status: &str) -> Value {
        json!({"Result": 200, "Response": {"ID": "abcd", "Status": status}})
    }

    #[test]
    fn test_classify() {
        let pending = GatewayResponse::from_value(status("Pending"));
        let executed = GatewayResponse::from_value(status("Executed"));
        let missing = GatewayResponse::from_value(json!({"Result": 200, "Response": NOT_FOUND}));
        let rejected = GatewayResponse::from_value(json!({"Result": 108, "Response": {}}));

        assert_eq!(classify(&pending), CheckResult::NotYet);
        assert_eq!(classify(&missing), CheckResult::NotYet);
        assert_eq!(classify(&rejected), CheckResult::NotYet);
        assert_eq!(
            classify(&executed),
            CheckResult::Final(json!({"ID": "abcd", "Status": "Executed"}))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirms_on_third_check() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut transport = MockGatewayTransport::new();
        transport
            .expect_post_json()
            .withf(|url, _| url.ends_with("Circular_GetTransactionbyID_"))
            .times(3)
            .returning(move |_, _| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    json_reply(status("Pending"))
                } else {
                    json_reply(status("Executed"))
                }
            });

        let start = Instant::now();
        let outcome = poller(transport, 1).wait("aa", "0xabcd", 3).await.unwrap();

        assert_eq!(outcome["Status"], "Executed");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed().as_secs(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_while_pending() {
        let mut transport = MockGatewayTransport::new();
        transport
            .expect_post_json()
            .times(2)
            .returning(|_, _| json_reply(status("Pending")));

        let start = Instant::now();
        let err = poller(transport, 1).wait("aa", "abcd", 2).await.unwrap_err();

        assert!(matches!(
            err,
            ClientError::Timeout { timeout_secs: 2, .. }
        ));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed <= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_keeps_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut transport = MockGatewayTransport::new();
        transport.expect_post_json().returning(move |_, _| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                json_reply(json!({"Result": 200, "Response": NOT_FOUND}))
            } else {
                json_reply(status("Executed"))
            }
        });

        let outcome = poller(transport, 5).wait("aa", "abcd", 60).await.unwrap();
        assert_eq!(outcome["Status"], "Executed");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_fails_immediately() {
        let mut transport = MockGatewayTransport::new();
        transport
            .expect_post_json()
            .times(1)
            .returning(|_, _| Err(TransportError("connection reset".to_string())));

        let err = poller(transport, 1).wait("aa", "abcd", 30).await.unwrap_err();
        assert!(matches!(err, ClientError::Network { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling() {
        let mut transport = MockGatewayTransport::new();
        transport
            .expect_post_json()
            .times(2)
            .returning(|_, _| json_reply(status("Pending")));

        let handle = poller(transport, 1).spawn("aa", "abcd", 600);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        handle.cancel();

        let err = handle.outcome().await.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_canceller_from_another_task() {
        let mut transport = MockGatewayTransport::new();
        transport
            .expect_post_json()
            .returning(|_, _| json_reply(status("Pending")));

        let handle = poller(transport, 1).spawn("aa", "abcd", 600);
        let canceller = handle.canceller();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            canceller.cancel();
        });

        let err = handle.outcome().await.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_outcome_recorded_by_status() {
        let timed_out = || {
            crate::metrics::POLL_OUTCOMES
                .with_label_values(&[PollStatus::TimedOut.label()])
                .get()
        };
        let before = timed_out();

        let mut transport = MockGatewayTransport::new();
        transport
            .expect_post_json()
            .returning(|_, _| json_reply(status("Pending")));
        poller(transport, 1).wait("aa", "abcd", 1).await.unwrap_err();

        assert!(timed_out() >= before + 1.0);
        assert_eq!(PollStatus::Confirmed.label(), "confirmed");
        assert_eq!(PollStatus::Cancelled.label(), "cancelled");
    }
}
