//! Resilient Ledger Client
//!
//! Wraps the coordinator-to-ledger HTTP call with bounded retry and a circuit
//! breaker, and collapses the result into three caller-facing outcomes:
//!
//! - `Applied` - the ledger accepted the transfer (first application or replay)
//! - `Rejected` - deterministic 4xx rejection carrying the reason; never retried
//! - `Unavailable` - retries exhausted or breaker open
//!
//! The transport is a trait seam so resilience logic is testable without a
//! network.

pub mod breaker;
pub mod retry;

pub use breaker::{BreakerState, CircuitBreaker};
pub use retry::RetryPolicy;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{BreakerConfig, RetryConfig};
use crate::context::RequestContext;
use crate::ledger::api::{LedgerTransferRequest, LedgerTransferResponse};

/// Outcome surfaced to the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerOutcome {
    Applied { message: String },
    Rejected { reason: String },
    Unavailable,
}

/// A reply the ledger actually produced (reachable and responsive)
#[derive(Debug, Clone)]
pub enum LedgerReply {
    Applied { message: String },
    Rejected { reason: String },
}

/// Retryable transport-level failure: connect error, timeout, or a 5xx
#[derive(Error, Debug, Clone)]
#[error("ledger transport error: {0}")]
pub struct TransportError(pub String);

/// Wire seam to the ledger facade
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    async fn apply_transfer(
        &self,
        request: &LedgerTransferRequest,
        timeout: Duration,
    ) -> Result<LedgerReply, TransportError>;
}

/// reqwest-backed transport against the ledger facade
pub struct HttpLedgerTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLedgerTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl LedgerTransport for HttpLedgerTransport {
    async fn apply_transfer(
        &self,
        request: &LedgerTransferRequest,
        timeout: Duration,
    ) -> Result<LedgerReply, TransportError> {
        let url = format!("{}/ledger/transfer", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body: LedgerTransferResponse = response
                .json()
                .await
                .map_err(|e| TransportError(format!("malformed ledger response: {}", e)))?;
            Ok(LedgerReply::Applied { message: body.message })
        } else if status.is_client_error() {
            // Deterministic rejection; the body carries the reason
            let reason = match response.json::<LedgerTransferResponse>().await {
                Ok(body) => body.message,
                Err(_) => format!("ledger rejected request ({})", status),
            };
            Ok(LedgerReply::Rejected { reason })
        } else {
            Err(TransportError(format!("ledger returned {}", status)))
        }
    }
}

/// Scripted in-memory transport
///
/// Pops one pre-programmed reply per call, falling back to a fixed reply when
/// the script runs dry. Used by unit and integration tests in place of the
/// HTTP transport.
pub struct MockLedgerTransport {
    script: std::sync::Mutex<std::collections::VecDeque<Result<LedgerReply, TransportError>>>,
    fallback: Result<LedgerReply, TransportError>,
    calls: std::sync::Mutex<u32>,
}

impl MockLedgerTransport {
    pub fn scripted(
        script: Vec<Result<LedgerReply, TransportError>>,
        fallback: Result<LedgerReply, TransportError>,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: std::sync::Mutex::new(script.into()),
            fallback,
            calls: std::sync::Mutex::new(0),
        })
    }

    /// Every call succeeds
    pub fn always_applied() -> Arc<Self> {
        Self::scripted(
            Vec::new(),
            Ok(LedgerReply::Applied {
                message: "Transfer completed successfully".to_string(),
            }),
        )
    }

    /// Every call fails at the transport layer (service down)
    pub fn always_down() -> Arc<Self> {
        Self::scripted(Vec::new(), Err(TransportError("connection refused".into())))
    }

    /// Every call is deterministically rejected with the given reason
    pub fn always_rejected(reason: &str) -> Arc<Self> {
        Self::scripted(
            Vec::new(),
            Ok(LedgerReply::Rejected {
                reason: reason.to_string(),
            }),
        )
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl LedgerTransport for MockLedgerTransport {
    async fn apply_transfer(
        &self,
        _request: &LedgerTransferRequest,
        _timeout: Duration,
    ) -> Result<LedgerReply, TransportError> {
        *self.calls.lock().unwrap() += 1;
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Retry + breaker composition around a `LedgerTransport`
pub struct ResilientLedgerClient {
    transport: Arc<dyn LedgerTransport>,
    retry: RetryPolicy,
    breaker: CircuitBreaker,
    call_timeout: Duration,
}

impl ResilientLedgerClient {
    pub fn new(
        transport: Arc<dyn LedgerTransport>,
        retry_config: &RetryConfig,
        breaker_config: &BreakerConfig,
        call_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            retry: RetryPolicy::new(retry_config),
            breaker: CircuitBreaker::new(breaker_config.clone()),
            call_timeout,
        }
    }

    /// Build a client over HTTP against the ledger facade base URL
    pub fn over_http(
        base_url: &str,
        retry_config: &RetryConfig,
        breaker_config: &BreakerConfig,
        call_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let transport = Arc::new(HttpLedgerTransport::new(base_url)?);
        Ok(Self::new(transport, retry_config, breaker_config, call_timeout))
    }

    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.state()
    }

    /// Dispatch one transfer through retry + breaker protection.
    ///
    /// A timed-out call counts as one failed attempt against both the retry
    /// budget and the breaker window. 4xx replies are returned immediately.
    pub async fn apply_transfer(
        &self,
        ctx: &RequestContext,
        request: &LedgerTransferRequest,
    ) -> LedgerOutcome {
        for attempt in 1..=self.retry.max_attempts {
            if !self.breaker.try_acquire() {
                warn!(
                    request_id = %ctx.request_id,
                    transfer_id = %request.transfer_id,
                    "Circuit breaker open, failing fast"
                );
                return LedgerOutcome::Unavailable;
            }

            let timeout = match ctx.remaining() {
                Some(remaining) => remaining.min(self.call_timeout),
                None => self.call_timeout,
            };

            match self.transport.apply_transfer(request, timeout).await {
                Ok(LedgerReply::Applied { message }) => {
                    self.breaker.record_success();
                    debug!(
                        request_id = %ctx.request_id,
                        transfer_id = %request.transfer_id,
                        attempt = attempt,
                        "Ledger applied transfer"
                    );
                    return LedgerOutcome::Applied { message };
                }
                Ok(LedgerReply::Rejected { reason }) => {
                    // The service answered; a rejection is not a breaker failure
                    self.breaker.record_success();
                    debug!(
                        request_id = %ctx.request_id,
                        transfer_id = %request.transfer_id,
                        reason = %reason,
                        "Ledger rejected transfer"
                    );
                    return LedgerOutcome::Rejected { reason };
                }
                Err(e) => {
                    self.breaker.record_failure();
                    warn!(
                        request_id = %ctx.request_id,
                        transfer_id = %request.transfer_id,
                        attempt = attempt,
                        error = %e,
                        "Ledger call failed"
                    );
                    if attempt < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.backoff_for(attempt)).await;
                    }
                }
            }
        }

        LedgerOutcome::Unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted(script: Vec<Result<LedgerReply, TransportError>>) -> Arc<MockLedgerTransport> {
        MockLedgerTransport::scripted(script, Err(TransportError("script exhausted".into())))
    }

    fn request() -> LedgerTransferRequest {
        LedgerTransferRequest {
            transfer_id: "t-1".to_string(),
            from_account_id: 1,
            to_account_id: 2,
            amount: "10.00".parse().unwrap(),
        }
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 4,
        }
    }

    fn client(transport: Arc<dyn LedgerTransport>, breaker: BreakerConfig) -> ResilientLedgerClient {
        ResilientLedgerClient::new(transport, &fast_retry(), &breaker, Duration::from_secs(1))
    }

    fn applied() -> Result<LedgerReply, TransportError> {
        Ok(LedgerReply::Applied {
            message: "Transfer completed successfully".to_string(),
        })
    }

    fn failure() -> Result<LedgerReply, TransportError> {
        Err(TransportError("connection refused".into()))
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let transport = scripted(vec![applied()]);
        let client = client(transport.clone(), BreakerConfig::default());

        let outcome = client
            .apply_transfer(&RequestContext::synthesized(), &request())
            .await;
        assert!(matches!(outcome, LedgerOutcome::Applied { .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let transport = scripted(vec![failure(), failure(), applied()]);
        let client = client(transport.clone(), BreakerConfig::default());

        let outcome = client
            .apply_transfer(&RequestContext::synthesized(), &request())
            .await;
        assert!(matches!(outcome, LedgerOutcome::Applied { .. }));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_rejection_is_never_retried() {
        let transport = scripted(vec![Ok(LedgerReply::Rejected {
            reason: "Insufficient funds in account 1".to_string(),
        })]);
        let client = client(transport.clone(), BreakerConfig::default());

        let outcome = client
            .apply_transfer(&RequestContext::synthesized(), &request())
            .await;
        assert_eq!(
            outcome,
            LedgerOutcome::Rejected {
                reason: "Insufficient funds in account 1".to_string()
            }
        );
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_become_unavailable() {
        let transport = scripted(vec![failure(), failure(), failure()]);
        let client = client(transport.clone(), BreakerConfig::default());

        let outcome = client
            .apply_transfer(&RequestContext::synthesized(), &request())
            .await;
        assert_eq!(outcome, LedgerOutcome::Unavailable);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_open_breaker_fails_fast_without_network() {
        let transport = scripted(vec![failure(), failure(), failure()]);
        let breaker = BreakerConfig {
            failure_rate_threshold: 0.5,
            window_size: 2,
            open_duration_ms: 60_000,
            half_open_probes: 1,
        };
        let client = client(transport.clone(), breaker);

        // Burn through the retry budget; the window trips on the second failure
        let first = client
            .apply_transfer(&RequestContext::synthesized(), &request())
            .await;
        assert_eq!(first, LedgerOutcome::Unavailable);
        let calls_after_first = transport.calls();
        assert!(calls_after_first <= 2);

        // Breaker is open now: no further transport calls
        let second = client
            .apply_transfer(&RequestContext::synthesized(), &request())
            .await;
        assert_eq!(second, LedgerOutcome::Unavailable);
        assert_eq!(transport.calls(), calls_after_first);
        assert_eq!(client.breaker_state(), BreakerState::Open);
    }

    #[tokio::test]
    async fn test_half_open_probe_recovers() {
        let transport = scripted(vec![failure(), failure(), applied(), applied()]);
        let breaker = BreakerConfig {
            failure_rate_threshold: 0.5,
            window_size: 2,
            open_duration_ms: 20,
            half_open_probes: 1,
        };
        let client = client(transport.clone(), breaker);

        let first = client
            .apply_transfer(&RequestContext::synthesized(), &request())
            .await;
        assert_eq!(first, LedgerOutcome::Unavailable);
        assert_eq!(client.breaker_state(), BreakerState::Open);

        tokio::time::sleep(Duration::from_millis(30)).await;

        // Probe passes, breaker closes, traffic flows again
        let probe = client
            .apply_transfer(&RequestContext::synthesized(), &request())
            .await;
        assert!(matches!(probe, LedgerOutcome::Applied { .. }));
        assert_eq!(client.breaker_state(), BreakerState::Closed);

        let after = client
            .apply_transfer(&RequestContext::synthesized(), &request())
            .await;
        assert!(matches!(after, LedgerOutcome::Applied { .. }));
    }
}
