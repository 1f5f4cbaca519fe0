//! Transfer HTTP Facade
//!
//! Request framing for the coordinator: enforces the `Idempotency-Key`
//! header on single-transfer requests, propagates (or synthesizes) the
//! `X-Request-ID` correlation id into the request context, and maps
//! coordinator errors onto transport status codes. A replay returns the prior
//! record with 200, whatever its status; a downstream ledger outage is
//! reported through the FAILED record, never as a 5xx.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use super::batch::BatchDispatcher;
use super::error::CoordinatorError;
use super::service::TransferCoordinator;
use super::types::{TransferIntent, TransferRecord};
use crate::config::TransferServerConfig;
use crate::context::RequestContext;

const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";
const REQUEST_ID_HEADER: &str = "X-Request-ID";

#[derive(Clone)]
pub struct TransferApiState {
    pub coordinator: Arc<TransferCoordinator>,
    pub batch: Arc<BatchDispatcher>,
    pub request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferRequest {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_id: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl TransferResponse {
    fn from_record(record: &TransferRecord) -> Self {
        Self {
            transfer_id: Some(record.transfer_id.clone()),
            status: record.status.to_string(),
            error_message: record.error_message.clone(),
        }
    }

    fn rejection(message: impl Into<String>) -> Self {
        Self {
            transfer_id: None,
            status: "FAILED".to_string(),
            error_message: Some(message.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTransferIntent {
    pub idempotency_key: String,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct BatchTransferRequest {
    pub transfers: Vec<BatchTransferIntent>,
}

#[derive(Debug, Serialize)]
pub struct BatchTransferResponse {
    pub transfers: Vec<TransferResponse>,
}

pub fn router(state: TransferApiState) -> Router {
    Router::new()
        .route("/transfers", post(create_transfer))
        .route("/transfers/{id}", get(get_transfer))
        .route("/transfers/batch", post(process_batch))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve the transfer facade
pub async fn run_server(config: &TransferServerConfig, state: TransferApiState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Transfer facade listening on http://{}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn create_transfer(
    State(state): State<TransferApiState>,
    headers: HeaderMap,
    Json(request): Json<CreateTransferRequest>,
) -> (StatusCode, Json<TransferResponse>) {
    let ctx = context_from(&headers, state.request_timeout);

    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or("");
    if idempotency_key.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(TransferResponse::rejection(
                "Idempotency-Key header is required",
            )),
        );
    }

    info!(
        request_id = %ctx.request_id,
        idempotency_key = %idempotency_key,
        "Creating transfer"
    );

    let intent = TransferIntent {
        idempotency_key: idempotency_key.to_string(),
        from_account_id: request.from_account_id,
        to_account_id: request.to_account_id,
        amount: request.amount,
    };

    match state.coordinator.create_transfer(&ctx, intent).await {
        Ok(record) => (StatusCode::OK, Json(TransferResponse::from_record(&record))),
        Err(e) => error_to_response(&e),
    }
}

async fn get_transfer(
    State(state): State<TransferApiState>,
    Path(id): Path<String>,
) -> Result<Json<TransferResponse>, StatusCode> {
    match state.coordinator.get_transfer(&id).await {
        Ok(Some(record)) => Ok(Json(TransferResponse::from_record(&record))),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn process_batch(
    State(state): State<TransferApiState>,
    headers: HeaderMap,
    Json(request): Json<BatchTransferRequest>,
) -> Result<Json<BatchTransferResponse>, (StatusCode, Json<TransferResponse>)> {
    let ctx = context_from(&headers, state.request_timeout);

    info!(
        request_id = %ctx.request_id,
        count = request.transfers.len(),
        "Processing transfer batch"
    );

    let intents = request
        .transfers
        .into_iter()
        .map(|t| TransferIntent {
            idempotency_key: t.idempotency_key,
            from_account_id: t.from_account_id,
            to_account_id: t.to_account_id,
            amount: t.amount,
        })
        .collect();

    match state.batch.process_batch(&ctx, intents).await {
        Ok(records) => Ok(Json(BatchTransferResponse {
            transfers: records.iter().map(TransferResponse::from_record).collect(),
        })),
        Err(e) => Err(error_to_response(&e)),
    }
}

async fn health() -> &'static str {
    "Transfer Service is healthy"
}

fn context_from(headers: &HeaderMap, timeout: Duration) -> RequestContext {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok());
    RequestContext::from_header(request_id).with_timeout(timeout)
}

fn error_to_response(e: &CoordinatorError) -> (StatusCode, Json<TransferResponse>) {
    let status = match e.http_status() {
        400 => StatusCode::BAD_REQUEST,
        404 => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "Internal server error".to_string()
    } else {
        e.to_string()
    };

    (status, Json(TransferResponse::rejection(message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::types::TransferStatus;

    #[test]
    fn test_response_from_record_shape() {
        let record = TransferRecord::failed_intent(
            &TransferIntent {
                idempotency_key: "k1".to_string(),
                from_account_id: 1,
                to_account_id: 2,
                amount: "10.00".parse().unwrap(),
            },
            "Insufficient funds in account 1",
        );
        let response = TransferResponse::from_record(&record);
        assert_eq!(response.status, TransferStatus::Failed.to_string());
        assert_eq!(
            response.error_message.as_deref(),
            Some("Insufficient funds in account 1")
        );

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("transferId").is_some());
        assert_eq!(json.get("status").unwrap(), "FAILED");
    }

    #[test]
    fn test_error_message_omitted_when_clear() {
        let response = TransferResponse {
            transfer_id: Some("t-1".to_string()),
            status: "COMPLETED".to_string(),
            error_message: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("errorMessage"));
    }

    #[test]
    fn test_error_to_response_mapping() {
        let (status, body) = error_to_response(&CoordinatorError::InvalidAmount);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body.error_message.as_deref(),
            Some("Transfer amount must be positive")
        );
        assert!(body.transfer_id.is_none());

        let (status, _) = error_to_response(&CoordinatorError::IdempotencyConflict);
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = error_to_response(&CoordinatorError::Database("pool gone".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error_message.as_deref(), Some("Internal server error"));
    }

    #[test]
    fn test_batch_request_json_shape() {
        let request: BatchTransferRequest = serde_json::from_str(
            r#"{"transfers":[
                {"idempotencyKey":"b1","fromAccountId":1,"toAccountId":2,"amount":"10"},
                {"idempotencyKey":"b2","fromAccountId":2,"toAccountId":1,"amount":"5"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(request.transfers.len(), 2);
        assert_eq!(request.transfers[0].idempotency_key, "b1");
        assert_eq!(request.transfers[1].from_account_id, 2);
    }
}
