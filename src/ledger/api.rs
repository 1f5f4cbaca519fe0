//! Ledger HTTP Facade
//!
//! One-to-one request/response surface over the engine. The only behavior
//! added here is error categorization: deterministic rejections map to 400
//! with the reason, transient failures map to 500. A replayed transfer is
//! indistinguishable from a first application in the response.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use super::engine::LedgerEngine;
use super::error::LedgerError;
use super::models::Account;
use crate::config::LedgerServerConfig;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub initial_balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransferRequest {
    pub transfer_id: String,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LedgerTransferResponse {
    pub success: bool,
    pub message: String,
}

pub fn router(engine: Arc<LedgerEngine>) -> Router {
    Router::new()
        .route("/accounts", post(create_account))
        .route("/accounts/{id}", get(get_account))
        .route("/ledger/transfer", post(apply_transfer))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

/// Bind and serve the ledger facade
pub async fn run_server(config: &LedgerServerConfig, engine: Arc<LedgerEngine>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Ledger facade listening on http://{}", addr);

    axum::serve(listener, router(engine)).await?;
    Ok(())
}

async fn create_account(
    State(engine): State<Arc<LedgerEngine>>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<Json<Account>, (StatusCode, Json<LedgerTransferResponse>)> {
    match engine.create_account(request.initial_balance).await {
        Ok(account) => Ok(Json(account)),
        Err(e) => Err(error_response(&e)),
    }
}

async fn get_account(
    State(engine): State<Arc<LedgerEngine>>,
    Path(id): Path<i64>,
) -> Result<Json<Account>, (StatusCode, Json<LedgerTransferResponse>)> {
    match engine.get_account(id).await {
        Ok(Some(account)) => Ok(Json(account)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(LedgerTransferResponse {
                success: false,
                message: format!("Account {} not found", id),
            }),
        )),
        Err(e) => Err(error_response(&e)),
    }
}

async fn apply_transfer(
    State(engine): State<Arc<LedgerEngine>>,
    Json(request): Json<LedgerTransferRequest>,
) -> Result<Json<LedgerTransferResponse>, (StatusCode, Json<LedgerTransferResponse>)> {
    match engine
        .apply_transfer(
            &request.transfer_id,
            request.from_account_id,
            request.to_account_id,
            request.amount,
        )
        .await
    {
        // First application and replay share one response body, by design
        Ok(_) => Ok(Json(LedgerTransferResponse {
            success: true,
            message: "Transfer completed successfully".to_string(),
        })),
        Err(e) => {
            warn!(transfer_id = %request.transfer_id, error = %e, "Transfer rejected");
            Err(error_response(&e))
        }
    }
}

async fn health() -> &'static str {
    "Ledger Service is healthy"
}

fn error_response(e: &LedgerError) -> (StatusCode, Json<LedgerTransferResponse>) {
    let status = match e.http_status() {
        400 => StatusCode::BAD_REQUEST,
        404 => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = if e.is_transient() {
        // Do not leak storage internals to callers
        "Internal server error".to_string()
    } else {
        e.to_string()
    };

    (status, Json(LedgerTransferResponse { success: false, message }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_mapping() {
        let (status, body) = error_response(&LedgerError::InvalidAmount);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
        assert_eq!(body.message, "Amount must be positive");

        let (status, body) = error_response(&LedgerError::InsufficientFunds(3));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.message.contains("Insufficient funds"));

        let (status, body) = error_response(&LedgerError::Transient("pool drained".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Internal server error");
    }

    #[test]
    fn test_request_json_shape() {
        let request: LedgerTransferRequest = serde_json::from_str(
            r#"{"transferId":"t-1","fromAccountId":1,"toAccountId":2,"amount":"10.50"}"#,
        )
        .unwrap();
        assert_eq!(request.transfer_id, "t-1");
        assert_eq!(request.from_account_id, 1);
        assert_eq!(request.to_account_id, 2);
        assert_eq!(request.amount, "10.50".parse::<Decimal>().unwrap());
    }
}
